pub mod map;
pub mod convert;

pub use convert::{ConvertConfig, MatchMetric};
pub use map::ConfigMap;
