pub mod yuv;
pub mod reader;
pub mod writer;
pub mod image_io;

pub use reader::YuvReader;
pub use writer::YuvWriter;
pub use yuv::{Plane, YuvPlanarExtent, YuvPlanarFrame};
