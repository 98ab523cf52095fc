use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::error::{LensletError, Result};

/// Parsed calibration file: one `key: value` pair per line, `#` starts a
/// comment line. Malformed lines are skipped.
#[derive(Clone, Debug, Default)]
pub struct ConfigMap {
    map: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut map = BTreeMap::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            map.insert(key.to_string(), value.to_string());
        }
        Ok(Self { map })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Fetch and parse a required key.
    pub fn get<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self
            .map
            .get(key)
            .ok_or_else(|| LensletError::InvalidParam(format!("missing calibration key `{key}`")))?;
        raw.parse::<T>().map_err(|_| {
            LensletError::InvalidParam(format!("calibration key `{key}` has invalid value `{raw}`"))
        })
    }

    /// Fetch and parse an optional key, falling back to `default`.
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.map.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|_| {
                LensletError::InvalidParam(format!(
                    "calibration key `{key}` has invalid value `{raw}`"
                ))
            }),
        }
    }
}
