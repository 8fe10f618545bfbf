use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

pub const DATA_DIR_VAR: &str = "GEOCOMP_DATA_DIR";
pub const DATA_URL_VAR: &str = "GEOCOMP_DATA_URL";
pub const DEFAULT_ARCHIVE_URL: &str = "https://github.com/geocompr/py/releases/download/0.1/data.zip";

/// Where the sample data lives and where to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub archive_url: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            archive_url: DEFAULT_ARCHIVE_URL.into(),
        }
    }
}

impl DataConfig {
    /// Defaults overridden by `GEOCOMP_DATA_DIR` and `GEOCOMP_DATA_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            archive_url: lookup(DATA_URL_VAR).unwrap_or(defaults.archive_url),
        }
    }

    /// Directory the archive is extracted into, so that it yields `data_dir`.
    pub fn extract_dir(&self) -> PathBuf {
        match self.data_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
