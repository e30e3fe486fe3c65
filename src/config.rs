use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::common::{
    DEFAULT_BATCH_SIZE, DEFAULT_WRITER_HEAP_SIZE, MAX_FUZZY_DISTANCE, MatchMode,
};

/// Default location of the persisted index
pub const DEFAULT_INDEX_PATH: &str = "shakesearch.index";

/// Default corpus file, one record per line
pub const DEFAULT_CORPUS_PATH: &str = "completeworks.txt";

/// Default HTTP port when neither `--port` nor `PORT` is given
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted index
    pub index_path: PathBuf,

    /// Line-delimited corpus read once at startup
    pub corpus_path: PathBuf,

    /// Documents per committed batch during load
    pub batch_size: usize,

    /// Maximum edit distance for fuzzy matching (0 disables fuzzy mode)
    pub fuzzy_distance: u8,

    /// Hits per response when the request gives no `size` (None = all hits)
    pub page_size: Option<usize>,

    pub port: u16,

    /// Directory served at `/`
    pub static_dir: PathBuf,

    /// Memory budget of the index writer in bytes
    pub writer_heap_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            fuzzy_distance: 1,
            page_size: None,
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
            writer_heap_size: DEFAULT_WRITER_HEAP_SIZE,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.fuzzy_distance > MAX_FUZZY_DISTANCE {
            bail!(
                "fuzzy_distance {} is not supported (maximum is {})",
                self.fuzzy_distance,
                MAX_FUZZY_DISTANCE
            );
        }
        if self.page_size == Some(0) {
            bail!("page_size must be at least 1 when set");
        }
        Ok(())
    }

    /// Match mode used when a request does not choose one
    pub fn default_mode(&self) -> MatchMode {
        if self.fuzzy_distance > 0 {
            MatchMode::Fuzzy
        } else {
            MatchMode::Exact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.fuzzy_distance, 1);
        assert_eq!(config.port, 3001);
        assert!(config.page_size.is_none());
        assert_eq!(config.default_mode(), MatchMode::Fuzzy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            fuzzy_distance: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exact_mode_when_fuzzy_disabled() {
        let config = Config {
            fuzzy_distance: 0,
            ..Default::default()
        };
        assert_eq!(config.default_mode(), MatchMode::Exact);
    }

    #[test]
    fn test_from_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"batch_size": 10, "page_size": 20}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.page_size, Some(20));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.index_path, PathBuf::from(DEFAULT_INDEX_PATH));
    }
}
