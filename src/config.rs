//! Tunables for diffing and patching.
//!
//! Defaults reproduce the reference heuristic exactly, so patches produced
//! with [`DiffConfig::default`] are byte-compatible with other bsdiff-format
//! encoders that use the same scan.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default slack between a fresh match and the running alignment score
pub const DEFAULT_MATCH_SLACK: u64 = 8;

/// Configuration for the delta encoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// A new match ends the current block once it beats the alignment
    /// score by more than this many bytes (default: 8)
    pub match_slack: u64,
    /// Largest old or new buffer accepted (bytes)
    pub max_input_size: u64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            match_slack: DEFAULT_MATCH_SLACK,
            max_input_size: i64::MAX as u64,
        }
    }
}

impl DiffConfig {
    pub(crate) fn check_input(&self, what: &'static str, len: usize) -> Result<()> {
        let size = len as u64;
        if size > self.max_input_size {
            return Err(Error::TooLarge {
                what,
                size,
                limit: self.max_input_size,
            });
        }
        Ok(())
    }
}

/// Configuration for the patch decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Largest output size a patch header may declare (bytes)
    pub max_output_size: u64,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            max_output_size: i64::MAX as u64,
        }
    }
}

impl PatchConfig {
    pub(crate) fn check_output(&self, size: u64) -> Result<()> {
        if size > self.max_output_size {
            return Err(Error::TooLarge {
                what: "Output",
                size,
                limit: self.max_output_size,
            });
        }
        Ok(())
    }
}

/// Combined configuration, as loaded by the command line tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub diff: DiffConfig,
    pub patch: PatchConfig,
}

impl Config {
    /// Load a JSON configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.diff.match_slack, 8);
        assert_eq!(config.patch.max_output_size, i64::MAX as u64);
    }

    #[test]
    fn test_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{ "patch": { "max_output_size": 1024 } }"#).unwrap();
        assert_eq!(config.patch.max_output_size, 1024);
        assert_eq!(config.diff, DiffConfig::default());
    }

    #[test]
    fn test_limits() {
        let diff = DiffConfig {
            max_input_size: 4,
            ..Default::default()
        };
        assert!(diff.check_input("Old", 4).is_ok());
        assert!(matches!(
            diff.check_input("Old", 5),
            Err(Error::TooLarge { size: 5, limit: 4, .. })
        ));

        let patch = PatchConfig { max_output_size: 0 };
        assert!(patch.check_output(0).is_ok());
        assert!(patch.check_output(1).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bsdelta.json");
        std::fs::write(&path, r#"{ "diff": { "match_slack": 4 } }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.diff.match_slack, 4);
    }
}
