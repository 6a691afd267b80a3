//! Rule file loading
//!
//! Reads and parses one TOML rule file, refusing oversized files before
//! reading them.

use crate::constants::MAX_TOML_FILE_SIZE;
use crate::{Result, RuleError, TomlRuleFile};
use std::fs;
use std::path::Path;

/// Loads TOML rule files from disk
#[derive(Debug, Clone)]
pub struct RuleLoader {
    max_file_size: u64,
}

impl Default for RuleLoader {
    fn default() -> Self {
        Self {
            max_file_size: MAX_TOML_FILE_SIZE,
        }
    }
}

impl RuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum accepted rule file size
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Load rules from a single TOML file
    pub fn load_from_file(&self, path: &Path) -> Result<TomlRuleFile> {
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() {
            return Err(RuleError::LoadError {
                path: path.display().to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Rule source is a directory",
                )),
            });
        }

        // Security: Check file size before reading
        if metadata.len() > self.max_file_size {
            return Err(RuleError::LoadError {
                path: path.display().to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "File exceeds maximum size of {}MB",
                        self.max_file_size / 1_048_576
                    ),
                )),
            });
        }

        let contents = fs::read_to_string(path)?;
        self.load_from_str(&contents)
    }

    /// Parse rules from TOML text
    pub fn load_from_str(&self, contents: &str) -> Result<TomlRuleFile> {
        Ok(toml::from_str(contents)?)
    }
}
