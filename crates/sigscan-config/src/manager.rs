use crate::security::set_config_permissions;
use crate::types::SigscanConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

const CONFIG_FILE: &str = "config.toml";
const RULESETS_DIR: &str = "rulesets";
const BLACKLISTS_DIR: &str = "blacklists";

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid filter pattern: {0}")]
    Filter(#[from] globset::Error),

    #[error("Configuration directory not found: {0}")]
    ConfigDirNotFound(PathBuf),

    #[error("Configuration already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Manager for the sigscan configuration directory
///
/// Layout:
///
/// ```text
/// ~/.sigscan/
/// ├── config.toml
/// ├── rulesets/     list files, one rule source per line
/// └── blacklists/
/// ```
#[derive(Debug)]
pub struct ConfigManager {
    dir: PathBuf,
    config: SigscanConfig,
}

impl ConfigManager {
    /// Get the default configuration directory (~/.sigscan)
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".sigscan"))
    }

    /// Load configuration from a directory
    ///
    /// A missing `config.toml` yields the default configuration.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        if !dir.is_dir() {
            return Err(ConfigError::ConfigDirNotFound(dir.to_path_buf()));
        }

        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.is_file() {
            let contents = fs::read_to_string(&config_path)?;
            toml::from_str(&contents)?
        } else {
            debug!(path = %config_path.display(), "no config file, using defaults");
            SigscanConfig::default()
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
        })
    }

    /// Initialize a blank configuration directory
    pub fn init_at(dir: &Path) -> Result<Self, ConfigError> {
        let rulesets = dir.join(RULESETS_DIR);
        let blacklists = dir.join(BLACKLISTS_DIR);
        if rulesets.exists() || blacklists.exists() || dir.join(CONFIG_FILE).exists() {
            return Err(ConfigError::AlreadyInitialized(dir.to_path_buf()));
        }

        fs::create_dir_all(&rulesets)?;
        fs::create_dir_all(&blacklists)?;

        let manager = Self {
            dir: dir.to_path_buf(),
            config: SigscanConfig::default(),
        };
        manager.save()?;
        debug!(dir = %dir.display(), "initialized configuration directory");

        Ok(manager)
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and atomic rename to prevent corruption
    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(&self.config)?;
        let config_path = self.config_path();

        let temp_path = config_path.with_extension("toml.tmp");
        fs::write(&temp_path, toml_str)?;
        set_config_permissions(&temp_path)?;
        fs::rename(&temp_path, &config_path)?;

        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn rulesets_dir(&self) -> PathBuf {
        self.dir.join(RULESETS_DIR)
    }

    pub fn blacklists_dir(&self) -> PathBuf {
        self.dir.join(BLACKLISTS_DIR)
    }

    /// Get reference to config
    pub fn config(&self) -> &SigscanConfig {
        &self.config
    }

    /// Get mutable reference to config (caller must call save())
    pub fn config_mut(&mut self) -> &mut SigscanConfig {
        &mut self.config
    }

    /// Every list file under `rulesets/`, in file-name order
    ///
    /// Fails with [`ConfigError::ConfigDirNotFound`] when `rulesets/` is
    /// missing.
    pub fn ruleset_lists(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let rulesets = self.rulesets_dir();
        if !rulesets.is_dir() {
            return Err(ConfigError::ConfigDirNotFound(rulesets));
        }

        let mut lists = Vec::new();
        for entry in WalkDir::new(&rulesets).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                lists.push(entry.into_path());
            }
        }
        Ok(lists)
    }
}
