use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure, stored as `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SigscanConfig {
    /// Schema version for migrations
    pub version: String,

    /// Scan defaults
    #[serde(default)]
    pub settings: ScanSettings,

    /// Base external variables applied to every scan
    #[serde(default)]
    pub externals: BTreeMap<String, String>,
}

impl Default for SigscanConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            settings: ScanSettings::default(),
            externals: BTreeMap::new(),
        }
    }
}

/// Defaults for scan flags; command-line flags can only turn these on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanSettings {
    /// Abort when rule compilation raises warnings
    #[serde(default)]
    pub fail_on_warnings: bool,

    /// Suppress records for files without hits
    #[serde(default)]
    pub only_matches: bool,

    /// Print matched strings after each hit
    #[serde(default)]
    pub print_strings: bool,
}
