//! Sigscan configuration: the `~/.sigscan` directory and rule source
//! collection.

pub mod manager;
pub mod security;
pub mod sources;
pub mod types;

pub use manager::{ConfigError, ConfigManager};
pub use security::set_config_permissions;
pub use sources::SourceSet;
pub use types::{ScanSettings, SigscanConfig};
