//! Sigscan Rule Engine - TOML signature rules
//!
//! This crate provides the matching engine behind sigscan. Rules are
//! declared in TOML, one file per rule source, and compiled to byte-level
//! regex matchers once.
//!
//! # Architecture
//!
//! - **TOML Rules**: Declarative strings (text, hex, regex) plus conditions
//! - **Compiled Matching**: Every string compiles to one `regex::bytes::Regex`
//! - **Namespaces**: Each rule file is its own namespace, so rule names only
//!   need to be unique per file
//!
//! # Example
//!
//! ```toml
//! # rules/pe.toml
//! [[rules]]
//! name = "pe_header"
//! tags = ["pe"]
//!
//! [[rules.strings]]
//! id = "mz"
//! hex = "4D 5A ?? 00"
//!
//! [[rules.strings]]
//! id = "stub"
//! text = "This program cannot be run in DOS mode"
//!
//! [rules.condition]
//! strings = "all"
//!
//! [rules.condition.externals]
//! extension = ".exe"
//! ```

pub mod constants;
pub mod engine;
pub mod loader;
pub mod matcher;
pub mod toml_rule;

// Re-export core types
pub use constants::*;
pub use engine::{CompiledRuleset, TomlEngine};
pub use loader::RuleLoader;
pub use matcher::CompiledString;
pub use toml_rule::{
    PatternKind, Quantifier, RuleCondition, StringDefinition, TomlRule, TomlRuleFile,
};

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Error types for rule engine
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to load rules from {path}: {source}")]
    LoadError {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}
