//! Sigscan CLI library components.
//!
//! This crate provides the command-line interface for scanning files with
//! rules from many sources. The main binary is in `main.rs`.

pub mod cli;
pub mod formatters;
pub mod logging;

// Re-export core types for convenience
pub use sigscan_core::{Outcome, ScanRecord};
