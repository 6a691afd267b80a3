//! Error types for sigscan core.

use crate::engine::EngineError;
use crate::types::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sigscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling rules or scanning targets.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable compiled ruleset. Raised before any target is touched.
    #[error("Rules not compiled: {reason}")]
    Configuration {
        /// Why no ruleset is available.
        reason: String,
    },

    /// The engine rejected the rule sources for a reason other than warnings.
    #[error("Error compiling {} rule sources ({}): {source}", .sources.len(), .sources.join(" "))]
    Compile {
        /// Namespaces of every source involved in the failed compilation.
        sources: Vec<String>,
        /// The underlying engine error.
        #[source]
        source: EngineError,
    },

    /// Compilation produced warnings and the caller asked for them to be fatal.
    #[error("{}", join_diagnostics(.warnings))]
    Warnings {
        /// Every warning collected during compilation.
        warnings: Vec<Diagnostic>,
    },

    /// The engine failed to match a specific file.
    #[error("Error matching file {path}: {source}")]
    Match {
        /// File that could not be matched.
        path: PathBuf,
        /// The underlying engine error.
        #[source]
        source: EngineError,
    },
}

fn join_diagnostics(warnings: &[Diagnostic]) -> String {
    warnings
        .iter()
        .map(Diagnostic::message)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_names_sources() {
        let err = Error::Compile {
            sources: vec!["a.toml".to_string(), "b.toml".to_string()],
            source: EngineError::Other("boom".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Error compiling 2 rule sources (a.toml b.toml): boom"
        );
    }

    #[test]
    fn test_warnings_error_joins_lines() {
        let err = Error::Warnings {
            warnings: vec![Diagnostic::new("first"), Diagnostic::new("second")],
        };
        assert_eq!(err.to_string(), "first\nsecond");
    }
}
