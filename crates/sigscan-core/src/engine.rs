//! Matching-engine capability.
//!
//! Sigscan does not own a rule language or a matching algorithm. Any engine
//! that can compile a set of namespaced rule sources and match a compiled
//! ruleset against a file plugs in through these two traits.

use crate::types::{ExternalContext, Hit, NamespacedSource};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How the engine should treat compiler warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// Any warning fails compilation with [`EngineError::Warnings`].
    Strict,
    /// Warnings are tolerated.
    Lenient,
}

/// Errors reported by a matching engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Compilation failed only because warnings were raised in strict mode.
    #[error("{}", .0.join("\n"))]
    Warnings(Vec<String>),

    /// A rule source is malformed.
    #[error("{}{message}", namespace_prefix(.namespace))]
    Syntax {
        /// Namespace of the offending source, when known.
        namespace: Option<String>,
        message: String,
    },

    /// A rule source or scan target could not be read.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other engine failure.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Returns true when the failure is warning-classified.
    pub fn is_warning(&self) -> bool {
        matches!(self, EngineError::Warnings(_))
    }
}

fn namespace_prefix(namespace: &Option<String>) -> String {
    match namespace {
        Some(ns) => format!("{}: ", ns),
        None => String::new(),
    }
}

/// A rule compiler.
///
/// # Examples
///
/// ```no_run
/// use sigscan_core::{CompileMode, ExternalContext, MatchEngine, NamespacedSource};
///
/// fn compile_one<E: MatchEngine>(engine: &E, path: &str) -> Option<E::Rules> {
///     let sources = vec![NamespacedSource {
///         namespace: path.to_string(),
///         path: path.into(),
///     }];
///     engine
///         .compile(&sources, &ExternalContext::new(), CompileMode::Lenient)
///         .ok()
/// }
/// ```
pub trait MatchEngine {
    /// The compiled, read-only ruleset this engine produces.
    type Rules: CompiledRules;

    /// Compiles every source into its own namespace.
    ///
    /// `externals` declares the external variables rules may reference; the
    /// values are compile-time defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Warnings`] when `mode` is [`CompileMode::Strict`]
    /// and the sources raise warnings but no errors. Any other error is fatal.
    fn compile(
        &self,
        sources: &[NamespacedSource],
        externals: &ExternalContext,
        mode: CompileMode,
    ) -> Result<Self::Rules, EngineError>;
}

/// A compiled ruleset ready for repeated matching.
///
/// Implementations must be safe to share across threads; a ruleset is never
/// mutated after compilation.
pub trait CompiledRules: Send + Sync {
    /// Namespaces present in this ruleset.
    fn namespaces(&self) -> Vec<String>;

    /// Matches the file at `path`, with `externals` bound for this file.
    ///
    /// Returns one [`Hit`] per matching rule; an empty list means no rule
    /// matched.
    fn match_file(&self, path: &Path, externals: &ExternalContext)
        -> Result<Vec<Hit>, EngineError>;
}

impl<R: CompiledRules + ?Sized> CompiledRules for Box<R> {
    fn namespaces(&self) -> Vec<String> {
        (**self).namespaces()
    }

    fn match_file(
        &self,
        path: &Path,
        externals: &ExternalContext,
    ) -> Result<Vec<Hit>, EngineError> {
        (**self).match_file(path, externals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_classification() {
        assert!(EngineError::Warnings(vec!["slow".to_string()]).is_warning());
        assert!(!EngineError::Other("bad".to_string()).is_warning());
        assert!(!EngineError::Syntax {
            namespace: None,
            message: "bad".to_string()
        }
        .is_warning());
    }

    #[test]
    fn test_syntax_display_includes_namespace() {
        let err = EngineError::Syntax {
            namespace: Some("rules/a.toml".to_string()),
            message: "duplicate rule `x`".to_string(),
        };
        assert_eq!(err.to_string(), "rules/a.toml: duplicate rule `x`");
    }
}
