//! Namespace-isolated compilation of many rule sources into one ruleset.

use crate::context::ContextBuilder;
use crate::engine::{CompileMode, EngineError, MatchEngine};
use crate::error::{Error, Result};
use crate::types::{Diagnostic, ExternalContext, NamespacedSource, RuleSource};
use tracing::{debug, error};

/// Outcome of a compilation call: diagnostics plus the ruleset, if any.
#[derive(Debug)]
pub struct Compilation<R> {
    /// Warnings collected during compilation. Never fatal at this layer.
    pub diagnostics: Vec<Diagnostic>,
    /// The compiled ruleset; `None` when there was nothing to compile.
    pub rules: Option<R>,
}

/// Compiles a collection of rule sources, one namespace per source.
pub struct NamespaceCompiler<'e, E: MatchEngine> {
    engine: &'e E,
}

impl<'e, E: MatchEngine> NamespaceCompiler<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Compiles `sources` with `externals` as the base variables.
    ///
    /// The namespace of each source is its location string. Sources whose
    /// location strings are identical collapse into a single entry; this is a
    /// known sharp edge (overlapping directory and explicit-file listings lose
    /// nothing, but a caller cannot have two namespaces with the same name).
    ///
    /// Compilation is attempted strictly first. If the engine fails only
    /// because of warnings, the sources are recompiled leniently and the
    /// warnings are returned as diagnostics. Any other failure is fatal.
    pub fn compile(
        &self,
        sources: &[RuleSource],
        externals: &ExternalContext,
    ) -> Result<Compilation<E::Rules>> {
        if sources.is_empty() {
            return Ok(Compilation {
                diagnostics: Vec::new(),
                rules: None,
            });
        }

        let namespaced = namespace_sources(sources);
        let externals = ContextBuilder::new().base(externals).build();
        debug!(
            sources = namespaced.len(),
            externals = externals.len(),
            "compiling rule sources"
        );

        match self
            .engine
            .compile(&namespaced, &externals, CompileMode::Strict)
        {
            Ok(rules) => Ok(Compilation {
                diagnostics: Vec::new(),
                rules: Some(rules),
            }),
            Err(err) if err.is_warning() => {
                let diagnostics = match err {
                    EngineError::Warnings(warnings) => {
                        warnings.into_iter().map(Diagnostic::new).collect()
                    }
                    other => vec![Diagnostic::new(other.to_string())],
                };
                debug!(
                    warnings = diagnostics.len(),
                    "strict compilation raised warnings, recompiling leniently"
                );
                let rules = self
                    .engine
                    .compile(&namespaced, &externals, CompileMode::Lenient)
                    .map_err(|source| compile_failure(&namespaced, source))?;
                Ok(Compilation {
                    diagnostics,
                    rules: Some(rules),
                })
            }
            Err(source) => Err(compile_failure(&namespaced, source)),
        }
    }
}

/// Assigns each source its own namespace, keeping the first occurrence of
/// any repeated location string.
pub fn namespace_sources(sources: &[RuleSource]) -> Vec<NamespacedSource> {
    let mut namespaced: Vec<NamespacedSource> = Vec::with_capacity(sources.len());
    for source in sources {
        let namespace = source.namespace();
        if namespaced.iter().any(|n| n.namespace == namespace) {
            continue;
        }
        namespaced.push(NamespacedSource {
            namespace,
            path: source.path().to_path_buf(),
        });
    }
    namespaced
}

fn compile_failure(namespaced: &[NamespacedSource], source: EngineError) -> Error {
    let sources: Vec<String> = namespaced.iter().map(|n| n.namespace.clone()).collect();
    error!(
        count = sources.len(),
        sources = %sources.join(" "),
        error = %source,
        "error compiling rule sources"
    );
    Error::Compile { sources, source }
}
