//! Scan orchestration: resolve a ruleset, walk targets, yield outcomes.
//!
//! [`ScanOrchestrator::scan`] compiles (or reuses) a ruleset eagerly and
//! returns a [`ScanResults`] iterator that touches the filesystem only as the
//! consumer pulls from it. Every scanned file yields at least one record.

use crate::compiler::NamespaceCompiler;
use crate::context::ContextBuilder;
use crate::engine::{CompiledRules, MatchEngine};
use crate::error::{Error, Result};
use crate::types::{Diagnostic, ExternalContext, Outcome, RuleSource, ScanRecord};
use std::collections::VecDeque;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Options for a single [`ScanOrchestrator::scan`] call.
pub struct ScanOptions<'r, R> {
    /// Rule sources to compile when no precompiled ruleset is given.
    pub sources: Vec<RuleSource>,
    /// A ruleset compiled earlier; when set, `sources` is ignored.
    pub precompiled: Option<&'r R>,
    /// Base external variables for compilation and for every file.
    pub externals: ExternalContext,
    /// Abort before scanning if compilation produced any warning.
    pub escalate_warnings: bool,
}

impl<R> Default for ScanOptions<'_, R> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            precompiled: None,
            externals: ExternalContext::new(),
            escalate_warnings: false,
        }
    }
}

/// Drives a [`MatchEngine`] over a list of targets.
#[derive(Debug, Clone, Default)]
pub struct ScanOrchestrator<E> {
    engine: E,
}

impl<E: MatchEngine> ScanOrchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Compiles rule sources without scanning, for reuse across scans.
    pub fn compile(
        &self,
        sources: &[RuleSource],
        externals: &ExternalContext,
    ) -> Result<crate::Compilation<E::Rules>> {
        NamespaceCompiler::new(&self.engine).compile(sources, externals)
    }

    /// Scans `targets` and returns the lazily produced result stream.
    ///
    /// Rule resolution happens before this returns: a precompiled ruleset is
    /// used as-is, otherwise `options.sources` are compiled.
    ///
    /// # Errors
    ///
    /// - [`Error::Compile`] if the engine rejects the sources
    /// - [`Error::Warnings`] if warnings were raised and
    ///   `escalate_warnings` is set
    /// - [`Error::Configuration`] if no ruleset could be produced
    pub fn scan<'r, I, P>(
        &self,
        targets: I,
        options: ScanOptions<'r, E::Rules>,
    ) -> Result<ScanResults<'r, E::Rules>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let ScanOptions {
            sources,
            precompiled,
            externals,
            escalate_warnings,
        } = options;

        let (rules, diagnostics) = match precompiled {
            Some(rules) => (RulesHandle::Borrowed(rules), Vec::new()),
            None => {
                let compilation = self.compile(&sources, &externals)?;
                if escalate_warnings && !compilation.diagnostics.is_empty() {
                    return Err(Error::Warnings {
                        warnings: compilation.diagnostics,
                    });
                }
                let rules = compilation.rules.ok_or_else(|| Error::Configuration {
                    reason: format!("no usable ruleset from {} rule sources", sources.len()),
                })?;
                (RulesHandle::Owned(rules), compilation.diagnostics)
            }
        };

        Ok(ScanResults {
            rules,
            diagnostics,
            externals,
            targets: targets.into_iter().map(Into::into).collect(),
            walker: None,
            pending: VecDeque::new(),
            finished: false,
        })
    }
}

/// A ruleset either borrowed from the caller or owned by the scan.
enum RulesHandle<'r, R> {
    Borrowed(&'r R),
    Owned(R),
}

impl<R> Deref for RulesHandle<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        match self {
            RulesHandle::Borrowed(rules) => rules,
            RulesHandle::Owned(rules) => rules,
        }
    }
}

/// Lazy stream of [`ScanRecord`]s.
///
/// Directory targets are walked recursively in filesystem order. A match
/// failure on any file is yielded as an error and ends the stream; records
/// already yielded for earlier files stand.
pub struct ScanResults<'r, R> {
    rules: RulesHandle<'r, R>,
    diagnostics: Vec<Diagnostic>,
    externals: ExternalContext,
    targets: VecDeque<PathBuf>,
    walker: Option<walkdir::IntoIter>,
    pending: VecDeque<ScanRecord>,
    finished: bool,
}

impl<R: CompiledRules> ScanResults<'_, R> {
    /// Warnings from a lenient compilation performed by this scan.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The ruleset this scan matches with.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Next file to scan and its external context.
    fn next_file(&mut self) -> Option<(PathBuf, ExternalContext)> {
        loop {
            if let Some(walker) = self.walker.as_mut() {
                match walker.next() {
                    Some(Ok(entry)) => {
                        if entry.file_type().is_dir()
                            || (entry.path_is_symlink() && entry.path().is_dir())
                        {
                            continue;
                        }
                        let path = entry.into_path();
                        let context = file_context(&path, true, &self.externals);
                        return Some((path, context));
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "skipping unreadable directory entry");
                        continue;
                    }
                    None => {
                        self.walker = None;
                        continue;
                    }
                }
            }

            let target = self.targets.pop_front()?;
            if target.is_dir() {
                debug!(target = %target.display(), "walking directory target");
                self.walker = Some(WalkDir::new(&target).into_iter());
                continue;
            }
            let context = file_context(&target, false, &self.externals);
            return Some((target, context));
        }
    }

    fn scan_file(&self, path: PathBuf, context: &ExternalContext) -> Result<Vec<ScanRecord>> {
        let hits = self.rules.match_file(&path, context).map_err(|source| {
            error!(path = %path.display(), error = %source, "error matching file");
            Error::Match {
                path: path.clone(),
                source,
            }
        })?;

        if hits.is_empty() {
            return Ok(vec![ScanRecord {
                outcome: Outcome::NoHit,
                path,
            }]);
        }
        Ok(hits
            .into_iter()
            .map(|hit| ScanRecord {
                outcome: Outcome::Hit(hit),
                path: path.clone(),
            })
            .collect())
    }
}

impl<R: CompiledRules> Iterator for ScanResults<'_, R> {
    type Item = Result<ScanRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }
            let Some((path, context)) = self.next_file() else {
                self.finished = true;
                return None;
            };
            match self.scan_file(path, &context) {
                Ok(records) => self.pending.extend(records),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<R: CompiledRules> std::iter::FusedIterator for ScanResults<'_, R> {}

/// Context for one file; walked files also pass their name explicitly.
fn file_context(path: &Path, walked: bool, base: &ExternalContext) -> ExternalContext {
    let path_str = path.to_string_lossy();
    let name = path.file_name().map(|n| n.to_string_lossy());
    let mut builder = ContextBuilder::new().path(&path_str).base(base);
    if walked {
        if let Some(name) = name.as_deref() {
            builder = builder.name(name);
        }
    }
    builder.build()
}
