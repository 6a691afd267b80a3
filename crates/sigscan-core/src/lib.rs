//! Sigscan Core - namespace-isolated rule aggregation and scan orchestration.
//!
//! This crate sits above an existing pattern-matching engine. It defines:
//!
//! - [`MatchEngine`] / [`CompiledRules`]: the capability an engine must offer
//! - [`ContextBuilder`]: per-file external variables (`filepath`, `filename`,
//!   `extension`) layered over caller defaults
//! - [`NamespaceCompiler`]: merges many rule sources into one ruleset, one
//!   namespace per source, with a strict-then-lenient warning protocol
//! - [`ScanOrchestrator`]: walks targets and yields one or more
//!   [`ScanRecord`]s per scanned file
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   sigscan-cli   │  (arguments, config directory, rendering)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  sigscan-core   │  (This crate - compile + scan orchestration)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌───────────────────────┐
//! │  sigscan-rule-engine  │  (TOML rules, regex-backed matching)
//! └───────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sigscan_core::{MatchEngine, ScanOptions, ScanOrchestrator};
//!
//! fn scan_all<E: MatchEngine>(engine: E) -> sigscan_core::Result<()> {
//!     let orchestrator = ScanOrchestrator::new(engine);
//!     let options = ScanOptions {
//!         sources: vec!["rules/pe.toml".into(), "rules/scripts.toml".into()],
//!         ..Default::default()
//!     };
//!     for record in orchestrator.scan(["/srv/uploads"], options)? {
//!         let record = record?;
//!         println!("{:?} {}", record.outcome.rule(), record.path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod context;
pub mod engine;
pub mod error;
pub mod scan;
pub mod types;

pub use compiler::{namespace_sources, Compilation, NamespaceCompiler};
pub use context::{build_context, ContextBuilder};
pub use engine::{CompileMode, CompiledRules, EngineError, MatchEngine};
pub use error::{Error, Result};
pub use scan::{ScanOptions, ScanOrchestrator, ScanResults};
pub use types::{
    Diagnostic, ExternalContext, Hit, NamespacedSource, Outcome, RuleSource, ScanRecord,
    StringMatch,
};
