//! Core data model: rule sources, scan context, and per-file outcomes.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One origin of rule text.
///
/// The namespace of every rule defined by a source is the source's location
/// string, exactly as supplied. Two sources with the same location string
/// therefore share a namespace, and the compiler collapses them into a single
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleSource {
    path: PathBuf,
}

impl RuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Namespace identity of this source (its location string).
    pub fn namespace(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl From<&str> for RuleSource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for RuleSource {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for RuleSource {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for RuleSource {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

/// A rule source paired with the namespace its rules are compiled into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedSource {
    pub namespace: String,
    pub path: PathBuf,
}

/// Named scan-time variables injected into rule evaluation.
///
/// Built by [`ContextBuilder`](crate::ContextBuilder) for every scanned file,
/// or assembled from key/value pairs to serve as a base mapping. Once built it
/// is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalContext {
    vars: BTreeMap<String, String>,
}

impl ExternalContext {
    /// Variable holding the full path of the scanned file.
    pub const FILEPATH: &'static str = "filepath";
    /// Variable holding the final path segment of the scanned file.
    pub const FILENAME: &'static str = "filename";
    /// Variable holding the extension of the scanned file, dot included.
    pub const EXTENSION: &'static str = "extension";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.vars.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub(crate) fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    pub(crate) fn to_map(&self) -> BTreeMap<String, String> {
        self.vars.clone()
    }
}

impl<K, V> FromIterator<(K, V)> for ExternalContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExternalContext {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

/// A non-fatal message produced while compiling rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A single matched string inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMatch {
    /// Byte offset of the match within the file.
    pub offset: u64,
    /// String identifier as declared in the rule (e.g. `$mz`).
    pub identifier: String,
    /// Raw matched bytes.
    pub data: Vec<u8>,
}

/// A rule that matched a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub rule: String,
    pub namespace: String,
    pub tags: Vec<String>,
    pub strings: Vec<StringMatch>,
}

/// Result of evaluating the compiled rules against one file.
///
/// Every scanned file produces at least one outcome: one `Hit` per matching
/// rule, or a single `NoHit` when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Hit(Hit),
    NoHit,
}

impl Outcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit(_))
    }

    pub fn hit(&self) -> Option<&Hit> {
        match self {
            Outcome::Hit(hit) => Some(hit),
            Outcome::NoHit => None,
        }
    }

    pub fn rule(&self) -> Option<&str> {
        self.hit().map(|h| h.rule.as_str())
    }

    pub fn namespace(&self) -> Option<&str> {
        self.hit().map(|h| h.namespace.as_str())
    }
}

/// One element of the scan result stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub outcome: Outcome,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_is_location_string() {
        let source = RuleSource::new("/rules/alice.toml");
        assert_eq!(source.namespace(), "/rules/alice.toml");

        let relative = RuleSource::from("rules/../bob.toml");
        assert_eq!(relative.namespace(), "rules/../bob.toml");
    }

    #[test]
    fn test_external_context_from_pairs() {
        let ctx: ExternalContext = [("owner", "soc"), ("env", "prod")].into_iter().collect();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("owner"), Some("soc"));
        assert!(ctx.contains("env"));
        assert_eq!(ctx.get("missing"), None);
        // Ordered by name
        assert_eq!(ctx.names().collect::<Vec<_>>(), vec!["env", "owner"]);
    }

    #[test]
    fn test_outcome_accessors() {
        let hit = Outcome::Hit(Hit {
            rule: "pe_header".to_string(),
            namespace: "a.toml".to_string(),
            tags: vec![],
            strings: vec![],
        });
        assert!(hit.is_hit());
        assert_eq!(hit.rule(), Some("pe_header"));
        assert_eq!(hit.namespace(), Some("a.toml"));

        assert!(!Outcome::NoHit.is_hit());
        assert_eq!(Outcome::NoHit.rule(), None);
        assert_eq!(Outcome::NoHit.namespace(), None);
    }
}
