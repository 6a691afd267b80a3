//! TOML rule definitions and types
//!
//! This module defines the structure of rules as they appear in rule files.
//! One file is one rule source; every rule in it lands in that source's
//! namespace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete TOML rule file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlRuleFile {
    /// List of rules
    #[serde(default)]
    pub rules: Vec<TomlRule>,
}

/// A single TOML rule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlRule {
    /// Rule name, unique within its file
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Free-form tags reported with every hit
    #[serde(default)]
    pub tags: Vec<String>,

    /// Strings searched for in the scanned file
    #[serde(default)]
    pub strings: Vec<StringDefinition>,

    /// When the rule counts as matched
    #[serde(default)]
    pub condition: RuleCondition,
}

/// A string searched for in scanned files
///
/// Exactly one of `text`, `hex` or `regex` must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StringDefinition {
    /// Identifier, reported with each match (a leading `$` is added if missing)
    pub id: String,

    /// Literal text
    #[serde(default)]
    pub text: Option<String>,

    /// Hex bytes, e.g. `"4D 5A ?? 00"` (`??` matches any byte)
    #[serde(default)]
    pub hex: Option<String>,

    /// Regular expression over raw bytes
    #[serde(default)]
    pub regex: Option<String>,

    /// Case-insensitive matching (text and regex only)
    #[serde(default)]
    pub nocase: bool,
}

/// Which kind of pattern a string definition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind<'a> {
    Text(&'a str),
    Hex(&'a str),
    Regex(&'a str),
}

impl StringDefinition {
    /// Identifier with its `$` prefix
    pub fn identifier(&self) -> String {
        if self.id.starts_with('$') {
            self.id.clone()
        } else {
            format!("${}", self.id)
        }
    }

    /// The single pattern this definition holds, if exactly one is set
    pub fn pattern(&self) -> Option<PatternKind<'_>> {
        match (&self.text, &self.hex, &self.regex) {
            (Some(text), None, None) => Some(PatternKind::Text(text)),
            (None, Some(hex), None) => Some(PatternKind::Hex(hex)),
            (None, None, Some(regex)) => Some(PatternKind::Regex(regex)),
            _ => None,
        }
    }
}

/// How many of a rule's strings must match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    /// At least one string (vacuously true for a rule without strings)
    #[default]
    Any,
    /// Every string
    All,
    /// No string at all
    None,
}

/// Rule matching conditions
///
/// All conditions must hold (AND logic).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleCondition {
    /// String quantifier
    #[serde(default)]
    pub strings: Quantifier,

    /// Minimum number of distinct strings that must match
    #[serde(default)]
    pub min_matches: Option<usize>,

    /// External variable must equal this value
    #[serde(default)]
    pub externals: BTreeMap<String, String>,

    /// External variable must match this regex pattern
    #[serde(default)]
    pub external_patterns: BTreeMap<String, String>,
}

impl RuleCondition {
    /// Names of every external variable this condition reads
    pub fn external_names(&self) -> impl Iterator<Item = &str> {
        self.externals
            .keys()
            .chain(self.external_patterns.keys())
            .map(String::as_str)
    }

    pub fn has_external_conditions(&self) -> bool {
        !self.externals.is_empty() || !self.external_patterns.is_empty()
    }
}
