//! Rule engine - compiles TOML rule files and matches them against files
//!
//! [`TomlEngine`] implements the sigscan matching-engine capability. Each
//! rule source becomes one namespace of a [`CompiledRuleset`]; rule names
//! only have to be unique inside their own namespace.

use crate::matcher::{compile_regex_safe, CompiledString};
use crate::toml_rule::{Quantifier, TomlRule};
use crate::{Result, RuleError, RuleLoader};
use regex::Regex;
use sigscan_core::{
    CompileMode, CompiledRules, EngineError, ExternalContext, Hit, MatchEngine, NamespacedSource,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Compiles TOML rule files into a [`CompiledRuleset`]
#[derive(Debug, Clone, Default)]
pub struct TomlEngine {
    loader: RuleLoader,
}

impl TomlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(loader: RuleLoader) -> Self {
        Self { loader }
    }

    /// Compile one namespace, appending any warnings
    fn compile_namespace(
        &self,
        source: &NamespacedSource,
        externals: &ExternalContext,
        warnings: &mut Vec<String>,
    ) -> Result<CompiledNamespace> {
        let file = self.loader.load_from_file(&source.path)?;
        if file.rules.is_empty() {
            warnings.push(format!("{}: no rules defined", source.namespace));
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(file.rules.len());
        for rule in &file.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(RuleError::InvalidRule(format!(
                    "Duplicate rule name `{}`",
                    rule.name
                )));
            }
            let (compiled, rule_warnings) = CompiledRule::compile(rule, externals)?;
            warnings.extend(
                rule_warnings
                    .into_iter()
                    .map(|w| format!("{}: rule `{}`: {}", source.namespace, rule.name, w)),
            );
            rules.push(compiled);
        }

        Ok(CompiledNamespace {
            name: source.namespace.clone(),
            rules,
        })
    }
}

impl MatchEngine for TomlEngine {
    type Rules = CompiledRuleset;

    fn compile(
        &self,
        sources: &[NamespacedSource],
        externals: &ExternalContext,
        mode: CompileMode,
    ) -> std::result::Result<CompiledRuleset, EngineError> {
        let mut warnings = Vec::new();
        let mut namespaces = Vec::with_capacity(sources.len());

        for source in sources {
            let namespace = self
                .compile_namespace(source, externals, &mut warnings)
                .map_err(|err| match err {
                    RuleError::IoError(io) => EngineError::Io {
                        path: source.path.clone(),
                        source: io,
                    },
                    other => EngineError::Syntax {
                        namespace: Some(source.namespace.clone()),
                        message: other.to_string(),
                    },
                })?;
            namespaces.push(namespace);
        }

        if !warnings.is_empty() {
            if mode == CompileMode::Strict {
                return Err(EngineError::Warnings(warnings));
            }
            debug!(count = warnings.len(), "compiled with warnings");
        }

        Ok(CompiledRuleset { namespaces })
    }
}

/// Rules from every source, grouped by namespace in source order
#[derive(Debug, Clone)]
pub struct CompiledRuleset {
    namespaces: Vec<CompiledNamespace>,
}

#[derive(Debug, Clone)]
struct CompiledNamespace {
    name: String,
    rules: Vec<CompiledRule>,
}

impl CompiledRuleset {
    /// Total number of rules across all namespaces
    pub fn rule_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.rules.len()).sum()
    }

    /// Match raw bytes, as if they were the contents of a file
    pub fn match_bytes(&self, data: &[u8], externals: &ExternalContext) -> Vec<Hit> {
        let mut hits = Vec::new();
        for namespace in &self.namespaces {
            for rule in &namespace.rules {
                if let Some(hit) = rule.evaluate(&namespace.name, data, externals) {
                    hits.push(hit);
                }
            }
        }
        hits
    }
}

impl CompiledRules for CompiledRuleset {
    fn namespaces(&self) -> Vec<String> {
        self.namespaces.iter().map(|ns| ns.name.clone()).collect()
    }

    fn match_file(
        &self,
        path: &Path,
        externals: &ExternalContext,
    ) -> std::result::Result<Vec<Hit>, EngineError> {
        let data = fs::read(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.match_bytes(&data, externals))
    }
}

/// A compiled rule ready for execution
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    name: String,
    tags: Vec<String>,
    strings: Vec<CompiledString>,
    quantifier: Quantifier,
    min_matches: Option<usize>,
    external_equals: Vec<(String, String)>,
    external_patterns: Vec<(String, Regex)>,
}

impl CompiledRule {
    /// Compile a TOML rule, returning it with any warnings
    pub(crate) fn compile(
        rule: &TomlRule,
        externals: &ExternalContext,
    ) -> Result<(Self, Vec<String>)> {
        if !is_valid_rule_name(&rule.name) {
            return Err(RuleError::InvalidRule(format!(
                "Invalid rule name `{}`: expected [A-Za-z_][A-Za-z0-9_]*",
                rule.name
            )));
        }

        let mut warnings = Vec::new();
        let mut ids = HashSet::new();
        let mut strings = Vec::with_capacity(rule.strings.len());
        for def in &rule.strings {
            let (compiled, warning) = CompiledString::compile(def)?;
            if !ids.insert(compiled.identifier().to_string()) {
                return Err(RuleError::InvalidRule(format!(
                    "Rule `{}` declares string `{}` more than once",
                    rule.name,
                    compiled.identifier()
                )));
            }
            warnings.extend(warning);
            strings.push(compiled);
        }

        let condition = &rule.condition;
        if let Some(name) = condition.external_names().find(|n| !externals.contains(n)) {
            return Err(RuleError::InvalidRule(format!(
                "Rule `{}` references undefined external variable `{}`",
                rule.name, name
            )));
        }

        if let Some(min) = condition.min_matches {
            if min > strings.len() {
                return Err(RuleError::InvalidRule(format!(
                    "Rule `{}` requires {} matching strings but declares {}",
                    rule.name,
                    min,
                    strings.len()
                )));
            }
        }

        let external_patterns = condition
            .external_patterns
            .iter()
            .map(|(name, pattern)| Ok((name.clone(), compile_regex_safe(pattern)?)))
            .collect::<Result<Vec<_>>>()?;

        if strings.is_empty() && !condition.has_external_conditions() {
            warnings.push("rule has no conditions and matches every file".to_string());
        }

        Ok((
            Self {
                name: rule.name.clone(),
                tags: rule.tags.clone(),
                strings,
                quantifier: condition.strings,
                min_matches: condition.min_matches,
                external_equals: condition
                    .externals
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                external_patterns,
            },
            warnings,
        ))
    }

    /// Evaluate this rule against file contents
    ///
    /// External conditions are checked first so a non-matching file is never
    /// searched.
    pub(crate) fn evaluate(
        &self,
        namespace: &str,
        data: &[u8],
        externals: &ExternalContext,
    ) -> Option<Hit> {
        if !self.check_external_conditions(externals) {
            return None;
        }

        let per_string: Vec<_> = self.strings.iter().map(|s| s.find_all(data)).collect();
        let matched = per_string.iter().filter(|m| !m.is_empty()).count();

        let quantified = match self.quantifier {
            Quantifier::Any => self.strings.is_empty() || matched > 0,
            Quantifier::All => matched == self.strings.len(),
            Quantifier::None => matched == 0,
        };
        if !quantified || matched < self.min_matches.unwrap_or(0) {
            return None;
        }

        Some(Hit {
            rule: self.name.clone(),
            namespace: namespace.to_string(),
            tags: self.tags.clone(),
            strings: per_string.into_iter().flatten().collect(),
        })
    }

    fn check_external_conditions(&self, externals: &ExternalContext) -> bool {
        let value = |name: &str| externals.get(name).unwrap_or("");
        self.external_equals
            .iter()
            .all(|(name, expected)| value(name) == expected)
            && self
                .external_patterns
                .iter()
                .all(|(name, regex)| regex.is_match(value(name)))
    }
}

fn is_valid_rule_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
