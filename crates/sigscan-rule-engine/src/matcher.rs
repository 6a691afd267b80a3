//! Compiled string matchers
//!
//! Every string definition compiles to a byte-level regex once, at rule
//! compilation time. Literal and hex strings are escaped into regex syntax so
//! a single matching path serves all three kinds.

use crate::constants::{
    MAX_MATCHES_PER_STRING, MAX_REGEX_LENGTH, MIN_STRING_LENGTH, REGEX_DFA_SIZE_LIMIT,
    REGEX_SIZE_LIMIT,
};
use crate::toml_rule::{PatternKind, StringDefinition};
use crate::{Result, RuleError};
use regex::bytes::{Regex as BytesRegex, RegexBuilder as BytesRegexBuilder};
use regex::{Regex, RegexBuilder};
use sigscan_core::StringMatch;

/// Compile a text regex with size limits to prevent ReDoS attacks
pub(crate) fn compile_regex_safe(pattern: &str) -> Result<Regex> {
    check_pattern_length(pattern)?;
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
        .build()
        .map_err(|e| RuleError::InvalidPattern(e.to_string()))
}

fn check_pattern_length(pattern: &str) -> Result<()> {
    if pattern.len() > MAX_REGEX_LENGTH {
        return Err(RuleError::InvalidPattern(format!(
            "Pattern exceeds maximum length of {} characters",
            MAX_REGEX_LENGTH
        )));
    }
    Ok(())
}

/// Build a byte regex with Unicode off
///
/// `\xNN` and `.` then match single raw bytes, and `nocase` folds ASCII only.
fn compile_bytes_regex(pattern: &str, nocase: bool) -> Result<BytesRegex> {
    BytesRegexBuilder::new(pattern)
        .unicode(false)
        .case_insensitive(nocase)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
        .build()
        .map_err(|e| RuleError::InvalidPattern(e.to_string()))
}

/// Translate a hex string into a byte regex
///
/// Accepts pairs of hex digits and `??` wildcards, with optional whitespace
/// between pairs. Returns the pattern and the number of concrete bytes.
pub(crate) fn hex_to_regex(hex: &str) -> Result<(String, usize)> {
    let digits: Vec<char> = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(RuleError::InvalidPattern("Empty hex string".to_string()));
    }
    if digits.len() % 2 != 0 {
        return Err(RuleError::InvalidPattern(format!(
            "Hex string has an odd number of digits: {}",
            hex
        )));
    }

    // Unicode off so \xNN matches a raw byte; dot-all so ?? matches newlines
    let mut pattern = String::from("(?s-u)");
    let mut concrete = 0;
    for pair in digits.chunks(2) {
        match (pair[0], pair[1]) {
            ('?', '?') => pattern.push('.'),
            (hi, lo) => {
                let (Some(hi), Some(lo)) = (hi.to_digit(16), lo.to_digit(16)) else {
                    return Err(RuleError::InvalidPattern(format!(
                        "Invalid hex byte `{}{}` in: {}",
                        pair[0], pair[1], hex
                    )));
                };
                pattern.push_str(&format!("\\x{:02X}", hi * 16 + lo));
                concrete += 1;
            }
        }
    }
    Ok((pattern, concrete))
}

/// A compiled string ready for matching
#[derive(Debug, Clone)]
pub struct CompiledString {
    identifier: String,
    regex: BytesRegex,
}

impl CompiledString {
    /// Compile a string definition
    ///
    /// Returns the compiled string and, when the pattern is likely to slow
    /// scanning down, a warning message.
    pub fn compile(def: &StringDefinition) -> Result<(Self, Option<String>)> {
        let identifier = def.identifier();
        if identifier.len() < 2 {
            return Err(RuleError::InvalidRule("String identifier is empty".to_string()));
        }

        let pattern = def.pattern().ok_or_else(|| {
            RuleError::InvalidRule(format!(
                "String `{}` must set exactly one of text, hex or regex",
                identifier
            ))
        })?;

        let (regex, warning) = match pattern {
            PatternKind::Text(text) => {
                if text.is_empty() {
                    return Err(RuleError::InvalidPattern(format!(
                        "String `{}` is empty",
                        identifier
                    )));
                }
                let regex = compile_bytes_regex(&regex::escape(text), def.nocase)?;
                let warning = (text.len() < MIN_STRING_LENGTH).then(|| short_warning(&identifier));
                (regex, warning)
            }
            PatternKind::Hex(hex) => {
                if def.nocase {
                    return Err(RuleError::InvalidRule(format!(
                        "String `{}`: nocase does not apply to hex strings",
                        identifier
                    )));
                }
                let (pattern, concrete) = hex_to_regex(hex)?;
                let regex = compile_bytes_regex(&pattern, false)?;
                let warning = (concrete < MIN_STRING_LENGTH).then(|| short_warning(&identifier));
                (regex, warning)
            }
            PatternKind::Regex(pattern) => {
                check_pattern_length(pattern)?;
                let regex = compile_bytes_regex(pattern, def.nocase)?;
                let warning = regex.is_match(b"").then(|| {
                    format!(
                        "string `{}` matches empty input and may slow down scanning",
                        identifier
                    )
                });
                (regex, warning)
            }
        };

        Ok((Self { identifier, regex }, warning))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Find every match in `data`, up to the per-string limit
    ///
    /// Empty matches are skipped; they carry no bytes to report.
    pub fn find_all(&self, data: &[u8]) -> Vec<StringMatch> {
        self.regex
            .find_iter(data)
            .filter(|m| !m.as_bytes().is_empty())
            .take(MAX_MATCHES_PER_STRING)
            .map(|m| StringMatch {
                offset: m.start() as u64,
                identifier: self.identifier.clone(),
                data: m.as_bytes().to_vec(),
            })
            .collect()
    }
}

fn short_warning(identifier: &str) -> String {
    format!(
        "string `{}` is shorter than {} bytes and may slow down scanning",
        identifier, MIN_STRING_LENGTH
    )
}
