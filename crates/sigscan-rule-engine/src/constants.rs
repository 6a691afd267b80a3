//! Security and performance limits for rule compilation and matching
//!
//! These constants bound the cost of untrusted rule files:
//! - ReDoS (Regular Expression Denial of Service)
//! - Memory exhaustion
//! - Match explosion on highly repetitive input

/// Maximum size for a TOML rule file (1MB)
///
/// Rule files are small text files. Anything larger is almost certainly
/// not a rule file, and is rejected before it is read.
pub const MAX_TOML_FILE_SIZE: u64 = 1_048_576; // 1MB

/// Maximum regex pattern length (500 characters)
///
/// Applies to `regex` strings and to `external_patterns` conditions.
/// Literal and hex strings are escaped and are not subject to this limit.
pub const MAX_REGEX_LENGTH: usize = 500;

/// Compiled regex size limit (10MB)
pub const REGEX_SIZE_LIMIT: usize = 10_000_000; // 10MB

/// Regex DFA size limit (2MB)
pub const REGEX_DFA_SIZE_LIMIT: usize = 2_000_000; // 2MB

/// Maximum number of match records kept per string per file
///
/// A one-byte pattern against a large file would otherwise produce one
/// record per byte. Matching still reports the string as matched.
pub const MAX_MATCHES_PER_STRING: usize = 1_000;

/// Literal and hex strings shorter than this raise a warning
///
/// Very short patterns match almost everywhere and slow scanning down.
pub const MIN_STRING_LENGTH: usize = 2;
