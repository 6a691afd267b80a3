//! Per-file external context derivation.
//!
//! Every scanned file gets an [`ExternalContext`] with `filepath`, `filename`
//! and `extension` set, layered over an optional base mapping supplied by the
//! caller.

use crate::types::ExternalContext;
use std::path::{is_separator, Path};

/// Builds an [`ExternalContext`] from whatever parts of a file location are
/// known.
///
/// Missing parts are derived from the ones given:
///
/// 1. A missing path is synthesized from directory + name.
/// 2. A missing extension is taken from the name, else from the path.
/// 3. A missing name is the final segment of the path.
///
/// Base entries have the lowest precedence; the three file variables always
/// overwrite same-named base entries. Anything that cannot be determined is
/// the empty string.
///
/// # Examples
///
/// ```
/// use sigscan_core::ContextBuilder;
///
/// let ctx = ContextBuilder::new().name("a.txt").directory("/tmp").build();
/// assert_eq!(ctx.get("filepath"), Some("/tmp/a.txt"));
/// assert_eq!(ctx.get("filename"), Some("a.txt"));
/// assert_eq!(ctx.get("extension"), Some(".txt"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder<'a> {
    path: Option<&'a str>,
    name: Option<&'a str>,
    extension: Option<&'a str>,
    directory: Option<&'a str>,
    base: Option<&'a ExternalContext>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full path of the file.
    pub fn path(mut self, path: &'a str) -> Self {
        self.path = Some(path);
        self
    }

    /// File name without directories.
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Extension, including the leading dot.
    pub fn extension(mut self, extension: &'a str) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Directory containing the file.
    pub fn directory(mut self, directory: &'a str) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Base variables, overridden by the file variables.
    pub fn base(mut self, base: &'a ExternalContext) -> Self {
        self.base = Some(base);
        self
    }

    pub fn build(self) -> ExternalContext {
        // Empty strings count as absent
        let given = |v: Option<&'a str>| v.filter(|s| !s.is_empty());
        let name = given(self.name);
        let directory = given(self.directory);

        let path = match (given(self.path), name, directory) {
            (Some(path), _, _) => path.to_string(),
            (None, Some(name), Some(dir)) => {
                Path::new(dir).join(name).to_string_lossy().into_owned()
            }
            _ => String::new(),
        };

        let extension = match (given(self.extension), name) {
            (Some(ext), _) => ext.to_string(),
            (None, Some(name)) => split_extension(name).to_string(),
            (None, None) => split_extension(&path).to_string(),
        };

        let name = match name {
            Some(name) => name.to_string(),
            None => final_segment(&path).to_string(),
        };

        let mut vars = self.base.map(ExternalContext::to_map).unwrap_or_default();
        vars.insert(ExternalContext::FILEPATH.to_string(), path);
        vars.insert(ExternalContext::FILENAME.to_string(), name);
        vars.insert(ExternalContext::EXTENSION.to_string(), extension);

        ExternalContext::from_map(vars)
    }
}

/// Builds a context from optional parts; `None` and `""` mean absent.
pub fn build_context(
    path: Option<&str>,
    name: Option<&str>,
    extension: Option<&str>,
    directory: Option<&str>,
    base: Option<&ExternalContext>,
) -> ExternalContext {
    let mut builder = ContextBuilder::new();
    builder.path = path;
    builder.name = name;
    builder.extension = extension;
    builder.directory = directory;
    builder.base = base;
    builder.build()
}

/// Final segment of a path string; empty when it ends with a separator.
fn final_segment(path: &str) -> &str {
    path.rsplit(is_separator).next().unwrap_or("")
}

/// Extension of the final segment, dot included.
///
/// Leading dots of the segment are not extension separators, so `.bashrc`
/// has no extension while `archive.tar.gz` has `.gz`.
fn split_extension(path: &str) -> &str {
    let segment = final_segment(path);
    let stem_start = segment.len() - segment.trim_start_matches('.').len();
    match segment[stem_start..].rfind('.') {
        Some(dot) => &segment[stem_start + dot..],
        None => "",
    }
}
