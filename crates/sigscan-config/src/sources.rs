//! Rule source collection from files, directories and list files.

use crate::manager::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sigscan_core::RuleSource;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Ordered collection of rule sources.
///
/// Duplicates are kept; they collapse into one namespace at compile time.
#[derive(Debug, Default)]
pub struct SourceSet {
    sources: Vec<RuleSource>,
    filter: Option<GlobSet>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict directory discovery to file names matching any pattern
    ///
    /// Explicit files and list file entries are never filtered.
    pub fn with_filter<I>(mut self, patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut any = false;
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
            any = true;
        }
        self.filter = if any { Some(builder.build()?) } else { None };
        Ok(self)
    }

    /// Collect sources in the canonical order: files, then directories, then
    /// list files.
    pub fn gather(
        mut self,
        files: &[PathBuf],
        dirs: &[PathBuf],
        lists: &[PathBuf],
    ) -> Result<Self, ConfigError> {
        self.add_files(files.iter().cloned());
        for dir in dirs {
            self.add_dir(dir)?;
        }
        for list in lists {
            self.add_list_file(list)?;
        }
        Ok(self)
    }

    pub fn add_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<RuleSource>,
    {
        self.sources.extend(files.into_iter().map(Into::into));
    }

    /// Add every file below `dir`, skipping `.git` directories
    pub fn add_dir(&mut self, dir: &Path) -> Result<(), ConfigError> {
        let before = self.sources.len();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_git_dir(e));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(filter) = &self.filter {
                if !filter.is_match(entry.file_name()) {
                    continue;
                }
            }
            self.sources.push(RuleSource::new(entry.into_path()));
        }
        debug!(
            dir = %dir.display(),
            added = self.sources.len() - before,
            "collected rule directory"
        );
        Ok(())
    }

    /// Add each non-empty trimmed line of a list file
    pub fn add_list_file(&mut self, list: &Path) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(list)?;
        self.sources.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(RuleSource::from),
        );
        Ok(())
    }

    pub fn sources(&self) -> &[RuleSource] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<RuleSource> {
        self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}
