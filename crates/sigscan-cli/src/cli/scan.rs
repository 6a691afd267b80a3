//! Scan orchestration for the command line.

use crate::formatters::{formatter_for, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use sigscan_config::{ConfigManager, ScanSettings, SourceSet};
use sigscan_core::{Error as ScanError, ExternalContext, ScanOptions, ScanOrchestrator};
use sigscan_rule_engine::TomlEngine;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// How a scan run ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    /// No rule sources were given and the configuration directory is missing
    ConfigDirMissing,
}

/// Options for running a scan.
pub struct ScanRunOptions {
    pub targets: Vec<PathBuf>,
    pub rule_files: Vec<PathBuf>,
    pub rule_dirs: Vec<PathBuf>,
    pub list_files: Vec<PathBuf>,
    pub filters: Vec<String>,
    pub defines: Vec<(String, String)>,
    /// Configuration directory; `None` when none could be located
    pub config_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub only_matches: bool,
    pub print_strings: bool,
    pub fail_on_warnings: bool,
    pub quiet: bool,
    pub color: bool,
}

/// Runs the scan, writing records to `out` and messages to `err`.
pub fn run_scan(
    options: &ScanRunOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<ScanStatus> {
    let manager = match options.config_dir.as_deref() {
        Some(dir) if dir.is_dir() => {
            Some(ConfigManager::load_from(dir).context("Failed to load configuration")?)
        }
        _ => None,
    };

    // Step 1: Collect rule sources
    let mut list_files = options.list_files.clone();
    if options.rule_files.is_empty() && options.rule_dirs.is_empty() && list_files.is_empty() {
        if !options.quiet {
            writeln!(err, "No rulesets given; checking user-specific config...")?;
        }
        let Some(manager) = manager.as_ref().filter(|m| m.rulesets_dir().is_dir()) else {
            if !options.quiet {
                writeln!(err, "Configuration directory not found!")?;
            }
            return Ok(ScanStatus::ConfigDirMissing);
        };
        list_files = manager
            .ruleset_lists()
            .context("Failed to read ruleset lists")?;
        if !options.quiet {
            if list_files.is_empty() {
                writeln!(err, "No Rulesets found in {}", manager.dir().display())?;
            } else {
                writeln!(err, "Rulesets found: {}", list_files.len())?;
            }
        }
    }

    let sources = SourceSet::new()
        .with_filter(&options.filters)
        .context("Invalid --filter pattern")?
        .gather(&options.rule_files, &options.rule_dirs, &list_files)
        .context("Failed to collect rule sources")?
        .into_sources();
    info!(sources = sources.len(), "collected rule sources");

    // Step 2: Merge settings; flags only ever turn options on
    let settings = manager
        .as_ref()
        .map(|m| m.config().settings.clone())
        .unwrap_or_default();
    let ScanSettings {
        fail_on_warnings,
        only_matches,
        print_strings,
    } = settings;
    let fail_on_warnings = fail_on_warnings || options.fail_on_warnings;
    let only_matches = only_matches || options.only_matches;
    let print_strings = print_strings || options.print_strings;

    let mut externals: BTreeMap<String, String> = manager
        .as_ref()
        .map(|m| m.config().externals.clone())
        .unwrap_or_default();
    externals.extend(options.defines.iter().cloned());
    let externals: ExternalContext = externals.into_iter().collect();
    debug!(externals = externals.len(), "base external variables");

    // Step 3: Compile and scan
    let orchestrator = ScanOrchestrator::new(TomlEngine::new());
    let scan_options = ScanOptions {
        sources,
        externals,
        escalate_warnings: fail_on_warnings,
        ..Default::default()
    };
    let results = match orchestrator.scan(options.targets.iter().cloned(), scan_options) {
        Ok(results) => results,
        Err(ScanError::Warnings { warnings }) => {
            for warning in &warnings {
                print_warning(err, options.color, warning.message())?;
            }
            anyhow::bail!(
                "Rule compilation raised {} warnings (--fail-on-warnings)",
                warnings.len()
            );
        }
        Err(e) => return Err(e).context("Failed to compile rules"),
    };

    if !options.quiet {
        for diagnostic in results.diagnostics() {
            print_warning(err, options.color, diagnostic.message())?;
        }
    }

    // Step 4: Stream records
    let mut formatter = formatter_for(options.format, print_strings, options.color);
    for record in results {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                out.flush()?;
                return Err(e).context("Scan aborted");
            }
        };
        if only_matches && !record.outcome.is_hit() {
            continue;
        }
        formatter.write_record(out, &record)?;
    }
    out.flush()?;

    Ok(ScanStatus::Completed)
}

fn print_warning(err: &mut dyn Write, color: bool, message: &str) -> std::io::Result<()> {
    if color {
        writeln!(err, "{} {}", "warning:".yellow().bold(), message)
    } else {
        writeln!(err, "warning: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const RULES: &str = r#"
[[rules]]
name = "marker"
[[rules.strings]]
id = "m"
text = "MARKER"
"#;

    fn options(temp: &Path) -> ScanRunOptions {
        ScanRunOptions {
            targets: vec![],
            rule_files: vec![],
            rule_dirs: vec![],
            list_files: vec![],
            filters: vec![],
            defines: vec![],
            config_dir: Some(temp.join("no-config")),
            format: OutputFormat::Plain,
            only_matches: false,
            print_strings: false,
            fail_on_warnings: false,
            quiet: false,
            color: false,
        }
    }

    fn run(options: &ScanRunOptions) -> (Result<ScanStatus>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = run_scan(options, &mut out, &mut err);
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_missing_config_dir() {
        let temp = TempDir::new().unwrap();
        let mut opts = options(temp.path());
        opts.targets = vec![temp.path().join("x")];

        let (status, out, err) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::ConfigDirMissing);
        assert!(out.is_empty());
        assert_eq!(
            err,
            "No rulesets given; checking user-specific config...\n\
             Configuration directory not found!\n"
        );
    }

    #[test]
    fn test_quiet_missing_config_dir_prints_nothing() {
        let temp = TempDir::new().unwrap();
        let mut opts = options(temp.path());
        opts.quiet = true;

        let (status, _, err) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::ConfigDirMissing);
        assert!(err.is_empty());
    }

    #[test]
    fn test_plain_scan_with_rule_file() {
        let temp = TempDir::new().unwrap();
        let rules = temp.path().join("r.toml");
        fs::write(&rules, RULES).unwrap();
        let hit = temp.path().join("hit.txt");
        fs::write(&hit, "has MARKER inside").unwrap();
        let clean = temp.path().join("clean.txt");
        fs::write(&clean, "nothing").unwrap();

        let mut opts = options(temp.path());
        opts.rule_files = vec![rules.clone()];
        opts.targets = vec![hit.clone(), clean.clone()];

        let (status, out, _) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::Completed);
        assert_eq!(
            out,
            format!(
                "marker {} {}\nNone None {}\n",
                rules.display(),
                hit.display(),
                clean.display()
            )
        );

        opts.only_matches = true;
        let (_, out, _) = run(&opts);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_explicit_rules_without_config_dir() {
        let temp = TempDir::new().unwrap();
        let rules = temp.path().join("r.toml");
        fs::write(&rules, RULES).unwrap();
        let hit = temp.path().join("hit.txt");
        fs::write(&hit, "MARKER").unwrap();

        let mut opts = options(temp.path());
        opts.config_dir = None;
        opts.rule_files = vec![rules];
        opts.targets = vec![hit];

        let (status, out, _) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::Completed);
        assert!(out.starts_with("marker "));

        // Nothing to fall back on when no sources are given either
        opts.rule_files.clear();
        let (status, _, err) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::ConfigDirMissing);
        assert!(err.ends_with("Configuration directory not found!\n"));
    }

    #[test]
    fn test_config_rulesets_and_externals() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("cfg");
        let mut manager = ConfigManager::init_at(&config_dir).unwrap();
        manager
            .config_mut()
            .externals
            .insert("team".to_string(), "ir".to_string());
        manager.save().unwrap();

        let rules = temp.path().join("team.toml");
        fs::write(
            &rules,
            r#"
[[rules]]
name = "team_marker"
[[rules.strings]]
id = "m"
text = "MARKER"
[rules.condition.externals]
team = "ir"
"#,
        )
        .unwrap();
        fs::write(
            manager.rulesets_dir().join("default.list"),
            format!("{}\n", rules.display()),
        )
        .unwrap();
        let target = temp.path().join("t.bin");
        fs::write(&target, "MARKER").unwrap();

        let mut opts = options(temp.path());
        opts.config_dir = Some(config_dir);
        opts.targets = vec![target];

        let (status, out, err) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::Completed);
        assert!(out.starts_with("team_marker "));
        assert!(err.contains("Rulesets found: 1"));

        // -D overrides the configured value
        opts.defines = vec![("team".to_string(), "soc".to_string())];
        let (_, out, _) = run(&opts);
        assert!(out.starts_with("None None "));
    }

    #[test]
    fn test_fail_on_warnings() {
        let temp = TempDir::new().unwrap();
        let rules = temp.path().join("noisy.toml");
        fs::write(&rules, "[[rules]]\nname = \"everything\"\n").unwrap();
        let target = temp.path().join("t.bin");
        fs::write(&target, "x").unwrap();

        let mut opts = options(temp.path());
        opts.rule_files = vec![rules];
        opts.targets = vec![target];

        let (status, out, err) = run(&opts);
        assert_eq!(status.unwrap(), ScanStatus::Completed);
        assert!(out.starts_with("everything "));
        assert!(err.starts_with("warning: "));

        opts.fail_on_warnings = true;
        let (status, out, err) = run(&opts);
        assert!(status.is_err());
        assert!(out.is_empty());
        assert!(err.contains("matches every file"));
    }

    #[test]
    fn test_scan_error_keeps_earlier_records() {
        let temp = TempDir::new().unwrap();
        let rules = temp.path().join("r.toml");
        fs::write(&rules, RULES).unwrap();
        let first = temp.path().join("first.txt");
        fs::write(&first, "MARKER").unwrap();

        let mut opts = options(temp.path());
        opts.rule_files = vec![rules];
        opts.targets = vec![first, temp.path().join("missing.txt")];
        opts.format = OutputFormat::Csv;

        let (status, out, _) = run(&opts);
        assert!(status.is_err());
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("marker,"));
    }
}
