//! Sigscan CLI - scan files with signature rules from many sources at once.

use anyhow::{Context, Result};
use clap::Parser;
use sigscan_cli::cli::{run_init, run_scan, ScanRunOptions, ScanStatus};
use sigscan_cli::formatters::OutputFormat;
use sigscan_cli::logging::init_logging;
use sigscan_config::ConfigManager;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sigscan")]
#[command(about = "Scan files with signature rules from multiple sources", long_about = None)]
struct Cli {
    /// File(s) or directories to scan
    #[arg(value_name = "FILE", required_unless_present = "init")]
    files: Vec<PathBuf>,

    /// Directory containing rule files (can be specified multiple times)
    #[arg(short = 'd', value_name = "DIR")]
    rule_dirs: Vec<PathBuf>,

    /// Rule file (can be specified multiple times)
    #[arg(short = 'f', value_name = "FILE")]
    rule_files: Vec<PathBuf>,

    /// File containing paths to rule files, one per line
    #[arg(short = 'l', value_name = "FILE")]
    list_files: Vec<PathBuf>,

    /// Only use rule files from -d directories whose name matches this glob
    #[arg(long = "filter", value_name = "GLOB")]
    filters: Vec<String>,

    /// Define an external variable for rule conditions
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
    defines: Vec<(String, String)>,

    /// Verbose output
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output in CSV format
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output one JSON object per line
    #[arg(long)]
    json: bool,

    /// Only show files with matches
    #[arg(short = 'm')]
    only_matches: bool,

    /// Only display match/none, no informational messages
    #[arg(short, long)]
    quiet: bool,

    /// Create a blank config (default: ~/.sigscan/)
    #[arg(long)]
    init: bool,

    /// Use/create configuration in the given directory
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Error on warnings during rule compilation
    #[arg(long)]
    fail_on_warnings: bool,

    /// Print strings in offset:var:string format
    #[arg(long)]
    print_strings: bool,
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Without a home directory a scan with explicit rule sources still runs
    let config_dir = cli.config_dir.or_else(|| ConfigManager::default_dir().ok());

    if cli.init {
        let config_dir = config_dir.context("Failed to locate configuration directory")?;
        run_init(&config_dir, cli.quiet, &mut io::stdout())?;
        return Ok(ExitCode::SUCCESS);
    }

    let format = if cli.csv {
        OutputFormat::Csv
    } else if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };

    let options = ScanRunOptions {
        targets: cli.files,
        rule_files: cli.rule_files,
        rule_dirs: cli.rule_dirs,
        list_files: cli.list_files,
        filters: cli.filters,
        defines: cli.defines,
        config_dir,
        format,
        only_matches: cli.only_matches,
        print_strings: cli.print_strings,
        fail_on_warnings: cli.fail_on_warnings,
        quiet: cli.quiet,
        color: io::stdout().is_terminal(),
    };

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let status = run_scan(&options, &mut out, &mut io::stderr())?;

    Ok(match status {
        ScanStatus::Completed => ExitCode::SUCCESS,
        ScanStatus::ConfigDirMissing => ExitCode::FAILURE,
    })
}
