//! `--init`: create a blank configuration directory.

use anyhow::{Context, Result};
use sigscan_config::ConfigManager;
use std::io::Write;
use std::path::Path;

pub fn run_init(dir: &Path, quiet: bool, out: &mut dyn Write) -> Result<()> {
    let manager = ConfigManager::init_at(dir)
        .with_context(|| format!("Failed to initialize configuration in {}", dir.display()))?;

    if !quiet {
        writeln!(out, "Created configuration in {}", manager.dir().display())?;
        writeln!(
            out,
            "Add list files naming rule sources to {}",
            manager.rulesets_dir().display()
        )?;
    }
    Ok(())
}
