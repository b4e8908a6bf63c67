//! The `init` subcommand: generate a starter configuration file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use dotsync_core::Config;

use super::style;

pub fn run(repo_root: &Path, output: &Path) -> Result<()> {
    if output.exists() {
        bail!("refusing to overwrite existing config at {}", output.display());
    }

    let config = Config::starter(repo_root);
    let body = toml::to_string_pretty(&config).context("serializing starter config")?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(output, body).with_context(|| format!("writing {}", output.display()))?;

    println!("{}", style::success(&format!("wrote {}", output.display())));
    if !repo_root.is_dir() {
        println!(
            "{}",
            style::warn(&format!(
                "note: {} does not exist yet; create it before the first sync",
                repo_root.display()
            ))
        );
    }
    Ok(())
}
