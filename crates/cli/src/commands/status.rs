//! The `status` subcommand: read-only drift report.
//!
//! Classification and comparison only — no session, no backups, and the
//! journal is never initialized.

use anyhow::Result;
use comfy_table::Table;

use dotsync_core::classify::{classify, Classification};
use dotsync_core::compare::{compare, ComparisonResult};
use dotsync_core::discover::discover;
use dotsync_core::tools::ToolRegistry;
use dotsync_core::vcs::RepoIndex;
use dotsync_core::Config;

use super::style;

pub async fn run(config: Config) -> Result<()> {
    let tools = ToolRegistry::detect().await;
    let index = RepoIndex::open(&config.paths.repo_root);
    let candidates = discover(
        &config.paths.repo_root,
        &config.paths.target_root,
        config.options.dot_prefix,
        &config.options.ignore_patterns,
        &index,
    );

    let mut table = Table::new();
    table.set_header(vec!["file", "type", "state", "tracked"]);

    let mut diverged = 0usize;
    for candidate in &candidates {
        let class = match classify(&candidate.local_path, &tools).await {
            Ok(class) => class,
            Err(e) => {
                table.add_row(vec![
                    candidate.rel_path.display().to_string(),
                    "?".into(),
                    e.to_string(),
                    tracked_label(candidate.tracked),
                ]);
                continue;
            }
        };
        let state = if class == Classification::Binary {
            "-".to_string()
        } else {
            match compare(&candidate.local_path, &candidate.repo_path) {
                Ok(ComparisonResult::Identical) => "identical".to_string(),
                Ok(ComparisonResult::Diverged) => {
                    diverged += 1;
                    "diverged".to_string()
                }
                Err(e) => e.to_string(),
            }
        };
        table.add_row(vec![
            candidate.rel_path.display().to_string(),
            class.to_string(),
            state,
            tracked_label(candidate.tracked),
        ]);
    }

    println!("{table}");
    if diverged == 0 {
        println!(
            "{}",
            style::success(&format!("{} candidate(s), no drift", candidates.len()))
        );
    } else {
        println!(
            "{}",
            style::warn(&format!(
                "{diverged} of {} candidate(s) diverged; run `dotsync sync` to reconcile",
                candidates.len()
            ))
        );
    }
    Ok(())
}

fn tracked_label(tracked: bool) -> String {
    if tracked { "yes".into() } else { "no".into() }
}
