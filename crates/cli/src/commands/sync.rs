//! The `sync` subcommand: drive one pass and summarize it.

use std::process::ExitCode;

use anyhow::Result;
use comfy_table::Table;
use dialoguer::Confirm;
use tracing::warn;

use dotsync_core::discover::discover;
use dotsync_core::session::{SyncMode, SyncOptions, SyncSession};
use dotsync_core::sync_pass::{run_pass, CandidateOutcome, SyncReport};
use dotsync_core::tools::ToolRegistry;
use dotsync_core::Config;

use super::style;
use crate::signals;

pub async fn run(
    config: Config,
    mut options: SyncOptions,
    non_interactive: bool,
) -> Result<ExitCode> {
    // The single interactive boundary: merge mode was requested but the
    // merge tool is missing. The operator may consent to an overwrite-mode
    // downgrade; without a terminal we fail fast with the remedy instead.
    if options.mode == SyncMode::Merge {
        let tools = ToolRegistry::detect().await;
        if !tools.has_merge_tool() {
            let remedy = ToolRegistry::merge_remedy();
            if non_interactive {
                anyhow::bail!("three-way merge tool unavailable; {remedy}");
            }
            println!("{}", style::warn(&format!("merge tool missing: {remedy}")));
            let downgrade = Confirm::new()
                .with_prompt(
                    "Continue in overwrite mode instead? Repository copies will be replaced \
                     without merging",
                )
                .default(false)
                .interact()?;
            if !downgrade {
                anyhow::bail!("aborted; {remedy} and re-run");
            }
            warn!("operator consented to overwrite-mode downgrade");
            options.mode = SyncMode::Overwrite;
        }
    }

    let cancel = signals::setup_signal_handlers();
    let verbose = options.verbose;
    let mut session = SyncSession::start(config, options, cancel).await?;
    let candidates = discover(
        &session.config.paths.repo_root,
        &session.config.paths.target_root,
        session.config.options.dot_prefix,
        &session.config.options.ignore_patterns,
        &session.repo_index,
    );
    let report = run_pass(&mut session, candidates).await?;

    render_report(&report, verbose);

    Ok(if report.failures > 0 {
        ExitCode::FAILURE
    } else if report.conflicts > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn render_report(report: &SyncReport, verbose: bool) {
    let rows: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(_, outcome)| verbose || !matches!(outcome, CandidateOutcome::Unchanged))
        .collect();

    if !rows.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["file", "outcome", "detail"]);
        for (candidate, outcome) in rows {
            table.add_row(vec![
                candidate.rel_path.display().to_string(),
                outcome.label().to_string(),
                outcome_detail(outcome),
            ]);
        }
        println!("{table}");
    }

    if report.cancelled {
        println!(
            "{}",
            style::warn("pass interrupted; the rollback script covers completed work")
        );
    }

    if report.dry_run {
        println!(
            "{}",
            style::dim(&format!(
                "dry run: {} file(s) would be updated, {} unchanged, {} conflict(s)",
                report.files_touched, report.unchanged, report.conflicts
            ))
        );
        return;
    }

    if report.failures == 0 && report.conflicts == 0 {
        println!(
            "{}",
            style::success(&format!(
                "{} file(s) updated, {} unchanged, {} skipped",
                report.files_touched, report.unchanged, report.skipped
            ))
        );
    }
    if report.conflicts > 0 {
        println!(
            "{}",
            style::warn(&format!(
                "{} conflict(s) need manual resolution; see the .conflict side files",
                report.conflicts
            ))
        );
    }
    if report.failures > 0 {
        println!(
            "{}",
            style::error(&format!("{} file(s) failed; see details above", report.failures))
        );
    }
    if let Some(script) = &report.rollback_script {
        println!(
            "{}",
            style::dim(&format!("rollback script: {}", script.display()))
        );
    }
}

fn outcome_detail(outcome: &CandidateOutcome) -> String {
    match outcome {
        CandidateOutcome::Conflict { side_file } => side_file.display().to_string(),
        CandidateOutcome::SkippedMissing { reason } | CandidateOutcome::Failed { reason } => {
            reason.clone()
        }
        _ => String::new(),
    }
}
