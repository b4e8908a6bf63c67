//! The `doctor` subcommand: environment health check.

use std::path::Path;

use anyhow::Result;

use dotsync_core::tools::ToolRegistry;
use dotsync_core::vcs::RepoIndex;
use dotsync_core::Config;

use super::style;

pub async fn run(config_path: &Path) -> Result<()> {
    println!();
    println!("{}", style::header("dotsync doctor"));
    println!("{}", "═".repeat(14));
    println!();

    let mut issues = Vec::new();

    // 1. Configuration
    let config = match Config::load(config_path) {
        Ok(config) => {
            println!(
                "  {}",
                style::success(&format!("Configuration   {}", config_path.display()))
            );
            Some(config)
        }
        Err(e) => {
            println!("  {}", style::error(&format!("Configuration   {e}")));
            issues.push(format!(
                "Fix the configuration, or generate one with: dotsync init <repo-root> --output {}",
                config_path.display()
            ));
            None
        }
    };

    if let Some(config) = &config {
        // 2. Template repository
        let repo_root = &config.paths.repo_root;
        if repo_root.is_dir() {
            let index = RepoIndex::open(repo_root);
            if index.tracked_count() > 0 {
                println!(
                    "  {}",
                    style::success(&format!(
                        "Repository      {} ({} tracked files)",
                        repo_root.display(),
                        index.tracked_count()
                    ))
                );
            } else {
                println!(
                    "  {}",
                    style::warn(&format!(
                        "Repository      {} (no git history)",
                        repo_root.display()
                    ))
                );
                issues.push(
                    "Repository has no git history; merges will treat every file as new".into(),
                );
            }
        } else {
            println!(
                "  {}",
                style::error(&format!("Repository      {} (missing)", repo_root.display()))
            );
            issues.push(format!("Create or clone the repository at {}", repo_root.display()));
        }

        // 3. Target root
        let target = &config.paths.target_root;
        if target.is_dir() {
            println!(
                "  {}",
                style::success(&format!("Target root     {}", target.display()))
            );
        } else {
            println!(
                "  {}",
                style::error(&format!("Target root     {} (missing)", target.display()))
            );
            issues.push(format!("Target root does not exist: {}", target.display()));
        }

        // 4. Data directory
        let data_dir = &config.paths.data_dir;
        if data_dir.exists() {
            println!(
                "  {}",
                style::success(&format!("Data directory  {}", data_dir.display()))
            );
        } else {
            println!(
                "  {}",
                style::dim(&format!(
                    "  ○ Data directory  {} (created on first sync)",
                    data_dir.display()
                ))
            );
        }
    }

    // 5. External tools
    let tools = ToolRegistry::detect().await;
    if tools.has_merge_tool() {
        println!("  {}", style::success("Merge tool      diff3 found"));
    } else {
        println!("  {}", style::warn("Merge tool      diff3 missing"));
        issues.push(ToolRegistry::merge_remedy());
    }
    if tools.has_file_probe() {
        println!("  {}", style::success("Type probe      file found"));
    } else {
        println!(
            "  {}",
            style::warn("Type probe      file missing (extension fallback in use)")
        );
    }

    println!();
    if issues.is_empty() {
        println!("{}", style::success("No issues found"));
    } else {
        println!("{}", style::header(&format!("{} issue(s):", issues.len())));
        for issue in &issues {
            println!("  - {issue}");
        }
    }
    println!();
    Ok(())
}
