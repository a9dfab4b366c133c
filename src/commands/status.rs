//! Status and show commands: read-only views of the store

use crate::error::{Error, Result};
use crate::report::RunOutput;
use crate::store::{validate_target, ReportStore, TargetStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One row of the status listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub target: String,
    pub status: String,
    pub frequency: String,
    pub last_update: Option<String>,
    pub has_report: bool,
}

impl TargetInfo {
    fn new(store: &ReportStore, target: &str, entry: &TargetStatus) -> Self {
        let has_report = store
            .report_path(target)
            .map(|path| path.is_file())
            .unwrap_or(false);

        Self {
            target: target.to_string(),
            status: entry.status.as_ref().map(ToString::to_string).unwrap_or_default(),
            frequency: entry
                .frequency
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            last_update: entry.last_update.clone(),
            has_report,
        }
    }
}

/// Lifecycle of every configured target, or of just `target`
pub fn cmd_status(store: &ReportStore, target: Option<&str>) -> Result<Vec<TargetInfo>> {
    info!("Reading {}", store.config_path().display());
    let config = store.load_config()?;

    match target {
        Some(target) => {
            validate_target(target)?;
            let entry = config.get(target)?.ok_or_else(|| {
                Error::Config(format!("{} is not in linkspam_config.json", target))
            })?;
            Ok(vec![TargetInfo::new(store, target, &entry)])
        }
        None => Ok(config
            .targets()
            .map(|(name, entry)| TargetInfo::new(store, name, &entry))
            .collect()),
    }
}

/// Stored report for `target`; `None` when it has never been run
pub fn cmd_show(store: &ReportStore, target: &str) -> Result<Option<RunOutput>> {
    store.load_report(target)
}

/// Print the status listing to the console
pub fn print_status(targets: &[TargetInfo]) {
    if targets.is_empty() {
        println!("No targets configured.");
        return;
    }

    println!(
        "{:<40} {:<16} {:<10} {:<28} REPORT",
        "TARGET", "STATUS", "FREQUENCY", "LAST UPDATE"
    );
    for t in targets {
        println!(
            "{:<40} {:<16} {:<10} {:<28} {}",
            t.target,
            t.status,
            t.frequency,
            t.last_update.as_deref().unwrap_or("never"),
            if t.has_report { "yes" } else { "no" }
        );
    }
}

/// Print a stored report's summary table
pub fn print_report(output: &RunOutput) {
    println!("\nLinks to {} (run {})\n", output.target, output.start_time);

    for (dbname, count) in output.summary_table.entries.iter() {
        println!("  {:<30} {:>6}", dbname, count);
    }
    println!(
        "\n{} pages on {} wikis",
        output.summary_table.total_pages, output.summary_table.total_wikis
    );

    if !output.skipped.is_empty() {
        println!("\nSkipped {} sites:", output.skipped.len());
        for url in &output.skipped {
            println!("  {}", url);
        }
    }
}
