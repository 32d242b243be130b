//! Run statistics

use std::fmt;
use std::process::ExitCode;

use tracing::{error, info};

use crate::processor::{FileOutcome, FileReport, Mode, SkipReason};

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidate files found.
    pub total: usize,
    pub processed: usize,
    /// Files skipped for either reason.
    pub skipped: usize,
    pub errors: usize,
    /// Of `skipped`, how many only because of a dry run.
    pub dry_run_skipped: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.outcome {
                FileOutcome::Processed => summary.processed += 1,
                FileOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    if reason == SkipReason::DryRun {
                        summary.dry_run_skipped += 1;
                    }
                }
                FileOutcome::Error(_) => summary.errors += 1,
            }
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// Process exit status: 0 when no file failed, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Logs the labelled breakdown shown in verbose mode.
    pub fn log_breakdown(&self, mode: Mode, dry_run: bool) {
        if dry_run {
            info!("DRY RUN SUMMARY:");
        } else {
            info!("{} SUMMARY:", mode.noun().to_uppercase());
        }
        info!("   Total files found: {}", self.total);
        if dry_run {
            info!("   Would {}: {}", mode.verb(), self.dry_run_skipped);
        } else {
            info!("   {}: {}", capitalize(mode.past_tense()), self.processed);
        }
        if self.errors > 0 {
            error!("   Errors: {}", self.errors);
        }
        info!(
            "   Already {} (skipped): {}",
            mode.past_tense(),
            self.skipped - self.dry_run_skipped
        );

        if self.errors > 0 {
            error!(
                "Some files failed to {}. Check your AWS credentials and .sops.yaml configuration.",
                mode.verb()
            );
        } else if dry_run {
            info!("Dry run completed successfully");
        } else {
            info!("{} completed successfully", capitalize(mode.noun()));
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} processed={} skipped={} errors={}",
            self.total, self.processed, self.skipped, self.errors
        )
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
