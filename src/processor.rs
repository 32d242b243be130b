//! Per-file classification and processing
//!
//! Each candidate is checked for a SOPS marker, then skipped, reported
//! (dry run) or handed to the [`SecretsTool`]. A tool failure is recorded
//! against that file and the batch carries on.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::SopsBatchError;
use crate::marker;
use crate::tool::SecretsTool;

/// Which direction a run goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    /// The sops flag selecting this mode.
    pub fn sops_flag(self) -> &'static str {
        match self {
            Mode::Encrypt => "-e",
            Mode::Decrypt => "-d",
        }
    }

    /// True if a file with (or without) a marker needs no work in this mode.
    pub fn is_in_target_state(self, has_marker: bool) -> bool {
        match self {
            Mode::Encrypt => has_marker,
            Mode::Decrypt => !has_marker,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Mode::Encrypt => "encrypt",
            Mode::Decrypt => "decrypt",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Mode::Encrypt => "encrypted",
            Mode::Decrypt => "decrypted",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Mode::Encrypt => "encryption",
            Mode::Decrypt => "decryption",
        }
    }

    fn progressive(self) -> &'static str {
        match self {
            Mode::Encrypt => "Encrypting",
            Mode::Decrypt => "Decrypting",
        }
    }

    fn in_state_label(self) -> &'static str {
        match self {
            Mode::Encrypt => "already encrypted",
            Mode::Decrypt => "not encrypted",
        }
    }
}

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already encrypted (encrypt) or carries no marker (decrypt).
    AlreadyInState,
    /// Would have been processed, but this is a dry run.
    DryRun,
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    Processed,
    Skipped(SkipReason),
    Error(SopsBatchError),
}

/// A file paired with its outcome.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Classifies and, unless skipped, processes a single file.
pub fn process_file(
    tool: &mut dyn SecretsTool,
    mode: Mode,
    dry_run: bool,
    path: &Path,
) -> FileOutcome {
    let has_marker = marker::file_has_sops_marker(path);
    if mode.is_in_target_state(has_marker) {
        info!("SKIP ({}): {}", mode.in_state_label(), path.display());
        return FileOutcome::Skipped(SkipReason::AlreadyInState);
    }

    if dry_run {
        info!("WOULD {}: {}", mode.verb().to_uppercase(), path.display());
        return FileOutcome::Skipped(SkipReason::DryRun);
    }

    info!("{}: {}", mode.progressive(), path.display());
    match tool.run_in_place(mode, path) {
        Ok(()) => {
            info!("Successfully {}: {}", mode.past_tense(), path.display());
            FileOutcome::Processed
        }
        Err(e) => {
            error!(
                "Failed to {} {}: {}",
                mode.verb(),
                path.display(),
                e.chain_message()
            );
            FileOutcome::Error(e)
        }
    }
}

/// Processes `files` in order, one at a time.
pub fn process_files(
    tool: &mut dyn SecretsTool,
    mode: Mode,
    dry_run: bool,
    files: &[PathBuf],
) -> Vec<FileReport> {
    files
        .iter()
        .map(|path| FileReport {
            path: path.clone(),
            outcome: process_file(tool, mode, dry_run, path),
        })
        .collect()
}
