//! The external sops tool
//!
//! [`SecretsTool`] is the seam between the batch logic and whatever rewrites
//! files in place. [`SopsCli`] is the real implementation and shells out to
//! the sops binary once per file.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{ErrorCategory, ErrorKind, Result, SopsBatchError};
use crate::processor::Mode;
use crate::profile::ProfileSelection;

/// Name of the sops configuration file that must sit at the invocation root.
pub const SOPS_CONFIG_FILE: &str = ".sops.yaml";

/// Executable looked up on `PATH` when no explicit binary is configured.
pub const DEFAULT_SOPS_PROGRAM: &str = "sops";

/// Per-file timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long to keep collecting stderr after sops has exited unsuccessfully.
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// Something that can encrypt or decrypt a file in place.
pub trait SecretsTool {
    /// Rewrites `path` in place according to `mode`.
    ///
    /// An error leaves the file in whatever state the tool left it; callers
    /// record the failure and move on.
    fn run_in_place(&mut self, mode: Mode, path: &Path) -> Result<()>;
}

/// Runs the sops binary as a subprocess: `sops -e -i <file>` / `sops -d -i <file>`.
#[derive(Debug)]
pub struct SopsCli {
    program: PathBuf,
    profile: ProfileSelection,
    timeout: Duration,
}

impl SopsCli {
    /// Resolves `program` (a bare name searched on `PATH`, or a path) to an
    /// executable.
    ///
    /// Fails with [`ErrorKind::ExternalToolMissing`] if nothing executable is found.
    pub fn locate(program: &Path, profile: ProfileSelection, timeout: Duration) -> Result<Self> {
        let resolved = which::which(program).map_err(|e| {
            SopsBatchError::with_kind_and_source(
                ErrorCategory::Environment,
                ErrorKind::ExternalToolMissing,
                format!(
                    "{} command not found. Please install sops first (e.g. brew install sops)",
                    program.display()
                ),
                e,
            )
        })?;
        debug!("Using sops binary: {}", resolved.display());

        Ok(Self {
            program: resolved,
            profile,
            timeout,
        })
    }

    /// The resolved executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, mode: Mode, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(mode.sops_flag())
            .arg("-i")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        self.profile.apply(&mut cmd);
        cmd
    }
}

impl SecretsTool for SopsCli {
    fn run_in_place(&mut self, mode: Mode, path: &Path) -> Result<()> {
        let mut child = self.command(mode, path).spawn().map_err(|e| {
            SopsBatchError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to start {}", self.program.display()),
                e,
            )
        })?;

        // Drain stderr concurrently so a chatty sops cannot fill the pipe and stall.
        // Grandchildren (gpg, wrapper scripts) may keep the pipe open after sops
        // exits, so the reader is never joined; its result is awaited with a bound.
        let stderr_rx = child.stderr.take().map(|mut stderr| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let mut buf = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut buf) {
                    debug!("Failed to read sops stderr: {}", e);
                }
                let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
            });
            rx
        });

        match wait_with_deadline(&mut child, self.timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => {
                let stderr = stderr_rx
                    .and_then(|rx| rx.recv_timeout(STDERR_GRACE).ok())
                    .unwrap_or_default();
                Err(SopsBatchError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::ToolFailed,
                    failure_message(status, stderr.trim()),
                ))
            }
            None => Err(SopsBatchError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::ToolTimeout,
                format!("sops timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }
}

/// Checks that `.sops.yaml` exists in `root`.
///
/// The file is only checked for presence; sops reads it itself.
pub fn require_sops_config(root: &Path) -> Result<()> {
    if root.join(SOPS_CONFIG_FILE).is_file() {
        Ok(())
    } else {
        Err(SopsBatchError::with_kind(
            ErrorCategory::Environment,
            ErrorKind::ConfigMissing,
            format!("{} not found in {}", SOPS_CONFIG_FILE, describe_dir(root)),
        ))
    }
}

fn describe_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        "current directory".to_string()
    } else {
        dir.display().to_string()
    }
}

/// Waits for `child` to exit, killing it once `timeout` has elapsed.
///
/// Returns `None` if the child had to be killed. A timeout too large to
/// represent as an [`Instant`] means no deadline.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        let polled = match child.try_wait() {
            Ok(polled) => polled,
            Err(e) => {
                reap(child);
                return Err(SopsBatchError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to wait for sops",
                    e,
                ));
            }
        };
        if let Some(status) = polled {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            reap(child);
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills `child` and collects its exit status so no zombie is left behind.
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Failed to kill sops: {}", e);
    }
    let _ = child.wait();
}

fn failure_message(status: ExitStatus, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("sops exited with {}", status)
    } else {
        format!("sops exited with {}: {}", status, stderr)
    }
}
