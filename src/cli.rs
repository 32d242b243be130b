//! Command-line interface shared by `sops-encrypt` and `sops-decrypt`

use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser};
use tracing::{info, warn};

use crate::discovery;
use crate::error::{ErrorCategory, ErrorKind, Result, SopsBatchError};
use crate::logging;
use crate::processor::{self, Mode};
use crate::profile::ProfileSelection;
use crate::summary::RunSummary;
use crate::tool::{self, SecretsTool, SopsCli};

/// Arguments accepted by both entry points.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Project name
    pub project: String,

    /// Environment name
    pub env: String,

    /// AWS profile to use
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    pub profile: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// sops executable, either a name looked up on PATH or a path
    #[arg(long, env = "SOPS_BIN", value_name = "PATH", default_value = tool::DEFAULT_SOPS_PROGRAM)]
    pub sops_bin: PathBuf,

    /// Seconds to wait for sops on each file before giving up on it
    #[arg(
        long,
        env = "SOPS_TIMEOUT",
        value_name = "SECS",
        default_value_t = tool::DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,
}

#[derive(Parser, Debug)]
#[command(name = "sops-encrypt")]
#[command(version)]
#[command(about = "Encrypt configuration files using SOPS and AWS KMS", long_about = None)]
#[command(
    after_help = "Examples:\n  sops-encrypt example dev\n  sops-encrypt -p my-profile example dev\n  sops-encrypt -n example dev"
)]
pub struct EncryptCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Dry run - show what would be encrypted
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
#[command(name = "sops-decrypt")]
#[command(version)]
#[command(about = "Decrypt SOPS-encrypted files in-place", long_about = None)]
#[command(
    after_help = "Examples:\n  sops-decrypt example dev\n  sops-decrypt -p my-profile example dev\n  sops-decrypt -v example dev"
)]
pub struct DecryptCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Runs a whole batch from the current directory and maps the result to an exit code.
///
/// The one-line summary goes to stdout. Fatal errors go to stderr and print no summary.
pub fn run(mode: Mode, args: &CommonArgs, dry_run: bool) -> ExitCode {
    logging::init(args.verbose);

    match execute(mode, args, dry_run, Path::new("")) {
        Ok(summary) => {
            println!("{}", summary);
            summary.exit_code()
        }
        Err(e) => {
            eprintln!("Error: {}", e.chain_message());
            ExitCode::FAILURE
        }
    }
}

/// Pre-flight checks followed by the batch, relative to `root`.
///
/// Every fatal condition is detected before any file is touched.
pub fn execute(mode: Mode, args: &CommonArgs, dry_run: bool, root: &Path) -> Result<RunSummary> {
    validate_component("project", &args.project)?;
    validate_component("env", &args.env)?;

    let profile = ProfileSelection::from_env(args.profile.as_deref());
    let mut sops = SopsCli::locate(
        &args.sops_bin,
        profile.clone(),
        Duration::from_secs(args.timeout),
    )?;
    tool::require_sops_config(root)?;
    profile.log();

    let dir = discovery::target_dir(root, &args.project, &args.env);
    info!("Starting {} process for {}", mode.noun(), dir.display());
    run_batch(&mut sops, mode, dry_run, &dir)
}

/// Discovers candidates under `dir` and processes them with `tool`.
pub fn run_batch(
    tool: &mut dyn SecretsTool,
    mode: Mode,
    dry_run: bool,
    dir: &Path,
) -> Result<RunSummary> {
    let files = discovery::find_candidates(dir)?;
    if files.is_empty() {
        warn!("No candidate files found in {}", dir.display());
    }
    if dry_run {
        info!("DRY RUN MODE - showing what would be {}:", mode.past_tense());
    }

    let reports = processor::process_files(tool, mode, dry_run, &files);
    let summary = RunSummary::from_reports(&reports);
    summary.log_breakdown(mode, dry_run);
    Ok(summary)
}

/// `project` and `env` must each name exactly one directory level.
fn validate_component(name: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SopsBatchError::with_kind(
            ErrorCategory::User,
            ErrorKind::Usage,
            format!("{} must be a single directory name, got {:?}", name, value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::tests::FakeSops;
    use std::fs;
    use tempfile::TempDir;

    fn common(project: &str, env: &str) -> CommonArgs {
        CommonArgs {
            project: project.to_string(),
            env: env.to_string(),
            profile: None,
            verbose: false,
            sops_bin: PathBuf::from(tool::DEFAULT_SOPS_PROGRAM),
            timeout: 30,
        }
    }

    #[test]
    fn test_parse_encrypt_flags() {
        let cli = EncryptCli::try_parse_from([
            "sops-encrypt",
            "-p",
            "my-profile",
            "-n",
            "-v",
            "example",
            "dev",
        ])
        .unwrap();

        assert_eq!(cli.common.project, "example");
        assert_eq!(cli.common.env, "dev");
        assert_eq!(cli.common.profile.as_deref(), Some("my-profile"));
        assert!(cli.common.verbose);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_parse_long_flags() {
        let cli = EncryptCli::try_parse_from([
            "sops-encrypt",
            "--profile",
            "ops",
            "--dry-run",
            "--verbose",
            "--sops-bin",
            "/opt/sops",
            "--timeout",
            "5",
            "example",
            "prod",
        ])
        .unwrap();

        assert_eq!(cli.common.profile.as_deref(), Some("ops"));
        assert!(cli.dry_run);
        assert_eq!(cli.common.sops_bin, PathBuf::from("/opt/sops"));
        assert_eq!(cli.common.timeout, 5);
    }

    #[test]
    fn test_missing_env_is_usage_error() {
        let err = EncryptCli::try_parse_from(["sops-encrypt", "example"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_decrypt_has_no_dry_run() {
        assert!(DecryptCli::try_parse_from(["sops-decrypt", "-n", "example", "dev"]).is_err());
        assert!(DecryptCli::try_parse_from(["sops-decrypt", "-v", "example", "dev"]).is_ok());
    }

    #[test]
    fn test_empty_profile_rejected() {
        assert!(EncryptCli::try_parse_from(["sops-encrypt", "-p", "", "example", "dev"]).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(
            EncryptCli::try_parse_from(["sops-encrypt", "--timeout", "0", "example", "dev"])
                .is_err()
        );
    }

    #[test]
    fn test_validate_component() {
        assert!(validate_component("project", "example").is_ok());
        for bad in ["", ".", "..", "a/b", "/abs"] {
            let err = validate_component("project", bad).unwrap_err();
            assert_eq!(err.kind, Some(ErrorKind::Usage), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_execute_rejects_traversal_before_anything_else() {
        let temp_dir = TempDir::new().unwrap();
        let err = execute(Mode::Encrypt, &common("..", "dev"), false, temp_dir.path()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Usage));
    }

    #[test]
    fn test_execute_missing_tool_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = common("example", "dev");
        args.sops_bin = PathBuf::from("definitely-not-a-real-sops-binary-7f3a");

        let err = execute(Mode::Encrypt, &args, false, temp_dir.path()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::ExternalToolMissing));
    }

    #[test]
    fn test_run_batch_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("example/dev");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("secret.json"), "{\"api_key\": \"hunter2\"}\n").unwrap();
        fs::write(dir.join("notes.txt"), "leave me alone\n").unwrap();

        let mut sops = FakeSops::default();
        let first = run_batch(&mut sops, Mode::Encrypt, false, &dir).unwrap();
        assert_eq!(first.to_string(), "total=1 processed=1 skipped=0 errors=0");

        let second = run_batch(&mut sops, Mode::Encrypt, false, &dir).unwrap();
        assert_eq!(second.to_string(), "total=1 processed=0 skipped=1 errors=0");

        assert_eq!(
            fs::read_to_string(dir.join("notes.txt")).unwrap(),
            "leave me alone\n"
        );
    }

    #[test]
    fn test_run_batch_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut sops = FakeSops::default();
        let err = run_batch(
            &mut sops,
            Mode::Decrypt,
            false,
            &temp_dir.path().join("example/dev"),
        )
        .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::DirectoryNotFound));
        assert!(sops.calls.is_empty());
    }

    #[test]
    fn test_run_batch_empty_directory_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let mut sops = FakeSops::default();
        let summary = run_batch(&mut sops, Mode::Decrypt, false, temp_dir.path()).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.is_success());
    }
}
