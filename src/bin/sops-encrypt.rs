//! Encrypts every plaintext configuration file under `{project}/{env}/`.

use std::process::ExitCode;

use clap::Parser;

use sopsbatch::cli::{self, EncryptCli};
use sopsbatch::processor::Mode;

fn main() -> ExitCode {
    let cli = EncryptCli::parse();
    cli::run(Mode::Encrypt, &cli.common, cli.dry_run)
}
