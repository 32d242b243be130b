//! Decrypts every SOPS-encrypted configuration file under `{project}/{env}/`.

use std::process::ExitCode;

use clap::Parser;

use sopsbatch::cli::{self, DecryptCli};
use sopsbatch::processor::Mode;

fn main() -> ExitCode {
    let cli = DecryptCli::parse();
    cli::run(Mode::Decrypt, &cli.common, false)
}
