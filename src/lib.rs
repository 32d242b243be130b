//! sopsbatch - encrypt or decrypt a project's configuration files in place with SOPS
//!
//! Files under `{project}/{env}/` ending in `.yaml`, `.yml`, `.json` or `.env`
//! are checked for SOPS metadata and handed to the sops binary one at a time.

#![forbid(unsafe_code)]

pub mod cli;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod marker;
pub mod processor;
pub mod profile;
pub mod summary;
pub mod tool;
