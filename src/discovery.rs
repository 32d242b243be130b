//! Candidate file discovery under a `{project}/{env}` directory

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ErrorCategory, ErrorKind, Result, SopsBatchError};

/// File name suffixes that sops is run against. Matching is case-sensitive.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".yaml", ".yml", ".json", ".env"];

/// Resolves the directory a run operates on: `{project}/{env}` relative to `root`.
pub fn target_dir(root: &Path, project: &str, env: &str) -> PathBuf {
    root.join(project).join(env)
}

/// Returns true if the file name ends with one of [`SUPPORTED_EXTENSIONS`].
pub fn is_candidate_name(file_name: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(ext))
}

/// Walks `dir` recursively and returns every candidate file, sorted by path.
///
/// Fails with [`ErrorKind::DirectoryNotFound`] if `dir` is missing or is not a
/// directory. Files with other extensions are skipped without comment.
pub fn find_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SopsBatchError::with_kind(
            ErrorCategory::User,
            ErrorKind::DirectoryNotFound,
            format!("Directory {} does not exist", dir.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };

        let Some(name) = entry.file_name().to_str() else {
            debug!("Skipping non UTF-8 file name: {}", entry.path().display());
            continue;
        };
        if is_candidate_name(name) && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
