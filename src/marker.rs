//! SOPS metadata marker detection
//!
//! Decides whether a file already carries SOPS metadata by scanning its text
//! for the keys sops embeds on encryption. This is a heuristic: unusual
//! formatting can produce false negatives, and a plaintext file that happens
//! to contain one of the patterns is reported as encrypted. sops itself is
//! never consulted.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::RegexSet;
use tracing::warn;

static SOPS_MARKERS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?m)^sops:",     // YAML: top-level `sops:` key
        r#""sops":"#,      // JSON: "sops" object
        r"(?m)^sops_",     // dotenv: sops_* metadata lines
        r"sops_version=",  // dotenv
        r"sops_mac=",      // dotenv
    ])
    .expect("static sops marker patterns are valid")
});

/// Returns true if `content` contains any known SOPS metadata marker.
///
/// Every pattern is applied regardless of the file's extension.
pub fn has_sops_marker(content: &str) -> bool {
    SOPS_MARKERS.is_match(content)
}

/// Reads `path` and reports whether it carries a SOPS marker.
///
/// Invalid UTF-8 is replaced rather than rejected. A file that cannot be read
/// is logged and treated as unmarked.
pub fn file_has_sops_marker(path: &Path) -> bool {
    match fs::read(path) {
        Ok(bytes) => has_sops_marker(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!("Cannot read file {}: {}", path.display(), e);
            false
        }
    }
}
