//! Filesystem helpers for manifest discovery and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "service.yml";

/// Accepted alias for the manifest file name.
pub const MANIFEST_ALIAS: &str = "service.yaml";

/// Read a manifest file to a UTF-8 string with path context on failure.
pub fn read_manifest(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest at {}", path.display()))
}

/// Find a service manifest by walking up from `start`.
///
/// Checks for `service.yml` (canonical) and `service.yaml` (alias) in each
/// directory from `start` to the filesystem root.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        for name in [MANIFEST_NAME, MANIFEST_ALIAS] {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        dir = current.parent();
    }
    None
}
