//! Deterministic project identifier derived from an absolute workspace root
//! path, used as the subdirectory name under `approved_dir/` in secure
//! host-tools mode (C7). Must be stable across invocations for the same
//! path and distinguish siblings — so it is a straight content hash of the
//! canonicalised absolute path, not anything derived from mtimes or inode
//! numbers.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Length, in hex characters, of the identifier. 16 hex chars (64 bits) is
/// ample collision resistance for the number of workspace roots a single
/// developer machine will ever see, while keeping directory names short.
const PROJECT_ID_LEN: usize = 16;

/// Computes the project identifier for `workspace_root`.
///
/// The path is canonicalised when possible (resolving symlinks and `..`)
/// so that two different spellings of the same directory hash to the same
/// id; if canonicalisation fails (path doesn't exist yet), the path is used
/// as given.
pub fn project_id(workspace_root: &Path) -> String {
    let abs = workspace_root
        .canonicalize()
        .unwrap_or_else(|_| workspace_root.to_path_buf());

    let mut hasher = Sha256::new();
    hasher.update(abs.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..PROJECT_ID_LEN].to_string()
}
