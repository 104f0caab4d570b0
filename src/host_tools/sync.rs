//! Host-tools sync engine (C8): migrates proposed tools from staging into
//! `approved_dir/<project-id>/` after interactive diff/approve.

use crate::error::{DockError, Result};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    New,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct SyncCandidate {
    pub name: String,
    pub staging_path: PathBuf,
    pub approved_path: PathBuf,
    pub status: SyncStatus,
}

/// Abstraction over the interactive approval step so the diff/approve flow
/// is testable without a terminal. The CLI wires a `dialoguer`-backed
/// implementation; tests use a scripted one.
pub trait ApprovalPrompt {
    fn confirm(&mut self, candidate: &SyncCandidate, diff: &str) -> bool;
}

/// Prompts on stdout/stdin via `dialoguer`, showing a unified diff before
/// asking for confirmation.
pub struct InteractivePrompt;

impl ApprovalPrompt for InteractivePrompt {
    fn confirm(&mut self, candidate: &SyncCandidate, diff: &str) -> bool {
        println!("--- {} ---", candidate.name);
        if diff.is_empty() {
            println!("(new file, no existing approved copy)");
        } else {
            print!("{diff}");
        }
        dialoguer::Confirm::new()
            .with_prompt(format!("Promote '{}' to approved?", candidate.name))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Classifies every allowed-extension file under `staging_dir` against
/// `approved_dir` (content byte-for-byte comparison).
pub fn classify(
    staging_dir: &Path,
    approved_dir: &Path,
    allowed_extensions: &[String],
) -> Result<Vec<SyncCandidate>> {
    let mut candidates = Vec::new();

    let entries = match fs::read_dir(staging_dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(candidates),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !entry.metadata()?.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !allowed_extensions.iter().any(|a| a == ext) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let approved_path = approved_dir.join(name);
        let staging_bytes = fs::read(&path)?;
        let status = match fs::read(&approved_path) {
            Ok(approved_bytes) if approved_bytes == staging_bytes => SyncStatus::Unchanged,
            Ok(_) => SyncStatus::Updated,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SyncStatus::New,
            Err(e) => return Err(e.into()),
        };

        candidates.push(SyncCandidate {
            name: name.to_string(),
            staging_path: path,
            approved_path,
            status,
        });
    }

    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(candidates)
}

fn unified_diff(candidate: &SyncCandidate) -> Result<String> {
    let new_content = fs::read_to_string(&candidate.staging_path).unwrap_or_default();
    let old_content = fs::read_to_string(&candidate.approved_path).unwrap_or_default();
    if candidate.status == SyncStatus::New {
        return Ok(String::new());
    }

    let diff = TextDiff::from_lines(&old_content, &new_content);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(sign);
        out.push_str(change.value());
    }
    Ok(out)
}

/// Writes `content` to `approved_path` atomically (temp file + rename in
/// the same directory), preserving the staging copy's executable bit.
fn promote(candidate: &SyncCandidate) -> Result<()> {
    let parent = candidate
        .approved_path
        .parent()
        .ok_or_else(|| DockError::Config("approved path has no parent directory".into()))?;
    fs::create_dir_all(parent)?;

    let content = fs::read(&candidate.staging_path)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    use std::io::Write;
    tmp.write_all(&content)?;
    tmp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::metadata(&candidate.staging_path)?.permissions();
        fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(perms.mode()))?;
    }

    tmp.persist(&candidate.approved_path)
        .map_err(|e| DockError::Io(e.error))?;
    Ok(())
}

/// Runs the full staging -> approved sync for one directory pair, prompting
/// via `prompt` for every NEW/UPDATED candidate. Returns the number of
/// tools successfully promoted.
pub fn sync_tools(
    staging_dir: &Path,
    approved_dir: &Path,
    allowed_extensions: &[String],
    prompt: &mut dyn ApprovalPrompt,
) -> Result<usize> {
    let candidates = classify(staging_dir, approved_dir, allowed_extensions)?;
    let mut synced = 0;

    for candidate in &candidates {
        if candidate.status == SyncStatus::Unchanged {
            continue;
        }
        let diff = unified_diff(candidate)?;
        if prompt.confirm(candidate, &diff) {
            promote(candidate)?;
            synced += 1;
        }
    }

    Ok(synced)
}
