//! Docker Compose YAML scanning for the blocked-paths auto-import (§4.3
//! step 3): `/dev/null` bind mounts and `tmpfs` entries become blocked-path
//! rules on the service's target path.

use super::{extract_blocked_path, BlockReason, BlockedPath};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: HashMap<String, ComposeService>,
}

#[derive(Debug, Default, Deserialize)]
struct ComposeService {
    #[serde(default)]
    volumes: Vec<String>,
    #[serde(default)]
    tmpfs: TmpfsEntries,
}

/// `tmpfs:` may be a single string or a list in Compose; accept both.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum TmpfsEntries {
    #[default]
    None,
    Single(String),
    List(Vec<String>),
}

impl TmpfsEntries {
    fn into_vec(self) -> Vec<String> {
        match self {
            TmpfsEntries::None => Vec::new(),
            TmpfsEntries::Single(s) => vec![s],
            TmpfsEntries::List(v) => v,
        }
    }
}

pub fn scan_compose_file(path: &Path, container_names: &[String]) -> crate::error::Result<Vec<BlockedPath>> {
    let content = std::fs::read_to_string(path)?;
    let parsed: ComposeFile = serde_yaml::from_str(&content)?;
    let source = path.display().to_string();
    let mut rules = Vec::new();

    for service in parsed.services.into_values() {
        for volume in &service.volumes {
            if let Some(target) = volume.strip_prefix("/dev/null:") {
                let target = target.split(':').next().unwrap_or(target);
                let (container, pattern) = extract_blocked_path(target, container_names);
                rules.push(BlockedPath {
                    container,
                    pattern,
                    reason: BlockReason::VolumeMountToDevNull,
                    source: source.clone(),
                    source_line: None,
                    original_path: Some(target.to_string()),
                });
            }
        }

        for tmpfs in service.tmpfs.into_vec() {
            let field = tmpfs.split(':').next().unwrap_or(&tmpfs);
            let (container, pattern) = extract_blocked_path(field, container_names);
            rules.push(BlockedPath {
                container,
                pattern,
                reason: BlockReason::TmpfsMount,
                source: source.clone(),
                source_line: None,
                original_path: Some(field.to_string()),
            });
        }
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dev_null_mount_becomes_blocked_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "services:\n  securenote-api:\n    volumes:\n      - \"/dev/null:/workspace/demo/securenote-api/.env:ro\"\n"
        )
        .unwrap();

        let rules = scan_compose_file(file.path(), &["securenote-api".to_string()]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "/.env");
        assert_eq!(rules[0].reason.as_str(), "volume_mount_to_dev_null");
    }

    #[test]
    fn tmpfs_entry_becomes_blocked_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services:\n  demo:\n    tmpfs:\n      - /run:size=64m\n").unwrap();

        let rules = scan_compose_file(file.path(), &["demo".to_string()]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].reason.as_str(), "tmpfs_mount");
        // "/run" carries no container-name component, so it degrades to a
        // global rule keyed on the basename, per the extraction rule.
        assert_eq!(rules[0].container, super::super::ALL_CONTAINERS);
        assert_eq!(rules[0].pattern, "run");
    }

    #[test]
    fn service_with_no_special_volumes_yields_nothing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services:\n  demo:\n    volumes:\n      - data:/var/lib/data\n").unwrap();
        let rules = scan_compose_file(file.path(), &["demo".to_string()]).unwrap();
        assert!(rules.is_empty());
    }
}
