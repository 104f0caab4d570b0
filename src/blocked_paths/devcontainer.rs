//! `devcontainer.json` scanning (§4.3 step 3). DevContainer files routinely
//! carry `//` comments, which is why the spec calls for a text-scan rather
//! than a structured JSON parse here.

use super::{extract_blocked_path, BlockReason, BlockedPath};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn dev_null_mount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"source=/dev/null[^,\s\"]*,[^\"]*?target=([^,\s\"]+)").unwrap())
}

fn tmpfs_or_volume_mount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"type=(tmpfs|volume)[^,\s\"]*,[^\"]*?target=([^,\s\"]+)").unwrap()
    })
}

pub fn scan_devcontainer_file(path: &Path, container_names: &[String]) -> crate::error::Result<Vec<BlockedPath>> {
    let content = std::fs::read_to_string(path)?;
    let source = path.display().to_string();
    let mut rules = Vec::new();

    for cap in dev_null_mount_re().captures_iter(&content) {
        let target = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let (container, pattern) = extract_blocked_path(target, container_names);
        rules.push(BlockedPath {
            container,
            pattern,
            reason: BlockReason::DevcontainerBindMount,
            source: source.clone(),
            source_line: None,
            original_path: Some(target.to_string()),
        });
    }

    for cap in tmpfs_or_volume_mount_re().captures_iter(&content) {
        let kind = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let target = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
        let (container, pattern) = extract_blocked_path(target, container_names);
        let reason = if kind == "tmpfs" {
            BlockReason::DevcontainerTmpfsMount
        } else {
            BlockReason::DevcontainerBindMount
        };
        rules.push(BlockedPath {
            container,
            pattern,
            reason,
            source: source.clone(),
            source_line: None,
            original_path: Some(target.to_string()),
        });
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dev_null_bind_mount_is_found() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"mounts": ["source=/dev/null,target=/workspace/demo/web/.env,type=bind"]}}"#
        )
        .unwrap();
        let rules = scan_devcontainer_file(file.path(), &["web".to_string()]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].reason.as_str(), "devcontainer_bind_mount");
        assert_eq!(rules[0].container, "web");
        assert_eq!(rules[0].pattern, "/.env");
    }

    #[test]
    fn tmpfs_type_mount_is_found() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"mounts": ["type=tmpfs,target=/tmp/scratch"]}}"#
        )
        .unwrap();
        let rules = scan_devcontainer_file(file.path(), &[]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].reason.as_str(), "devcontainer_tmpfs_mount");
    }

    #[test]
    fn volume_type_mount_is_found() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"mounts": ["type=volume,source=myvol,target=/workspace/demo/db/data"]}}"#
        )
        .unwrap();
        let rules = scan_devcontainer_file(file.path(), &["db".to_string()]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].reason.as_str(), "devcontainer_bind_mount");
        assert_eq!(rules[0].pattern, "/data");
    }
}
