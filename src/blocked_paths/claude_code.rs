//! Claude Code `settings.json` scanning (§4.3 step 4): breadth-first from
//! the workspace root down to `max_depth`, `permissions.deny` entries of
//! shape `Read(<pattern>)` become blocked-path rules.

use super::{extract_blocked_path, walk_to_depth, BlockReason, BlockedPath};
use crate::config::ClaudeCodeSettingsConfig;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn read_pattern_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Read\((.+)\)$").unwrap())
}

pub fn scan_claude_code_settings(
    root: &Path,
    cfg: &ClaudeCodeSettingsConfig,
    container_names: &[String],
) -> Vec<BlockedPath> {
    let mut rules = Vec::new();

    for (dir, depth) in walk_to_depth(root, cfg.max_depth) {
        let _ = depth;
        for settings_file in &cfg.settings_files {
            let path = dir.join(settings_file);
            if !path.is_file() {
                continue;
            }
            rules.extend(scan_one_file(&path, container_names));
        }
    }

    rules
}

fn scan_one_file(path: &Path, container_names: &[String]) -> Vec<BlockedPath> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "failed to read Claude Code settings file");
            return Vec::new();
        }
    };
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "failed to parse Claude Code settings as JSON");
            return Vec::new();
        }
    };

    let source = path.display().to_string();
    let mut rules = Vec::new();
    let deny = value
        .get("permissions")
        .and_then(|p| p.get("deny"))
        .and_then(|d| d.as_array())
        .cloned()
        .unwrap_or_default();

    for entry in deny {
        let Some(raw) = entry.as_str() else { continue };
        let Some(cap) = read_pattern_re().captures(raw) else {
            continue;
        };
        let mut pattern_path = cap.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
        if let Some(stripped) = pattern_path.strip_prefix("./") {
            pattern_path = stripped.to_string();
        }
        let (container, pattern) = extract_blocked_path(&pattern_path, container_names);
        rules.push(BlockedPath {
            container,
            pattern,
            reason: BlockReason::ClaudeCodeSettingsDeny,
            source: source.clone(),
            source_line: None,
            original_path: Some(raw.to_string()),
        });
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(dir: &Path, content: &str) {
        std::fs::create_dir_all(dir.join(".claude")).unwrap();
        let mut f = std::fs::File::create(dir.join(".claude/settings.json")).unwrap();
        write!(f, "{content}").unwrap();
    }

    #[test]
    fn deny_read_entries_become_rules() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(
            dir.path(),
            r#"{"permissions":{"deny":["Read(./secrets/*)","Read(.env)"]}}"#,
        );
        let cfg = ClaudeCodeSettingsConfig {
            enabled: true,
            max_depth: 0,
            settings_files: vec![".claude/settings.json".to_string()],
        };
        let rules = scan_claude_code_settings(dir.path(), &cfg, &[]);
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.reason.as_str() == "claude_code_settings_deny"));
        // No container name matches a path component here, so each entry
        // degrades to a global rule keyed on the target's basename.
        assert!(rules.iter().any(|r| r.pattern == "*"));
        assert!(rules.iter().any(|r| r.pattern == ".env"));
    }

    #[test]
    fn allow_entries_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(dir.path(), r#"{"permissions":{"allow":["Read(*)"],"deny":[]}}"#);
        let cfg = ClaudeCodeSettingsConfig {
            enabled: true,
            max_depth: 0,
            settings_files: vec![".claude/settings.json".to_string()],
        };
        let rules = scan_claude_code_settings(dir.path(), &cfg, &[]);
        assert!(rules.is_empty());
    }

    #[test]
    fn respects_max_depth() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        write_settings(&nested, r#"{"permissions":{"deny":["Read(.env)"]}}"#);

        let cfg = ClaudeCodeSettingsConfig {
            enabled: true,
            max_depth: 1,
            settings_files: vec![".claude/settings.json".to_string()],
        };
        assert!(scan_claude_code_settings(dir.path(), &cfg, &[]).is_empty());

        let cfg_deep = ClaudeCodeSettingsConfig { max_depth: 2, ..cfg };
        assert_eq!(scan_claude_code_settings(dir.path(), &cfg_deep, &[]).len(), 1);
    }

    #[test]
    fn skips_dotdirs_and_vendor_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(&dir.path().join("node_modules/pkg"), r#"{"permissions":{"deny":["Read(.env)"]}}"#);
        let cfg = ClaudeCodeSettingsConfig {
            enabled: true,
            max_depth: 5,
            settings_files: vec![".claude/settings.json".to_string()],
        };
        assert!(scan_claude_code_settings(dir.path(), &cfg, &[]).is_empty());
    }
}
