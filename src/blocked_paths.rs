//! Blocked-paths engine (C3): ingests rules from manual config, global
//! patterns, and auto-imported scans of Docker Compose, DevContainer,
//! Claude Code, and Gemini configuration, then answers per-container path
//! queries. Loading is one-shot and deterministic; once loaded, the rule
//! set is immutable for the process lifetime (spec §3 invariant 1).

mod claude_code;
mod compose;
mod devcontainer;
mod gemini;

pub use claude_code::scan_claude_code_settings;
pub use gemini::scan_gemini_settings;

use crate::config::BlockedPathsConfig;
use crate::path_matcher::match_path;
use std::path::Path;

/// Why a rule was emitted, carried through to the caller so error messages
/// can name the originating reason (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    ManualBlock,
    GlobalPattern,
    VolumeMountToDevNull,
    TmpfsMount,
    DevcontainerBindMount,
    DevcontainerTmpfsMount,
    ClaudeCodeSettingsDeny,
    GeminiExcludeFile,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::ManualBlock => "manual_block",
            BlockReason::GlobalPattern => "global_pattern",
            BlockReason::VolumeMountToDevNull => "volume_mount_to_dev_null",
            BlockReason::TmpfsMount => "tmpfs_mount",
            BlockReason::DevcontainerBindMount => "devcontainer_bind_mount",
            BlockReason::DevcontainerTmpfsMount => "devcontainer_tmpfs_mount",
            BlockReason::ClaudeCodeSettingsDeny => "claude_code_settings_deny",
            BlockReason::GeminiExcludeFile => "gemini_exclude_file",
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"*"` means "every container".
pub const ALL_CONTAINERS: &str = "*";

#[derive(Debug, Clone)]
pub struct BlockedPath {
    pub container: String,
    pub pattern: String,
    pub reason: BlockReason,
    pub source: String,
    pub source_line: Option<u32>,
    pub original_path: Option<String>,
}

impl BlockedPath {
    fn new(container: impl Into<String>, pattern: impl Into<String>, reason: BlockReason, source: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            pattern: pattern.into(),
            reason,
            source: source.into(),
            source_line: None,
            original_path: None,
        }
    }
}

/// Determines whether `container_name` matches a known container by
/// equality or by treating the known name as a glob pattern, per the
/// target-to-rule conversion rule in spec §4.3 step 3.
fn container_component_matches(component: &str, known: &str) -> bool {
    if component == known {
        return true;
    }
    if known.contains('*') {
        if let Ok(pattern) = glob::Pattern::new(known) {
            return pattern.matches(component);
        }
    }
    false
}

/// Walks an absolute target path left to right; the first component that
/// equals (or glob-matches) a known container name determines the
/// container, and the remainder becomes the pattern. If no component
/// matches, degrades to a global rule keyed on the target's basename.
pub fn extract_blocked_path(target_path: &str, container_names: &[String]) -> (String, String) {
    let trimmed = target_path.trim_start_matches('/');
    let components: Vec<&str> = trimmed.split('/').filter(|c| !c.is_empty()).collect();

    for (idx, component) in components.iter().enumerate() {
        if let Some(name) = container_names.iter().find(|n| container_component_matches(component, n)) {
            let remainder = components[idx + 1..].join("/");
            let pattern = if remainder.is_empty() {
                "/".to_string()
            } else {
                format!("/{remainder}")
            };
            return (name.clone(), pattern);
        }
    }

    let basename = components.last().copied().unwrap_or(target_path);
    (ALL_CONTAINERS.to_string(), basename.to_string())
}

pub struct BlockedPathsEngine {
    rules: Vec<BlockedPath>,
}

impl BlockedPathsEngine {
    /// Loads all rule sources additively, in the order specified by §4.3:
    /// manual, global patterns, then auto-import (compose, devcontainer,
    /// Claude Code settings, Gemini excludes).
    pub fn load(container_names: &[String], cfg: &BlockedPathsConfig) -> Self {
        let mut rules = Vec::new();

        for (container, patterns) in &cfg.manual {
            for pattern in patterns {
                rules.push(BlockedPath::new(container.clone(), pattern.clone(), BlockReason::ManualBlock, "config"));
            }
        }

        for pattern in &cfg.auto_import.global_patterns {
            rules.push(BlockedPath::new(ALL_CONTAINERS, pattern.clone(), BlockReason::GlobalPattern, "config"));
        }

        if cfg.auto_import.enabled {
            if let Some(root) = &cfg.auto_import.workspace_root {
                for scan_file in &cfg.auto_import.scan_files {
                    let path = root.join(scan_file);
                    if !path.exists() {
                        continue;
                    }
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if name == "docker-compose.yml" || name == "docker-compose.yaml" {
                        match compose::scan_compose_file(&path, container_names) {
                            Ok(found) => rules.extend(found),
                            Err(e) => tracing::warn!(file = %path.display(), error = %e, "failed to scan docker-compose file"),
                        }
                    } else if name == "devcontainer.json" {
                        match devcontainer::scan_devcontainer_file(&path, container_names) {
                            Ok(found) => rules.extend(found),
                            Err(e) => tracing::warn!(file = %path.display(), error = %e, "failed to scan devcontainer.json"),
                        }
                    }
                }

                if cfg.auto_import.claude_code_settings.enabled {
                    rules.extend(claude_code::scan_claude_code_settings(
                        root,
                        &cfg.auto_import.claude_code_settings,
                        container_names,
                    ));
                }

                if cfg.auto_import.gemini_settings.enabled {
                    rules.extend(gemini::scan_gemini_settings(
                        root,
                        &cfg.auto_import.gemini_settings,
                    ));
                }
            }
        }

        Self { rules }
    }

    /// `isBlocked(container, path)`: returns the first matching rule in
    /// load order, or `None`.
    pub fn is_blocked(&self, container: &str, path: &str) -> Option<&BlockedPath> {
        self.rules.iter().find(|rule| {
            (rule.container == ALL_CONTAINERS || rule.container == container) && match_path(path, &rule.pattern)
        })
    }

    /// All rules applying to `container` (global or exact).
    pub fn for_container(&self, container: &str) -> Vec<&BlockedPath> {
        self.rules
            .iter()
            .filter(|rule| rule.container == ALL_CONTAINERS || rule.container == container)
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Breadth-first directory walk from `root` down to `max_depth` (0 = root
/// only), skipping dotfile directories and well-known dependency/vendor
/// directories, used by both the Claude Code and Gemini scanners.
pub(crate) fn walk_to_depth(root: &Path, max_depth: u32) -> Vec<(std::path::PathBuf, u32)> {
    const SKIP_DIRS: &[&str] = &["node_modules", "vendor", "__pycache__"];
    let mut result = Vec::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back((root.to_path_buf(), 0u32));

    while let Some((dir, depth)) = queue.pop_front() {
        result.push((dir.clone(), depth));
        if depth >= max_depth {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            queue.push_back((path, depth + 1));
        }
    }

    result
}
