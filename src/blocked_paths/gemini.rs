//! Gemini `.aiexclude` / `.geminiignore` scanning (§4.3 step 5):
//! gitignore-style line parsing, minus negation support. All rules are
//! global (`container == "*"`).

use super::{walk_to_depth, BlockReason, BlockedPath, ALL_CONTAINERS};
use crate::config::GeminiSettingsConfig;
use std::path::Path;

pub fn scan_gemini_settings(root: &Path, cfg: &GeminiSettingsConfig) -> Vec<BlockedPath> {
    let mut rules = Vec::new();

    for (dir, _depth) in walk_to_depth(root, cfg.max_depth) {
        for settings_file in &cfg.settings_files {
            let path = dir.join(settings_file);
            if !path.is_file() {
                continue;
            }
            rules.extend(scan_one_file(&path));
        }
    }

    rules
}

fn scan_one_file(path: &Path) -> Vec<BlockedPath> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "failed to read Gemini exclude file");
            return Vec::new();
        }
    };

    let source = path.display().to_string();
    let mut rules = Vec::new();

    for (line_no, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(negated) = line.strip_prefix('!') {
            tracing::debug!(file = %source, pattern = %negated, "skipping unsupported negated gemini exclude entry");
            continue;
        }

        let mut pattern = line.to_string();
        if let Some(stripped) = pattern.strip_suffix('/') {
            pattern = format!("{stripped}/*");
        }
        if let Some(stripped) = pattern.strip_prefix('/') {
            pattern = stripped.to_string();
        }

        rules.push(BlockedPath {
            container: ALL_CONTAINERS.to_string(),
            pattern,
            reason: BlockReason::GeminiExcludeFile,
            source: source.clone(),
            source_line: Some(line_no as u32 + 1),
            original_path: Some(raw_line.to_string()),
        });
    }

    rules
}
