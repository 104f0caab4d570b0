//! Output masker (C4): regex-based redaction for logs/exec/inspect output,
//! plus a distinct host-path masking routine applied to any string bound
//! for the client.

use crate::config::OutputMaskingConfig;
use regex::Regex;
use std::sync::RwLock;

/// A compiled masking pattern set. Construction never fails outright: an
/// invalid regex is logged and dropped so that one bad pattern in config
/// cannot disable the others.
pub struct OutputMasker {
    enabled: bool,
    replacement: String,
    apply_to_logs: bool,
    apply_to_exec: bool,
    apply_to_inspect: bool,
    patterns: RwLock<Vec<Regex>>,
}

impl OutputMasker {
    pub fn new(cfg: &OutputMaskingConfig) -> Self {
        let mut compiled = Vec::with_capacity(cfg.patterns.len());
        for pattern in &cfg.patterns {
            match Regex::new(pattern) {
                Ok(re) => compiled.push(re),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "skipping invalid output-masking pattern");
                }
            }
        }
        Self {
            enabled: cfg.enabled,
            replacement: cfg.replacement.clone(),
            apply_to_logs: cfg.apply_to.logs,
            apply_to_exec: cfg.apply_to.exec,
            apply_to_inspect: cfg.apply_to.inspect,
            patterns: RwLock::new(compiled),
        }
    }

    /// Adds a pattern at runtime. Returns an error if the regex is invalid;
    /// existing patterns are untouched either way.
    pub fn add_pattern(&self, pattern: &str) -> Result<(), regex::Error> {
        let re = Regex::new(pattern)?;
        self.patterns.write().unwrap().push(re);
        Ok(())
    }

    /// Applies every compiled pattern, in compile order, replacing each
    /// non-overlapping match with the configured replacement string.
    pub fn mask_output(&self, s: &str) -> String {
        if !self.enabled {
            return s.to_string();
        }
        let patterns = self.patterns.read().unwrap();
        if patterns.is_empty() {
            return s.to_string();
        }
        let mut out = s.to_string();
        for re in patterns.iter() {
            out = re.replace_all(&out, self.replacement.as_str()).into_owned();
        }
        out
    }

    pub fn mask_logs(&self, s: &str) -> String {
        if self.apply_to_logs {
            self.mask_output(s)
        } else {
            s.to_string()
        }
    }

    pub fn mask_exec(&self, s: &str) -> String {
        if self.apply_to_exec {
            self.mask_output(s)
        } else {
            s.to_string()
        }
    }

    /// Masks an `inspect` JSON payload by round-tripping through
    /// `serde_json::Value` so path-bearing fields nested arbitrarily deep
    /// are covered, not just the top-level string.
    pub fn mask_inspect(&self, s: &str) -> String {
        if !self.apply_to_inspect {
            return s.to_string();
        }
        match serde_json::from_str::<serde_json::Value>(s) {
            Ok(value) => {
                let masked = self.mask_json_value(value);
                serde_json::to_string(&masked).unwrap_or_else(|_| self.mask_output(s))
            }
            Err(_) => self.mask_output(s),
        }
    }

    fn mask_json_value(&self, value: serde_json::Value) -> serde_json::Value {
        use serde_json::Value;
        match value {
            Value::String(s) => Value::String(self.mask_output(&s)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.mask_json_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, self.mask_json_value(v)))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Windows home-directory prefixes, which must be masked before the Unix
/// ones below so `C:/Users/...` isn't partially matched by `/Users/`.
const WINDOWS_HOME_PREFIXES: &[&str] = &[
    r"C:\Users\", r"c:\Users\", r"D:\Users\", r"d:\Users\",
    "C:/Users/", "c:/Users/", "D:/Users/", "d:/Users/",
];

/// `/c/Users/` and `/C/Users/` (WSL-style Windows drive mounts) must be
/// masked before the plain `/Users/` prefix below, since `/Users/` is a
/// substring of both and would otherwise leak the `/c` segment.
const UNIX_HOME_PREFIXES: &[&str] = &["/c/Users/", "/C/Users/", "/Users/", "/home/"];

const TERMINATORS: &[char] = &[' ', '\t', '\n', ',', '"', '\'', ']', '}'];

/// Masks every absolute home-directory path in `s`, replacing
/// `prefix + username` with `replacement`. Idempotent: masking an
/// already-masked string is a no-op because the replacement text never
/// itself contains a recognised home prefix.
pub fn mask_host_paths(s: &str, replacement: &str) -> String {
    let mut result = s.to_string();
    for prefix in WINDOWS_HOME_PREFIXES {
        result = mask_prefix(&result, prefix, replacement, &['\\', '/']);
    }
    for prefix in UNIX_HOME_PREFIXES {
        result = mask_prefix(&result, prefix, replacement, &['/']);
    }
    result
}

fn mask_prefix(s: &str, prefix: &str, replacement: &str, separators: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find(prefix) {
        out.push_str(&rest[..idx]);
        let after_prefix = &rest[idx + prefix.len()..];
        let end = after_prefix
            .char_indices()
            .find(|(_, c)| separators.contains(c) || TERMINATORS.contains(c))
            .map(|(i, _)| i)
            .unwrap_or(after_prefix.len());
        out.push_str(replacement);
        rest = &after_prefix[end..];
    }
    out.push_str(rest);
    out
}
