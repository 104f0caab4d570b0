//! Whitelist matching (§4.5, §4.6): shared between the container policy's
//! moderate-exec whitelist and the host-command policy's whitelist/deny
//! lists. Deliberately simpler than a full glob — exact match, or
//! prefix-match up to the first `*`.

/// Matches `command` (already trimmed by the caller) against one pattern
/// in the whitelist-matching pattern language.
pub fn pattern_matches(command: &str, pattern: &str) -> bool {
    let trimmed = command.trim();
    if pattern == trimmed {
        return true;
    }
    if let Some(prefix) = pattern.split('*').next() {
        if pattern.contains('*') && !prefix.is_empty() {
            return trimmed.starts_with(prefix);
        }
        // A pattern starting with `*` (empty prefix), e.g. "*foo", falls
        // through to "no match" here rather than degrading to match-all;
        // only a bare "*" matches everything. Narrower than a literal
        // reading of the prefix rule, but the safe direction for an
        // allowlist, so kept as is.
        if pattern == "*" {
            return true;
        }
    }
    false
}

/// True if `command` matches any pattern in `patterns`.
pub fn any_pattern_matches(command: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| pattern_matches(command, p))
}
