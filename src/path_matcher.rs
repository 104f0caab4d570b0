//! Path matcher (C1): decides whether a path matches a blocked-paths pattern.
//!
//! Rules are tried in order and short-circuited on the first hit. Never
//! panics; an invalid glob is treated as a non-match rather than an error,
//! since callers need a boolean verdict, not a parse failure.

use glob::Pattern;

/// Normalises a path string to a clean comparable form: collapses leading
/// `./`, and strips a trailing `/` unless the whole thing is just `/`.
fn normalise(path: &str) -> String {
    let mut p = path.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    if p.len() > 1 && p.ends_with('/') {
        p = &p[..p.len() - 1];
    }
    p.to_string()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `matchPath(path, pattern) -> bool` per spec §4.1.
pub fn match_path(path: &str, pattern: &str) -> bool {
    let path = normalise(path);
    let pattern = normalise(pattern);

    // 2. Exact match.
    if path == pattern {
        return true;
    }

    // 3. Basename match: pattern has no `/`. A pattern that is a single
    // leading `/` followed by one segment (no other `/`) is also treated
    // as a basename pattern: the blocked-paths engine's auto-import
    // extraction (§4.3 step 3) emits absolute single-segment patterns like
    // `/.env` for a file sitting directly at a container's mount root, and
    // those are meant to match regardless of where that root is mounted
    // inside the container, exactly like a bare `.env` pattern would.
    let basename_pattern = pattern.strip_prefix('/').filter(|rest| !rest.contains('/'));
    if !pattern.contains('/') || basename_pattern.is_some() {
        let candidate = basename_pattern.unwrap_or(pattern.as_str());
        let base = basename(&path);
        if base == candidate {
            return true;
        }
        if candidate.contains('*') {
            if let Ok(glob_pattern) = Pattern::new(candidate) {
                if glob_pattern.matches(base) {
                    return true;
                }
            }
        }
        // A bare-name pattern with no wildcard and no match on basename
        // still falls through to the generic glob fallback below, in case
        // the pattern is meant to match mid-path components via glob (e.g.
        // `*` itself, or a pattern containing `?`).
    }

    // 4. Directory pattern: pattern ends with `/*`.
    if let Some(dir) = pattern.strip_suffix("/*") {
        let boundary_prefix = format!("{dir}/");
        let mid_marker = format!("/{dir}/");
        if path.starts_with(&boundary_prefix) || path.contains(&mid_marker) {
            return true;
        }
    }

    // 5. Fallback: full shell-glob of path against pattern.
    if let Ok(glob_pattern) = Pattern::new(&pattern) {
        if glob_pattern.matches(&path) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(match_path("/app/.env", "/app/.env"));
    }

    #[test]
    fn basename_match_plain() {
        assert!(match_path("/app/.env", ".env"));
        assert!(match_path("/app/sub/.env", ".env"));
    }

    #[test]
    fn basename_match_glob() {
        assert!(match_path("/app/secret.pem", "*.pem"));
        assert!(!match_path("/app/secret.key", "*.pem"));
    }

    #[test]
    fn absolute_single_segment_pattern_matches_as_basename() {
        // S6: a container-root-relative extraction like "/.env" must still
        // catch the file wherever it's mounted inside the container.
        assert!(match_path("/app/.env", "/.env"));
        assert!(match_path("/workspace/project/.env", "/.env"));
        // A pattern with more than one segment after the leading `/` is
        // NOT basename-matched; it falls through to the anchored rules.
        assert!(!match_path("/app/sub/.env", "/sub2/.env"));
    }

    #[test]
    fn directory_pattern_is_boundary_anchored() {
        // S1: must NOT match via naive substring search.
        assert!(!match_path("/mysecrets/key.pem", "secrets/*"));
        assert!(match_path("/data/secrets/key.pem", "secrets/*"));
        assert!(match_path("secrets/key.pem", "secrets/*"));
    }

    #[test]
    fn fallback_glob() {
        assert!(match_path("/workspace/demo/config.json", "/workspace/*/config.json"));
    }

    #[test]
    fn never_panics_on_bad_pattern() {
        assert!(!match_path("/a/b", "["));
    }

    #[test]
    fn normalises_trailing_and_dot_slash() {
        assert!(match_path("./app/.env/", "app/.env"));
    }

    #[test]
    fn deterministic_repeat_calls() {
        let a = match_path("/data/secrets/key.pem", "secrets/*");
        let b = match_path("/data/secrets/key.pem", "secrets/*");
        assert_eq!(a, b);
    }
}
