//! Container policy (C5): access control, permission gates, and
//! whitelist/dangerous exec decisions for Docker container operations.

use crate::blocked_paths::BlockedPathsEngine;
use crate::config::{SecurityConfig, SecurityMode};
use crate::error::{DockError, Result};
use crate::tokenizer;
use crate::whitelist;
use glob::Pattern;
use std::sync::RwLock;

/// Shell metacharacters that must be absent from a dangerous-mode command
/// string (§4.5).
const UNSAFE_METACHARS: &[char] = &['|', '>', '<', ';', '&', '`', '\n'];

pub struct ContainerPolicy {
    config: RwLock<SecurityConfig>,
    blocked_paths: BlockedPathsEngine,
}

impl ContainerPolicy {
    pub fn new(config: SecurityConfig, blocked_paths: BlockedPathsEngine) -> Self {
        Self {
            config: RwLock::new(config),
            blocked_paths,
        }
    }

    fn cfg(&self) -> std::sync::RwLockReadGuard<'_, SecurityConfig> {
        self.config.read().unwrap()
    }

    /// `canAccess(container)`: allowed-containers empty, or name matches
    /// any glob pattern in it.
    pub fn can_access(&self, container: &str) -> bool {
        let cfg = self.cfg();
        if cfg.allowed_containers.is_empty() {
            return true;
        }
        cfg.allowed_containers.iter().any(|pattern| {
            pattern == container
                || Pattern::new(pattern)
                    .map(|p| p.matches(container))
                    .unwrap_or(false)
        })
    }

    pub fn can_get_logs(&self) -> bool {
        self.cfg().permissions.logs
    }

    pub fn can_inspect(&self) -> bool {
        self.cfg().permissions.inspect
    }

    pub fn can_get_stats(&self) -> bool {
        self.cfg().permissions.stats
    }

    pub fn can_lifecycle(&self, container: &str) -> Result<()> {
        let cfg = self.cfg();
        if !cfg.permissions.lifecycle {
            return Err(DockError::NotPermitted("lifecycle operations are disabled".into()));
        }
        drop(cfg);
        self.require_access(container)?;
        self.require_not_strict()?;
        Ok(())
    }

    fn require_access(&self, container: &str) -> Result<()> {
        if !self.can_access(container) {
            return Err(DockError::ContainerNotAllowed(container.to_string()));
        }
        Ok(())
    }

    fn require_not_strict(&self) -> Result<()> {
        if self.cfg().mode == SecurityMode::Strict {
            return Err(DockError::ModeForbidden(
                "strict security mode forbids this operation".into(),
            ));
        }
        Ok(())
    }

    /// `canExec(container, command)` per the table in §4.5.
    pub fn can_exec(&self, container: &str, command: &str) -> Result<()> {
        {
            let cfg = self.cfg();
            if !cfg.permissions.exec {
                return Err(DockError::NotPermitted("exec is disabled".into()));
            }
        }
        self.require_access(container)?;
        self.require_not_strict()?;

        if self.cfg().mode == SecurityMode::Permissive {
            return Ok(());
        }

        // Only moderate mode reaches here: require_not_strict already
        // rejected strict mode above.
        let cfg = self.cfg();
        let specific = cfg.exec_whitelist.get(container);
        let global = cfg.exec_whitelist.get("*");
        let matched = specific.is_some_and(|p| whitelist::any_pattern_matches(command, p))
            || global.is_some_and(|p| whitelist::any_pattern_matches(command, p));
        if matched {
            return Ok(());
        }
        drop(cfg);
        let would_be_dangerous = self.dangerous_base_allowed(container, command);
        let msg = format!("command is not in the exec whitelist for container '{container}': {command}");
        if would_be_dangerous {
            Err(DockError::whitelist_with_dangerous_hint(msg))
        } else {
            Err(DockError::NotWhitelisted(msg))
        }
    }

    fn dangerous_base_allowed(&self, container: &str, command: &str) -> bool {
        let cfg = self.cfg();
        if !cfg.exec_dangerously.enabled {
            return false;
        }
        let base = tokenizer::base_command(command);
        cfg.exec_dangerously
            .commands
            .get(container)
            .map(|list| list.contains(&base))
            .unwrap_or(false)
            || cfg
                .exec_dangerously
                .commands
                .get("*")
                .map(|list| list.contains(&base))
                .unwrap_or(false)
    }

    /// `canExecDangerously(container, command)` per §4.5.
    pub fn can_exec_dangerously(&self, container: &str, command: &str) -> Result<()> {
        {
            let cfg = self.cfg();
            if !cfg.exec_dangerously.enabled {
                return Err(DockError::Disabled("dangerous exec mode is disabled".into()));
            }
            if !cfg.permissions.exec {
                return Err(DockError::NotPermitted("exec is disabled".into()));
            }
        }
        self.require_access(container)?;
        self.require_not_strict()?;

        if let Some(c) = command.chars().find(|c| UNSAFE_METACHARS.contains(c)) {
            return Err(DockError::UnsafeSyntax(format!("command contains unsafe character '{c}'")));
        }
        if command.contains("$(") {
            return Err(DockError::UnsafeSyntax("command contains command substitution `$(`".into()));
        }
        if command.contains("..") {
            return Err(DockError::UnsafeSyntax("command contains path traversal '..'".into()));
        }

        if !self.dangerous_base_allowed(container, command) {
            let base = tokenizer::base_command(command);
            return Err(DockError::NotWhitelisted(format!(
                "base command '{base}' is not in the dangerous-commands list for container '{container}'"
            )));
        }

        for path_arg in tokenizer::path_arguments(command) {
            if let Some(blocked) = self.blocked_paths.is_blocked(container, &path_arg) {
                return Err(DockError::PathBlocked {
                    path: path_arg,
                    reason: blocked.reason.as_str().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Runtime override: CLI flags may toggle dangerous mode before the
    /// request server starts serving.
    pub fn set_dangerous_mode_enabled(&self, enabled: bool) {
        self.config.write().unwrap().exec_dangerously.enabled = enabled;
    }

    /// Runtime override: replaces the dangerous-commands list for one
    /// container (or `"*"`).
    pub fn set_dangerous_commands(&self, container: &str, commands: Vec<String>) {
        self.config
            .write()
            .unwrap()
            .exec_dangerously
            .commands
            .insert(container.to_string(), commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockedPathsConfig, ExecDangerously, Permissions};
    use std::collections::HashMap;

    fn base_config() -> SecurityConfig {
        SecurityConfig {
            mode: SecurityMode::Moderate,
            allowed_containers: vec!["demo-app".to_string()],
            permissions: Permissions {
                logs: true,
                inspect: true,
                stats: true,
                exec: true,
                lifecycle: true,
            },
            exec_whitelist: HashMap::from([("demo-app".to_string(), vec!["npm test".to_string()])]),
            exec_dangerously: ExecDangerously::default(),
            blocked_paths: BlockedPathsConfig::default(),
            host_path_masking: Default::default(),
            output_masking: Default::default(),
        }
    }

    fn policy(cfg: SecurityConfig) -> ContainerPolicy {
        let engine = BlockedPathsEngine::load(&["demo-app".to_string()], &cfg.blocked_paths);
        ContainerPolicy::new(cfg, engine)
    }

    #[test]
    fn can_access_is_monotonic() {
        let cfg = base_config();
        let p = policy(cfg.clone());
        assert!(p.can_access("demo-app"));
        assert!(!p.can_access("other-app"));

        let mut widened = cfg;
        widened.allowed_containers.push("other-app".to_string());
        let p2 = policy(widened);
        assert!(p2.can_access("demo-app"));
        assert!(p2.can_access("other-app"));
    }

    #[test]
    fn empty_allowlist_permits_everything() {
        let mut cfg = base_config();
        cfg.allowed_containers.clear();
        let p = policy(cfg);
        assert!(p.can_access("anything"));
    }

    #[test]
    fn s3_moderate_whitelist_and_dangerous_hint() {
        let mut cfg = base_config();
        let p = policy(cfg.clone());
        assert!(p.can_exec("demo-app", "npm test").is_ok());
        let err = p.can_exec("demo-app", "rm -rf /").unwrap_err();
        assert!(!err.to_string().contains("dangerously=true"));

        cfg.exec_dangerously.enabled = true;
        cfg.exec_dangerously
            .commands
            .insert("demo-app".to_string(), vec!["tail".to_string()]);
        let p2 = policy(cfg);
        let err = p2.can_exec("demo-app", "tail -f /var/log/app.log").unwrap_err();
        assert!(err.to_string().contains("dangerously=true"));
    }

    #[test]
    fn s4_dangerous_exec_blocked_paths_and_unsafe_syntax() {
        let mut cfg = base_config();
        cfg.blocked_paths.manual.insert(
            "demo-app".to_string(),
            vec![".env".to_string(), "/secrets/*".to_string()],
        );
        cfg.exec_dangerously.enabled = true;
        cfg.exec_dangerously
            .commands
            .insert("demo-app".to_string(), vec!["cat".to_string()]);
        let p = policy(cfg);

        assert!(p.can_exec_dangerously("demo-app", "cat /etc/config.json").is_ok());

        let err = p.can_exec_dangerously("demo-app", "cat .env").unwrap_err();
        match err {
            DockError::PathBlocked { reason, .. } => assert_eq!(reason, "manual_block"),
            other => panic!("expected PathBlocked, got {other:?}"),
        }

        assert!(p.can_exec_dangerously("demo-app", "cat /secrets/key.pem").is_err());

        let err = p
            .can_exec_dangerously("demo-app", "cat /etc/passwd | grep x")
            .unwrap_err();
        assert!(matches!(err, DockError::UnsafeSyntax(_)));
    }

    #[test]
    fn strict_mode_forbids_exec_and_lifecycle() {
        let mut cfg = base_config();
        cfg.mode = SecurityMode::Strict;
        let p = policy(cfg);
        assert!(matches!(p.can_exec("demo-app", "npm test"), Err(DockError::ModeForbidden(_))));
        assert!(matches!(p.can_lifecycle("demo-app"), Err(DockError::ModeForbidden(_))));
    }

    #[test]
    fn permissive_mode_allows_any_command() {
        let mut cfg = base_config();
        cfg.mode = SecurityMode::Permissive;
        let p = policy(cfg);
        assert!(p.can_exec("demo-app", "anything goes").is_ok());
    }

    #[test]
    fn whitespace_normalisation_is_irrelevant() {
        let cfg = base_config();
        let p = policy(cfg);
        assert!(p.can_exec("demo-app", "  npm test  ").is_ok());
    }

    #[test]
    fn runtime_overrides_toggle_dangerous_mode() {
        let mut cfg = base_config();
        cfg.exec_dangerously
            .commands
            .insert("demo-app".to_string(), vec!["tail".to_string()]);
        let p = policy(cfg);
        assert!(p.can_exec_dangerously("demo-app", "tail -n 10 /var/log/x").is_err());
        p.set_dangerous_mode_enabled(true);
        assert!(p.can_exec_dangerously("demo-app", "tail -n 10 /var/log/x").is_ok());

        p.set_dangerous_commands("demo-app", vec!["cat".to_string()]);
        assert!(p.can_exec_dangerously("demo-app", "tail -n 10 /var/log/x").is_err());
        assert!(p.can_exec_dangerously("demo-app", "cat /var/log/x").is_ok());
    }
}
