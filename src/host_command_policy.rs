//! Host-command policy (C6): evaluates commands executed directly on the
//! host OS, mirroring the shape of C5 but with no blocked-paths gate and
//! an extra docker-target restriction.

use crate::config::HostCommandsConfig;
use crate::error::{DockError, Result};
use crate::tokenizer;
use crate::whitelist;
use glob::Pattern;

const UNSAFE_METACHARS: &[char] = &['|', '>', '<', ';', '&', '`', '\n'];

pub struct HostCommandPolicy {
    config: HostCommandsConfig,
}

impl HostCommandPolicy {
    pub fn new(config: HostCommandsConfig) -> Self {
        Self { config }
    }

    fn contains_unsafe_syntax(command: &str) -> Option<DockError> {
        if let Some(c) = command.chars().find(|c| UNSAFE_METACHARS.contains(c)) {
            return Some(DockError::UnsafeSyntax(format!("command contains unsafe character '{c}'")));
        }
        if command.contains("$(") {
            return Some(DockError::UnsafeSyntax("command contains command substitution `$(`".into()));
        }
        None
    }

    /// Splits at the first whitespace into `(base, rest)`, matching §4.6
    /// step 3 literally (not full tokenization — the base/rest split is on
    /// raw whitespace, before any quote-aware parsing).
    fn split_base_rest(command: &str) -> (&str, &str) {
        let trimmed = command.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((base, rest)) => (base, rest.trim_start()),
            None => (trimmed, ""),
        }
    }

    fn docker_target_ok(&self, base: &str, rest: &str) -> bool {
        if (base != "docker" && base != "docker-compose") || self.config.allowed_containers.is_empty() {
            return true;
        }
        // "after the first two tokens" counts from the whole command
        // (base, subcommand); `base` was already split off, so within
        // `rest` only the subcommand itself (one token) is skipped.
        tokenizer::tokenize(rest)
            .iter()
            .skip(1)
            .filter(|t| !t.starts_with('-'))
            .all(|arg| {
                self.config
                    .allowed_containers
                    .iter()
                    .any(|pattern| arg == pattern || Pattern::new(pattern).map(|p| p.matches(arg)).unwrap_or(false))
            })
    }

    /// `canExecHostCommand(command)` per §4.6.
    pub fn can_exec_host_command(&self, command: &str) -> Result<()> {
        if !self.config.enabled {
            return Err(DockError::Disabled("host commands are disabled".into()));
        }
        if let Some(e) = Self::contains_unsafe_syntax(command) {
            return Err(e);
        }

        let (base, rest) = Self::split_base_rest(command);

        if let Some(deny_patterns) = self.config.deny.get(base) {
            if whitelist::any_pattern_matches(rest, deny_patterns) {
                return Err(DockError::NotWhitelisted(format!(
                    "command '{base}' is explicitly denied"
                )));
            }
        }

        if let Some(whitelist_patterns) = self.config.whitelist.get(base) {
            if whitelist::any_pattern_matches(rest, whitelist_patterns) {
                if !self.docker_target_ok(base, rest) {
                    return Err(DockError::ContainerNotAllowed(format!(
                        "'{base}' targets a container outside allowed_containers"
                    )));
                }
                return Ok(());
            }
        }

        if let Some(dangerous_subcommands) = self.config.dangerously.commands.get(base) {
            let _ = dangerous_subcommands;
            return Err(DockError::whitelist_with_dangerous_hint(format!(
                "command '{base}' is not whitelisted"
            )));
        }

        Err(DockError::NotWhitelisted(format!("command '{base}' is not whitelisted")))
    }

    /// `canExecHostCommandDangerously(command)` per §4.6.
    pub fn can_exec_host_command_dangerously(&self, command: &str) -> Result<()> {
        if !self.config.dangerously.enabled {
            return Err(DockError::Disabled("dangerous host commands are disabled".into()));
        }
        if let Some(e) = Self::contains_unsafe_syntax(command) {
            return Err(e);
        }
        if command.contains("..") {
            return Err(DockError::UnsafeSyntax("command contains path traversal '..'".into()));
        }

        let (base, rest) = Self::split_base_rest(command);

        if let Some(whitelist_patterns) = self.config.whitelist.get(base) {
            if whitelist::any_pattern_matches(rest, whitelist_patterns) && self.docker_target_ok(base, rest) {
                return Ok(());
            }
        }

        let first_subcommand = tokenizer::tokenize(rest).into_iter().next().unwrap_or_default();
        let allowed = self
            .config
            .dangerously
            .commands
            .get(base)
            .map(|subs| subs.contains(&first_subcommand))
            .unwrap_or(false);

        if allowed {
            Ok(())
        } else {
            Err(DockError::NotWhitelisted(format!(
                "'{base} {first_subcommand}' is not in the dangerous-commands list"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg() -> HostCommandsConfig {
        HostCommandsConfig {
            enabled: true,
            allowed_containers: vec!["demo-app".to_string()],
            allowed_projects: vec![],
            whitelist: HashMap::from([
                ("ls".to_string(), vec!["*".to_string()]),
                ("docker".to_string(), vec!["ps *".to_string(), "logs *".to_string()]),
            ]),
            deny: HashMap::from([("ls".to_string(), vec!["-la /etc*".to_string()])]),
            dangerously: crate::config::HostCommandsDangerously {
                enabled: true,
                commands: HashMap::from([("git".to_string(), vec!["status".to_string(), "log".to_string()])]),
            },
        }
    }

    #[test]
    fn whitelisted_command_is_allowed() {
        let p = HostCommandPolicy::new(cfg());
        assert!(p.can_exec_host_command("ls -la /tmp").is_ok());
    }

    #[test]
    fn denied_takes_priority_over_whitelist() {
        let p = HostCommandPolicy::new(cfg());
        assert!(p.can_exec_host_command("ls -la /etcsomething").is_err());
    }

    #[test]
    fn unsafe_syntax_is_rejected() {
        let p = HostCommandPolicy::new(cfg());
        assert!(matches!(
            p.can_exec_host_command("ls /tmp | rm -rf"),
            Err(DockError::UnsafeSyntax(_))
        ));
    }

    #[test]
    fn docker_target_restriction_enforced() {
        let p = HostCommandPolicy::new(cfg());
        assert!(p.can_exec_host_command("docker logs demo-app").is_ok());
        assert!(p.can_exec_host_command("docker logs other-app").is_err());
    }

    #[test]
    fn non_whitelisted_dangerous_capable_base_hints() {
        let mut config = cfg();
        config.dangerously.commands.insert("git".to_string(), vec!["status".to_string()]);
        let p = HostCommandPolicy::new(config);
        let err = p.can_exec_host_command("git status").unwrap_err();
        assert!(err.to_string().contains("dangerously=true"));
    }

    #[test]
    fn dangerous_mode_checks_first_subcommand() {
        let p = HostCommandPolicy::new(cfg());
        assert!(p.can_exec_host_command_dangerously("git status").is_ok());
        assert!(p.can_exec_host_command_dangerously("git push").is_err());
    }

    #[test]
    fn dangerous_mode_rejects_path_traversal() {
        let p = HostCommandPolicy::new(cfg());
        assert!(p.can_exec_host_command_dangerously("git status ../../etc").is_err());
    }

    #[test]
    fn disabled_is_rejected() {
        let mut config = cfg();
        config.enabled = false;
        let p = HostCommandPolicy::new(config);
        assert!(matches!(p.can_exec_host_command("ls /tmp"), Err(DockError::Disabled(_))));
    }
}
