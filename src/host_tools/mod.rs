//! Host-tools manager (C7): discovers, describes, and executes host tools
//! under legacy or secure mode, with an optional dev-mode staging overlay.

pub mod sync;

use crate::config::HostToolsConfig;
use crate::error::{DockError, Result};
use crate::project_id::project_id;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOrigin {
    Project,
    Common,
    Staging,
}

impl ToolOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOrigin::Project => "project",
            ToolOrigin::Common => "common",
            ToolOrigin::Staging => "staging",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub absolute_path: PathBuf,
    pub description: String,
    pub origin: ToolOrigin,
    pub source_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

pub struct HostToolsManager {
    config: HostToolsConfig,
    workspace_root: PathBuf,
    project_id: String,
    dev_mode: AtomicBool,
}

impl HostToolsManager {
    pub fn new(config: HostToolsConfig, workspace_root: PathBuf) -> Self {
        let project_id = project_id(&workspace_root);
        Self {
            config,
            workspace_root,
            project_id,
            dev_mode: AtomicBool::new(false),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn secure_mode(&self) -> bool {
        self.config.secure_mode()
    }

    /// Runtime override: CLI flags may toggle dev mode before the request
    /// server starts serving (§4.7, §9 "Global state").
    pub fn set_dev_mode(&self, enabled: bool) {
        self.dev_mode.store(enabled, Ordering::Relaxed);
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode.load(Ordering::Relaxed)
    }

    fn project_dir(&self) -> Option<PathBuf> {
        self.config
            .approved_dir
            .as_ref()
            .map(|base| base.join(&self.project_id))
    }

    fn common_dir(&self) -> Option<PathBuf> {
        self.config.approved_dir.as_ref().map(|base| base.join("_common"))
    }

    fn staging_dirs(&self) -> Vec<PathBuf> {
        self.config
            .staging_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    self.workspace_root.join(dir)
                }
            })
            .collect()
    }

    /// Enumerates the tools visible under the active mode, applying the
    /// supersede rules: a project-scoped tool shadows a common tool of the
    /// same name, and (dev mode only) a staging tool shadows everything.
    pub fn list_tools(&self) -> Vec<Tool> {
        let mut by_name: HashMap<String, Tool> = HashMap::new();

        if self.config.secure_mode() {
            if self.config.common {
                if let Some(dir) = self.common_dir() {
                    for tool in discover_dir(&dir, ToolOrigin::Common, &self.config.allowed_extensions) {
                        by_name.insert(tool.name.clone(), tool);
                    }
                }
            }
            if let Some(dir) = self.project_dir() {
                for tool in discover_dir(&dir, ToolOrigin::Project, &self.config.allowed_extensions) {
                    by_name.insert(tool.name.clone(), tool);
                }
            }
        } else {
            for dir in &self.config.directories {
                for tool in discover_dir(dir, ToolOrigin::Project, &self.config.allowed_extensions) {
                    by_name.insert(tool.name.clone(), tool);
                }
            }
        }

        if self.dev_mode() {
            for dir in self.staging_dirs() {
                for tool in discover_dir(&dir, ToolOrigin::Staging, &self.config.allowed_extensions) {
                    by_name.insert(tool.name.clone(), tool);
                }
            }
        }

        let mut tools: Vec<Tool> = by_name.into_values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    fn resolve_tool(&self, name: &str) -> Option<Tool> {
        self.list_tools().into_iter().find(|t| t.name == name)
    }

    /// Executes a named tool with `args` as argv, no shell interposition.
    /// Resolution never falls back to staging outside dev mode (spec §4.7,
    /// invariant 3).
    pub async fn run_tool(
        &self,
        name: &str,
        args: &[String],
        cancel: CancellationToken,
    ) -> Result<ToolResult> {
        let tool = self
            .resolve_tool(name)
            .ok_or_else(|| DockError::ToolNotFound(name.to_string()))?;

        let mut command = tokio::process::Command::new(&tool.absolute_path);
        command.args(args);
        command.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            command.env("PATH", path);
        }
        command.stdout(std::process::Stdio::piped());
        command.stderr(std::process::Stdio::piped());
        command.kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| DockError::ToolExecutionFailed(format!("failed to spawn '{name}': {e}")))?;

        let timeout = Duration::from_secs(self.config.timeout);
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                Err(DockError::Cancelled(format!("tool '{name}' execution was cancelled")))
            }
            outcome = tokio::time::timeout(timeout, child.wait_with_output()) => {
                match outcome {
                    Ok(Ok(output)) => Ok(ToolResult {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                        exit_code: output.status.code(),
                    }),
                    Ok(Err(e)) => Err(DockError::ToolExecutionFailed(format!("'{name}' failed: {e}"))),
                    Err(_) => Err(DockError::ToolExecutionFailed(format!(
                        "'{name}' timed out after {}s", self.config.timeout
                    ))),
                }
            }
        }
    }
}

/// Non-recursive directory walk for regular files whose extension is in
/// `allowed_extensions`. Non-executable `.sh` entries are skipped — a
/// staged script without the executable bit set is not yet a tool.
fn discover_dir(dir: &Path, origin: ToolOrigin, allowed_extensions: &[String]) -> Vec<Tool> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut tools = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !allowed_extensions.iter().any(|allowed| allowed == ext) {
            continue;
        }
        if ext == "sh" && !is_executable(&metadata) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        tools.push(Tool {
            name: name.to_string(),
            description: describe(&path),
            absolute_path: path.clone(),
            origin,
            source_dir: dir.to_path_buf(),
        });
    }

    tools
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// First non-shebang comment line, stripped of its `#` marker and of the
/// file's own basename if the line is nothing but that basename.
fn describe(path: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return String::new();
    };
    let basename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let mut lines = content.lines();
    if let Some(first) = content.lines().next() {
        if first.starts_with("#!") {
            lines.next();
        }
    }

    for line in lines {
        let trimmed = line.trim();
        if let Some(stripped) = trimmed.strip_prefix('#') {
            let text = stripped.trim();
            if text.is_empty() || text == basename {
                continue;
            }
            return text.to_string();
        }
        if trimmed.is_empty() {
            continue;
        }
        // First non-comment, non-blank line ends the leading comment block.
        break;
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    fn write_tool(dir: &Path, name: &str, content: &str, executable: bool) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        if executable {
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
        }
        path
    }

    fn base_cfg(approved_dir: Option<PathBuf>) -> HostToolsConfig {
        HostToolsConfig {
            enabled: true,
            approved_dir,
            staging_dirs: vec![],
            directories: vec![],
            common: true,
            allowed_extensions: vec!["sh".to_string()],
            timeout: 5,
        }
    }

    #[test]
    fn description_strips_marker_and_own_basename() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = write_tool(dir.path(), "mytool.sh", "#!/bin/sh\n# mytool.sh\n", true);
        assert_eq!(describe(&p1), "");

        let p2 = write_tool(dir.path(), "greet.sh", "#!/bin/sh\n# greet.sh\n# Greet tool\n", true);
        assert_eq!(describe(&p2), "Greet tool");
    }

    #[test]
    fn secure_mode_without_dev_mode_hides_staging() {
        let approved = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();

        let mut cfg = base_cfg(Some(approved.path().to_path_buf()));
        cfg.staging_dirs = vec![staging.path().to_path_buf()];
        cfg.common = false;

        let manager = HostToolsManager::new(cfg, workspace.path().to_path_buf());
        let project_dir = approved.path().join(manager.project_id());
        std::fs::create_dir_all(&project_dir).unwrap();
        write_tool(&project_dir, "approved.sh", "#!/bin/sh\necho hi\n", true);
        write_tool(staging.path(), "staged.sh", "#!/bin/sh\necho hi\n", true);

        let tools = manager.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "approved.sh");
        assert!(tools.iter().all(|t| t.origin != ToolOrigin::Staging));
    }

    #[tokio::test]
    async fn run_tool_not_found_in_staging_outside_dev_mode() {
        let approved = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        let mut cfg = base_cfg(Some(approved.path().to_path_buf()));
        cfg.staging_dirs = vec![staging.path().to_path_buf()];
        let manager = HostToolsManager::new(cfg, workspace.path().to_path_buf());
        write_tool(staging.path(), "staged.sh", "#!/bin/sh\necho hi\n", true);

        let result = manager.run_tool("staged.sh", &[], CancellationToken::new()).await;
        assert!(matches!(result, Err(DockError::ToolNotFound(_))));
    }

    #[test]
    fn dev_mode_makes_staging_visible_and_shadowing() {
        let approved = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        let mut cfg = base_cfg(Some(approved.path().to_path_buf()));
        cfg.staging_dirs = vec![staging.path().to_path_buf()];
        cfg.common = false;
        let manager = HostToolsManager::new(cfg, workspace.path().to_path_buf());

        let project_dir = approved.path().join(manager.project_id());
        std::fs::create_dir_all(&project_dir).unwrap();
        write_tool(&project_dir, "tool.sh", "#!/bin/sh\necho approved\n", true);
        write_tool(staging.path(), "tool.sh", "#!/bin/sh\necho staged\n", true);

        manager.set_dev_mode(true);
        let tools = manager.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].origin, ToolOrigin::Staging);
    }

    #[test]
    fn project_tool_shadows_common_tool() {
        let approved = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        let cfg = base_cfg(Some(approved.path().to_path_buf()));
        let manager = HostToolsManager::new(cfg, workspace.path().to_path_buf());

        let project_dir = approved.path().join(manager.project_id());
        let common_dir = approved.path().join("_common");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&common_dir).unwrap();
        write_tool(&project_dir, "shared.sh", "#!/bin/sh\necho project\n", true);
        write_tool(&common_dir, "shared.sh", "#!/bin/sh\necho common\n", true);

        let tools = manager.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].origin, ToolOrigin::Project);
    }

    #[tokio::test]
    async fn run_tool_executes_and_captures_output() {
        let approved = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        let cfg = base_cfg(Some(approved.path().to_path_buf()));
        let manager = HostToolsManager::new(cfg, workspace.path().to_path_buf());
        let project_dir = approved.path().join(manager.project_id());
        std::fs::create_dir_all(&project_dir).unwrap();
        write_tool(&project_dir, "echo.sh", "#!/bin/sh\necho hello\n", true);

        let result = manager
            .run_tool("echo.sh", &[], CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.exit_code, Some(0));
    }

    #[test]
    fn non_executable_sh_is_skipped() {
        let approved = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        let cfg = base_cfg(Some(approved.path().to_path_buf()));
        let manager = HostToolsManager::new(cfg, workspace.path().to_path_buf());
        let project_dir = approved.path().join(manager.project_id());
        std::fs::create_dir_all(&project_dir).unwrap();
        write_tool(&project_dir, "not_runnable.sh", "#!/bin/sh\necho hi\n", false);

        assert!(manager.list_tools().is_empty());
    }
}
