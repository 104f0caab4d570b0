//! Direct-local-socket backend: shells out to the `docker` CLI, which talks
//! to the local daemon socket. Grounded on the teacher's podman backend —
//! same `tokio::process::Command` + captured-output style.

use super::{ContainerSummary, DockerCapability, LifecycleAction};
use crate::config::HostPathMasking;
use crate::container_policy::ContainerPolicy;
use crate::error::{DockError, Result};
use crate::host_command_policy::HostCommandPolicy;
use crate::host_tools::{HostToolsManager, Tool, ToolResult};
use crate::masker::{self, OutputMasker};
use crate::tokenizer;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct DockerSocketBackend {
    container_policy: Arc<ContainerPolicy>,
    host_command_policy: Arc<HostCommandPolicy>,
    host_tools: Arc<HostToolsManager>,
    masker: Arc<OutputMasker>,
    host_path_masking: HostPathMasking,
}

impl DockerSocketBackend {
    pub fn new(
        container_policy: Arc<ContainerPolicy>,
        host_command_policy: Arc<HostCommandPolicy>,
        host_tools: Arc<HostToolsManager>,
        masker: Arc<OutputMasker>,
        host_path_masking: HostPathMasking,
    ) -> Self {
        Self {
            container_policy,
            host_command_policy,
            host_tools,
            masker,
            host_path_masking,
        }
    }

    /// Post-processes any string destined for the client with host-path
    /// masking, independent of and after the output masker's own patterns.
    fn finalize(&self, s: String) -> String {
        if self.host_path_masking.enabled {
            masker::mask_host_paths(&s, &self.host_path_masking.replacement)
        } else {
            s
        }
    }

    async fn run_docker(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "running docker CLI");
        let output = Command::new("docker")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DockError::ToolExecutionFailed(format!("failed to spawn docker: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DockError::ToolExecutionFailed(format!(
                "docker {:?} failed: {}",
                args, stderr
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DockerCapability for DockerSocketBackend {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let raw = self
            .run_docker(&["ps", "-a", "--format", "{{.Names}}\t{{.Image}}\t{{.Status}}"])
            .await?;
        Ok(raw
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(3, '\t');
                Some(ContainerSummary {
                    name: parts.next()?.to_string(),
                    image: parts.next()?.to_string(),
                    status: parts.next()?.to_string(),
                })
            })
            .filter(|c| self.container_policy.can_access(&c.name))
            .collect())
    }

    async fn get_logs(&self, container: &str, tail: Option<usize>) -> Result<String> {
        if !self.container_policy.can_get_logs() {
            return Err(DockError::NotPermitted("log access is disabled".into()));
        }
        if !self.container_policy.can_access(container) {
            return Err(DockError::ContainerNotAllowed(container.to_string()));
        }
        let tail_arg = tail.map(|n| n.to_string()).unwrap_or_else(|| "all".to_string());
        let raw = self.run_docker(&["logs", "--tail", &tail_arg, container]).await?;
        Ok(self.finalize(self.masker.mask_logs(&raw)))
    }

    async fn exec(&self, container: &str, command: &str, dangerously: bool) -> Result<String> {
        if dangerously {
            self.container_policy.can_exec_dangerously(container, command)?;
        } else {
            self.container_policy.can_exec(container, command)?;
        }
        let argv = tokenizer::tokenize(command);
        let mut args: Vec<&str> = vec!["exec", container];
        args.extend(argv.iter().map(|s| s.as_str()));
        let raw = self.run_docker(&args).await?;
        Ok(self.finalize(self.masker.mask_exec(&raw)))
    }

    async fn inspect(&self, container: &str) -> Result<serde_json::Value> {
        if !self.container_policy.can_inspect() {
            return Err(DockError::NotPermitted("inspect is disabled".into()));
        }
        if !self.container_policy.can_access(container) {
            return Err(DockError::ContainerNotAllowed(container.to_string()));
        }
        let raw = self.run_docker(&["inspect", container]).await?;
        let masked = self.finalize(self.masker.mask_inspect(&raw));
        Ok(serde_json::from_str(&masked)?)
    }

    async fn stats(&self, container: &str) -> Result<serde_json::Value> {
        if !self.container_policy.can_get_stats() {
            return Err(DockError::NotPermitted("stats are disabled".into()));
        }
        if !self.container_policy.can_access(container) {
            return Err(DockError::ContainerNotAllowed(container.to_string()));
        }
        let raw = self
            .run_docker(&["stats", "--no-stream", "--format", "{{json .}}", container])
            .await?;
        let masked = self.finalize(self.masker.mask_inspect(raw.trim()));
        Ok(serde_json::from_str(&masked)?)
    }

    async fn lifecycle(&self, container: &str, action: LifecycleAction) -> Result<()> {
        self.container_policy.can_lifecycle(container)?;
        let verb = match action {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
        };
        self.run_docker(&[verb, container]).await?;
        Ok(())
    }

    async fn list_host_tools(&self) -> Result<Vec<Tool>> {
        Ok(self.host_tools.list_tools())
    }

    async fn run_host_tool(
        &self,
        name: &str,
        args: &[String],
        cancel: CancellationToken,
    ) -> Result<ToolResult> {
        self.host_tools.run_tool(name, args, cancel).await
    }

    async fn exec_host_command(&self, command: &str, dangerously: bool) -> Result<String> {
        if dangerously {
            self.host_command_policy.can_exec_host_command_dangerously(command)?;
        } else {
            self.host_command_policy.can_exec_host_command(command)?;
        }
        let argv = tokenizer::tokenize(command);
        let Some((program, rest)) = argv.split_first() else {
            return Err(DockError::UnsafeSyntax("empty command".into()));
        };
        let output = Command::new(program)
            .args(rest)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DockError::ToolExecutionFailed(format!("failed to spawn '{program}': {e}")))?;
        let raw = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(self.finalize(self.masker.mask_output(&raw)))
    }
}
