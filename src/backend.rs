//! Docker-operation backend abstraction (§9 "Polymorphism without
//! inheritance"): the mediation core is generic over how a container
//! operation actually reaches the daemon. Call sites hold
//! `Arc<dyn DockerCapability>`, never a concrete struct.

use crate::error::Result;
use crate::host_tools::{Tool, ToolResult};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub mod docker_socket;
pub mod http_mediator;

#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub name: String,
    pub image: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy)]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

/// Capability set a mediated request can invoke once C5/C6/C7 have granted
/// it. Every method is already past policy evaluation by the time it is
/// called; the backend's job is only to reach the daemon or host shell.
#[async_trait]
pub trait DockerCapability: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;
    async fn get_logs(&self, container: &str, tail: Option<usize>) -> Result<String>;
    async fn exec(&self, container: &str, command: &str, dangerously: bool) -> Result<String>;
    async fn inspect(&self, container: &str) -> Result<serde_json::Value>;
    async fn stats(&self, container: &str) -> Result<serde_json::Value>;
    async fn lifecycle(&self, container: &str, action: LifecycleAction) -> Result<()>;

    async fn list_host_tools(&self) -> Result<Vec<Tool>>;
    async fn run_host_tool(
        &self,
        name: &str,
        args: &[String],
        cancel: CancellationToken,
    ) -> Result<ToolResult>;
    async fn exec_host_command(&self, command: &str, dangerously: bool) -> Result<String>;
}
