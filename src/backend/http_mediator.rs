//! HTTP-mediator-backed capability set (§9 "Polymorphism without
//! inheritance"). Delegates every operation over HTTP to a remote
//! mediator process instead of shelling out to a local `docker` socket.
//! The wire protocol itself is out of scope (§1); this struct exists so
//! call sites can hold `Arc<dyn DockerCapability>` without caring which
//! transport backs it, exactly as the teacher's backend module keeps
//! multiple `JailBackend` implementations behind one trait object.

use super::{ContainerSummary, DockerCapability, LifecycleAction};
use crate::error::{DockError, Result};
use crate::host_tools::{Tool, ToolResult};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Placeholder base-URL-holding client. A real implementation would own an
/// HTTP client and a base URL; every method below already returns the
/// `Disabled` error the mediation core treats as "not implemented",
/// keeping it distinguishable from a policy-denied request.
pub struct HttpMediatorCapability {
    base_url: String,
}

impl HttpMediatorCapability {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn not_implemented(&self, op: &str) -> DockError {
        DockError::Disabled(format!(
            "HTTP mediator transport to '{}' is out of scope ({op} not implemented)",
            self.base_url
        ))
    }
}

#[async_trait]
impl DockerCapability for HttpMediatorCapability {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        Err(self.not_implemented("list_containers"))
    }

    async fn get_logs(&self, _container: &str, _tail: Option<usize>) -> Result<String> {
        Err(self.not_implemented("get_logs"))
    }

    async fn exec(&self, _container: &str, _command: &str, _dangerously: bool) -> Result<String> {
        Err(self.not_implemented("exec"))
    }

    async fn inspect(&self, _container: &str) -> Result<serde_json::Value> {
        Err(self.not_implemented("inspect"))
    }

    async fn stats(&self, _container: &str) -> Result<serde_json::Value> {
        Err(self.not_implemented("stats"))
    }

    async fn lifecycle(&self, _container: &str, _action: LifecycleAction) -> Result<()> {
        Err(self.not_implemented("lifecycle"))
    }

    async fn list_host_tools(&self) -> Result<Vec<Tool>> {
        Err(self.not_implemented("list_host_tools"))
    }

    async fn run_host_tool(
        &self,
        _name: &str,
        _args: &[String],
        _cancel: CancellationToken,
    ) -> Result<ToolResult> {
        Err(self.not_implemented("run_host_tool"))
    }

    async fn exec_host_command(&self, _command: &str, _dangerously: bool) -> Result<String> {
        Err(self.not_implemented("exec_host_command"))
    }
}
