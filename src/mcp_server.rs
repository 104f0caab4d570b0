//! Thin MCP/SSE transport stub (§1, §6 — out of scope). The real transport
//! decodes MCP tool calls off an HTTP/SSE connection and hands a normalised
//! `{tool, container?, command?, path?, args?, dangerously?}` request to the
//! mediation core; that decode/encode boundary is exactly what the spec
//! excludes. This module exists only so `serve` has a call site to exercise
//! the core through, the way the teacher's CLI calls into `JailBuilder`.

use crate::backend::DockerCapability;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// A single mediated tool invocation, already decoded off the transport.
/// Mirrors the inbound contract in spec §6.
#[derive(Debug, Clone, Default)]
pub struct ToolCall {
    pub tool: String,
    pub container: Option<String>,
    pub command: Option<String>,
    pub path: Option<String>,
    pub args: Vec<String>,
    pub dangerously: bool,
}

/// Starts the (stubbed) MCP/SSE server, binding `addr` and serving
/// requests against `capability` until cancelled. The transport loop
/// itself never touches policy; it only decodes/encodes at the boundary.
pub async fn serve(addr: SocketAddr, _capability: Arc<dyn DockerCapability>) -> Result<()> {
    info!(%addr, "MCP/SSE transport is out of scope for this crate; serve() is a stub");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::http_mediator::HttpMediatorCapability;

    #[tokio::test]
    async fn serve_stub_returns_ok() {
        let cap: Arc<dyn DockerCapability> = Arc::new(HttpMediatorCapability::new("https://example.invalid"));
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        assert!(serve(addr, cap).await.is_ok());
    }
}
