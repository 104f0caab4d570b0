//! DockMCP policy and mediation core. The CLI/MCP binary (`main.rs`) is a
//! thin shell around this library; everything that matters for the
//! security properties in spec §8 lives here and is exercised directly by
//! `tests/` integration tests as well as the unit tests colocated with
//! each module.

pub mod backend;
pub mod blocked_paths;
pub mod cli;
pub mod config;
pub mod container_policy;
pub mod error;
pub mod host_command_policy;
pub mod host_tools;
pub mod masker;
pub mod mcp_server;
pub mod path_matcher;
pub mod project_id;
pub mod tokenizer;
pub mod whitelist;
