//! Command-line surface. Flag parsing itself is out of scope for the
//! mediation core (§1); this module is scaffolding that gives the core a
//! realistic call site, following the teacher's `clap`-derive conventions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dockmcp", version, about = "Policy-mediated Docker and host-shell access for MCP assistants")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, default_value = "dockmcp.yaml")]
    pub config: PathBuf,

    /// Widen the tracing filter to debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP/SSE server, mediating tool calls against the policy
    /// core (transport itself is out of scope; see `mcp_server`).
    Serve {
        /// Address to bind the MCP/SSE transport to.
        #[arg(long, default_value = "127.0.0.1:8787")]
        bind: String,
    },
    /// Evaluate the loaded configuration offline, without starting a
    /// server: reports blocked-paths rule counts and any load warnings.
    /// Useful in CI and for auditing a config before deploying it.
    Check {
        /// Container names to evaluate blocked-paths rules against.
        #[arg(long, value_delimiter = ',')]
        containers: Vec<String>,
    },
    /// Interactively diff and promote host tools from staging into the
    /// approved directory for the current project (C8).
    SyncTools,
}
