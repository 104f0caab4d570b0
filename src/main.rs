use clap::Parser;
use dockmcp::backend::docker_socket::DockerSocketBackend;
use dockmcp::backend::DockerCapability;
use dockmcp::cli::{Cli, Commands};
use dockmcp::config::AppConfig;
use dockmcp::container_policy::ContainerPolicy;
use dockmcp::error;
use dockmcp::host_command_policy::HostCommandPolicy;
use dockmcp::host_tools::sync::InteractivePrompt;
use dockmcp::host_tools::HostToolsManager;
use dockmcp::masker::OutputMasker;
use dockmcp::{blocked_paths, project_id};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "dockmcp=debug,info" } else { "dockmcp=info,warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let config = AppConfig::load_from_file(&cli.config)?;
    let workspace_root = config
        .host_access
        .workspace_root
        .clone()
        .unwrap_or(std::env::current_dir()?);

    match cli.command {
        Commands::Serve { bind } => {
            let allowed = config.security.allowed_containers.clone();
            let blocked_paths = blocked_paths::BlockedPathsEngine::load(&allowed, &config.security.blocked_paths);
            let container_policy = Arc::new(ContainerPolicy::new(config.security.clone(), blocked_paths));
            let host_command_policy = Arc::new(HostCommandPolicy::new(config.host_access.host_commands.clone()));
            let host_tools = Arc::new(HostToolsManager::new(
                config.host_access.host_tools.clone(),
                workspace_root,
            ));
            let masker = Arc::new(OutputMasker::new(&config.security.output_masking));

            let capability: Arc<dyn DockerCapability> = Arc::new(DockerSocketBackend::new(
                container_policy,
                host_command_policy,
                host_tools,
                masker,
                config.security.host_path_masking.clone(),
            ));

            let addr = bind
                .parse()
                .map_err(|e| error::DockError::Config(format!("invalid --bind address '{bind}': {e}")))?;
            dockmcp::mcp_server::serve(addr, capability).await
        }
        Commands::Check { containers } => {
            let containers = if containers.is_empty() {
                config.security.allowed_containers.clone()
            } else {
                containers
            };
            let engine = blocked_paths::BlockedPathsEngine::load(&containers, &config.security.blocked_paths);
            info!(
                mode = ?config.security.mode,
                rule_count = engine.rule_count(),
                secure_host_tools = config.host_access.host_tools.secure_mode(),
                "configuration loaded"
            );
            for container in &containers {
                let rules = engine.for_container(container);
                info!(container, rule_count = rules.len(), "blocked-paths rules for container");
            }
            Ok(())
        }
        Commands::SyncTools => {
            let Some(approved_dir) = config.host_access.host_tools.approved_dir.clone() else {
                return Err(error::DockError::Disabled(
                    "host_tools.approved_dir is not set; secure mode is required for sync-tools".into(),
                ));
            };
            let project_id = project_id::project_id(&workspace_root);
            let approved_project_dir = approved_dir.join(project_id);
            let mut synced = 0;
            for staging_dir in &config.host_access.host_tools.staging_dirs {
                let staging_dir = if staging_dir.is_absolute() {
                    staging_dir.clone()
                } else {
                    workspace_root.join(staging_dir)
                };
                synced += dockmcp::host_tools::sync::sync_tools(
                    &staging_dir,
                    &approved_project_dir,
                    &config.host_access.host_tools.allowed_extensions,
                    &mut InteractivePrompt,
                )?;
            }
            info!(synced, "host tools synced to approved directory");
            Ok(())
        }
    }
}
