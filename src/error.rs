use thiserror::Error;

/// Error taxonomy for the policy and mediation core.
///
/// Every decision function returns an explicit `Result<T, DockError>` rather
/// than using exceptions for control flow across component boundaries. A
/// `ConfigWarning` (loggable, non-fatal) is represented as a `tracing::warn!`
/// call site in the loaders, not as a variant here — it is never a reason to
/// abort startup.
#[derive(Error, Debug)]
pub enum DockError {
    #[error("disabled: {0}")]
    Disabled(String),

    #[error("not permitted: {0}")]
    NotPermitted(String),

    #[error("container not allowed: {0}")]
    ContainerNotAllowed(String),

    #[error("forbidden in current security mode: {0}")]
    ModeForbidden(String),

    #[error("not whitelisted: {0}")]
    NotWhitelisted(String),

    #[error("unsafe syntax in command: {0}")]
    UnsafeSyntax(String),

    #[error("path is blocked: {path} (reason: {reason})")]
    PathBlocked { path: String, reason: String },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DockError>;

impl DockError {
    /// Builds a `NotWhitelisted` error carrying the literal `dangerously=true`
    /// substring the container and host-command policies are contractually
    /// required to surface when a rejected command would be allowed under
    /// dangerous mode.
    pub fn whitelist_with_dangerous_hint(message: impl Into<String>) -> Self {
        DockError::NotWhitelisted(format!(
            "{} (retry with dangerously=true if this command is pre-approved for dangerous mode)",
            message.into()
        ))
    }
}
