use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration document, one YAML file per spec §6. The core
/// only consumes `security` and `host_access.*`; `server`, `logging`, and
/// `cli` are out of scope and kept permissive so unknown keys in those
/// sections never fail a load.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub host_access: HostAccessConfig,
    /// The CLI flag surface is out of scope for the mediation core; accept
    /// whatever shape is there without validating it.
    #[serde(default)]
    pub cli: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Security mode, gating lifecycle/exec operations in C5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    Strict,
    #[default]
    Moderate,
    Permissive,
}

/// Permission gates for container operations, consulted by C5.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Permissions {
    #[serde(default)]
    pub logs: bool,
    #[serde(default)]
    pub inspect: bool,
    #[serde(default)]
    pub stats: bool,
    #[serde(default)]
    pub exec: bool,
    #[serde(default)]
    pub lifecycle: bool,
}

/// Dangerous-exec configuration: container name (or `"*"`) -> base command
/// names allowed under the widened "inspection-only" policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecDangerously {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub commands: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostPathMasking {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host_path_replacement")]
    pub replacement: String,
}

fn default_host_path_replacement() -> String {
    "[HOST_PATH]".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputMaskingApplyTo {
    #[serde(default)]
    pub logs: bool,
    #[serde(default)]
    pub exec: bool,
    #[serde(default)]
    pub inspect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputMaskingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mask_replacement")]
    pub replacement: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub apply_to: OutputMaskingApplyTo,
}

fn default_mask_replacement() -> String {
    "[MASKED]".to_string()
}

/// Claude Code `settings.json` auto-import, consulted by C3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeCodeSettingsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub settings_files: Vec<String>,
}

impl Default for ClaudeCodeSettingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_depth: default_max_depth(),
            settings_files: Vec::new(),
        }
    }
}

/// Gemini `.aiexclude` / `.geminiignore` auto-import, consulted by C3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettingsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub settings_files: Vec<String>,
}

impl Default for GeminiSettingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_depth: default_max_depth(),
            settings_files: Vec::new(),
        }
    }
}

fn default_max_depth() -> u32 {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutoImportConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    #[serde(default)]
    pub scan_files: Vec<String>,
    #[serde(default)]
    pub global_patterns: Vec<String>,
    #[serde(default)]
    pub claude_code_settings: ClaudeCodeSettingsConfig,
    #[serde(default)]
    pub gemini_settings: GeminiSettingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockedPathsConfig {
    /// Manual rules: container name -> patterns.
    #[serde(default)]
    pub manual: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub auto_import: AutoImportConfig,
}

/// Immutable-once-loaded security configuration (C5), mutable in-memory
/// only through the documented runtime overrides in §4.5.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub mode: SecurityMode,
    #[serde(default)]
    pub allowed_containers: Vec<String>,
    #[serde(default)]
    pub permissions: Permissions,
    /// Exec whitelist: container name (or `"*"`) -> command patterns.
    #[serde(default)]
    pub exec_whitelist: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub exec_dangerously: ExecDangerously,
    #[serde(default)]
    pub blocked_paths: BlockedPathsConfig,
    #[serde(default)]
    pub host_path_masking: HostPathMasking,
    #[serde(default)]
    pub output_masking: OutputMaskingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostCommandsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_containers: Vec<String>,
    #[serde(default)]
    pub allowed_projects: Vec<String>,
    #[serde(default)]
    pub whitelist: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub deny: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub dangerously: HostCommandsDangerously,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostCommandsDangerously {
    #[serde(default)]
    pub enabled: bool,
    /// Base command -> allowed first-subcommand list.
    #[serde(default)]
    pub commands: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostToolsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Presence switches the manager from legacy to secure mode (§3, §4.7).
    #[serde(default)]
    pub approved_dir: Option<PathBuf>,
    #[serde(default)]
    pub staging_dirs: Vec<PathBuf>,
    /// Legacy mode directories, used only when `approved_dir` is absent.
    #[serde(default)]
    pub directories: Vec<PathBuf>,
    #[serde(default)]
    pub common: bool,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_tool_timeout")]
    pub timeout: u64,
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["sh".to_string(), "py".to_string()]
}

fn default_tool_timeout() -> u64 {
    30
}

impl HostToolsConfig {
    pub fn secure_mode(&self) -> bool {
        self.approved_dir.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostAccessConfig {
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    #[serde(default)]
    pub host_commands: HostCommandsConfig,
    #[serde(default)]
    pub host_tools: HostToolsConfig,
}

impl AppConfig {
    /// Loads configuration from a YAML file, defaulting any section that is
    /// absent rather than failing. Unknown keys are ignored.
    pub fn load_from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::DockError::Config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> crate::error::Result<Self> {
        let cfg: AppConfig = serde_yaml::from_str(content)?;
        Ok(cfg)
    }
}
