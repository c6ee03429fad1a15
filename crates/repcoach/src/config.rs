use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load configuration from a YAML file, falling back to defaults when the
    /// file does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Defaults
// ============================================================================

/// Default storage directory (relative to config file).
pub const DEFAULT_STORAGE_DIR: &str = "data";
/// Default name of the cookie carrying the session token.
pub const DEFAULT_SESSION_COOKIE: &str = "session_token";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keep_alive_interval() -> u64 {
    15
}

fn default_max_connections() -> usize {
    256
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_public_prefixes() -> Vec<String> {
    vec!["/api/auth".to_string(), "/api/webhooks".to_string()]
}

fn default_exempt_paths() -> Vec<String> {
    vec!["/api/chat".to_string()]
}

fn default_session_cookie() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_chat_timeout() -> u64 {
    30
}

fn default_max_steps() -> u32 {
    5
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_session_path() -> String {
    "/api/auth/get-session".to_string()
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Timeout for non-streaming API routes.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval_seconds: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            keep_alive_interval_seconds: default_keep_alive_interval(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// GateConfig
// ============================================================================

/// Route classification table for the request gate.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Namespace whose routes answer with status codes rather than redirects.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Prefixes reachable without a session (auth endpoints, webhooks).
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    /// API paths that accept unauthenticated callers.
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Page that unauthenticated page requests are redirected to.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            public_prefixes: default_public_prefixes(),
            exempt_paths: default_exempt_paths(),
            session_cookie: default_session_cookie(),
            login_path: default_login_path(),
        }
    }
}

// ============================================================================
// ChatConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Wall-clock budget for a single chat response.
    #[serde(default = "default_chat_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of model calls per request (tool round-trips included).
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Overrides the built-in coaching instruction.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_chat_timeout(),
            max_steps: default_max_steps(),
            system_prompt: None,
        }
    }
}

// ============================================================================
// LlmConfig
// ============================================================================

/// OpenAI-compatible model endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

// ============================================================================
// AuthConfig
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Sessions listed in the config file.
    #[default]
    Static,
    /// Sessions resolved by the external auth service.
    Remote,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub static_sessions: Vec<StaticSessionConfig>,
    #[serde(default)]
    pub remote: Option<RemoteAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticSessionConfig {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAuthConfig {
    pub base_url: String,
    #[serde(default = "default_session_path")]
    pub session_path: String,
}

// ============================================================================
// StorageConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// `$$` produces a literal `$`. A `$` not followed by `{` is kept as is.
/// Nested references are not supported.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            out.push_str(&lookup_var(&tail[..end])?);
            rest = &tail[end + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn lookup_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => default
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string())),
    }
}
