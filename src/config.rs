//! Configuration types, assembled from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Gmail OAuth scopes requested at login.
pub const GMAIL_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.modify",
];

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub llm: LlmSettings,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Build the full configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            google: GoogleConfig::from_env()?,
            llm: LlmSettings::from_env()?,
            workflow: WorkflowConfig::from_env(),
        })
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("MAIL_ASSIST_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match std::env::var("MAIL_ASSIST_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAIL_ASSIST_PORT".into(),
                message: format!("not a port number: {raw}"),
            })?,
            Err(_) => 8000,
        };
        Ok(Self { host, port })
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Google OAuth client configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Base URL the OAuth callback is reachable at (no trailing slash).
    pub redirect_base: String,
    /// Where the persisted token blob lives.
    pub token_path: PathBuf,
    /// Address outbound mail is sent from.
    pub from_address: String,
}

impl GoogleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_CLIENT_ID".into()))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_CLIENT_SECRET".into()))?;

        let redirect_base = std::env::var("MAIL_ASSIST_REDIRECT_BASE")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let token_path = std::env::var("MAIL_ASSIST_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/token.json"));
        let from_address = std::env::var("MAIL_ASSIST_FROM_ADDRESS").unwrap_or_default();

        Ok(Self {
            client_id,
            client_secret: SecretString::from(client_secret),
            redirect_base,
            token_path,
            from_address,
        })
    }
}

/// LLM provider selection.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
}

impl LlmSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("MAIL_ASSIST_LLM_BACKEND").as_deref() {
            Ok("openai") => LlmBackend::OpenAi,
            Ok("anthropic") | Err(_) => LlmBackend::Anthropic,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "MAIL_ASSIST_LLM_BACKEND".into(),
                    message: format!("unknown backend: {other}"),
                });
            }
        };

        let key_var = match backend {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
        };
        let api_key =
            std::env::var(key_var).map_err(|_| ConfigError::MissingEnvVar(key_var.into()))?;

        let model = std::env::var("MAIL_ASSIST_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        Ok(Self {
            backend,
            api_key: SecretString::from(api_key),
            model,
        })
    }
}

/// Workflow orchestrator tuning.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Upper bound on each external call (classify, retrieve, generate).
    pub step_timeout: Duration,
    /// Maximum related snippets returned by context retrieval.
    pub context_limit: usize,
    /// Delay applied when scheduling a followup reply.
    pub followup_delay: chrono::Duration,
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        let step_timeout_secs: u64 = std::env::var("MAIL_ASSIST_STEP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let context_limit: usize = std::env::var("MAIL_ASSIST_CONTEXT_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let followup_delay_hours: i64 = std::env::var("MAIL_ASSIST_FOLLOWUP_DELAY_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24);

        Self {
            step_timeout: Duration::from_secs(step_timeout_secs),
            context_limit,
            followup_delay: chrono::Duration::hours(followup_delay_hours),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(60),
            context_limit: 5,
            followup_delay: chrono::Duration::hours(24),
        }
    }
}
