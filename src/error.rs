//! Error types for mail-assist.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Mail adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the email workflow orchestrator.
///
/// Every variant is fatal for the request it occurs in: the orchestrator
/// logs, then propagates. No retry, no partial result.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid inbound email: {0}")]
    InvalidEmail(String),

    #[error("Priority classification failed: {0}")]
    Classification(String),

    #[error("Context retrieval failed: {0}")]
    Retrieval(String),

    #[error("Response generation failed: {0}")]
    Generation(String),

    #[error("Step {step} timed out after {timeout:?}")]
    Timeout {
        step: &'static str,
        timeout: Duration,
    },
}

/// Mail provider adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Mail API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// OAuth token lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated — complete the /auth/login flow first")]
    NotAuthenticated,

    #[error("Authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Token expired and no refresh token is available")]
    RefreshUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Secure data handler errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: ciphertext was produced under a different key or is corrupted")]
    Decryption,

    #[error("Credential serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
