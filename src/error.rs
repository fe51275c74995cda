//! Error types for the oracle.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),
}

/// Configuration-related errors. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Problems with user-entered profile data, caught before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("Birth date is required")]
    MissingBirthDate,

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-level failures at the generative service boundary.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Provider {provider} returned HTTP {status}: {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of a structured generation request.
///
/// Parsing is all-or-nothing: any of these means no analysis was produced.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("The service returned no text payload")]
    EmptyResponse,

    #[error("Response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Response violates the output schema at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    #[error("Service call failed: {0}")]
    Service(#[from] LlmError),
}

/// Conversational session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Chat session has not been initialized")]
    NotInitialized,

    #[error("Chat transport error: {0}")]
    ChatTransport(#[from] LlmError),

    #[error("The model returned an empty reply")]
    EmptyReply,
}

/// Errors from the application state controller's guards.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("The profile cannot be edited in the {view} view")]
    NotEditable { view: String },

    #[error("A chat turn is already in flight")]
    ChatBusy,

    #[error("Chat message is empty")]
    EmptyMessage,
}

/// Result type alias for the oracle.
pub type Result<T> = std::result::Result<T, Error>;
