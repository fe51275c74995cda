//! Generative service boundary.
//!
//! - `provider`: provider-neutral request/response types and the
//!   [`GenerativeService`] trait everything else is written against
//! - `schema`: declarative output schemas, sent with requests and re-checked on receipt
//! - `gemini`: the REST implementation used in production

pub mod gemini;
pub mod provider;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use gemini::GeminiClient;
pub use provider::{
    Content, ContentRequest, ContentResponse, GenerativeService, Part, Role, TokenUsage,
};
pub use schema::{OutputSchema, SchemaField, SchemaMismatch};

use std::sync::Arc;

use crate::config::OracleConfig;
use crate::error::LlmError;

/// Create the production service from configuration.
pub fn create_service(config: &OracleConfig) -> Result<Arc<dyn GenerativeService>, LlmError> {
    let client = GeminiClient::from_config(config)?;
    tracing::info!(
        analysis_model = %config.analysis_model,
        chat_model = %config.chat_model,
        timeout_secs = config.request_timeout.as_secs(),
        "Using Gemini"
    );
    Ok(Arc::new(client))
}
