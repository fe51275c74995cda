//! Structured generation client.
//!
//! Sends one schema-constrained request and turns the reply into an
//! [`AnalysisResult`] or a [`GenerationError`]. Nothing is kept between calls.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use super::builder::GenerationRequest;
use super::model::AnalysisResult;
use crate::error::GenerationError;
use crate::llm::{Content, ContentRequest, GenerativeService, OutputSchema};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex pattern is valid")
});

/// Issues analysis requests against a [`GenerativeService`].
pub struct AnalysisClient {
    service: Arc<dyn GenerativeService>,
    model: String,
    temperature: Option<f32>,
}

impl AnalysisClient {
    pub fn new(service: Arc<dyn GenerativeService>, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Issue exactly one request and validate the reply against `schema`.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        schema: &OutputSchema,
    ) -> Result<AnalysisResult, GenerationError> {
        let contents = vec![Content::user(request.parts())];
        let mut content_request =
            ContentRequest::new(&self.model, contents).with_response_schema(schema.clone());
        if let Some(t) = self.temperature {
            content_request = content_request.with_temperature(t);
        }

        info!(
            model = %self.model,
            provider = self.service.provider_name(),
            attachments = request.attachments.len(),
            "Requesting analysis"
        );

        let response = self.service.generate_content(content_request).await?;
        let result = parse_analysis(response.text.as_deref(), schema);

        match &result {
            Ok(_) => info!(
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Analysis received"
            ),
            Err(e) => warn!(
                error = %e,
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                "Analysis rejected"
            ),
        }
        result
    }
}

/// Validate raw response text into an [`AnalysisResult`]. All-or-nothing.
pub fn parse_analysis(
    text: Option<&str>,
    schema: &OutputSchema,
) -> Result<AnalysisResult, GenerationError> {
    let text = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(GenerationError::EmptyResponse)?;

    let value: Value = serde_json::from_str(extract_json_object(text))
        .map_err(|e| GenerationError::MalformedJson(e.to_string()))?;

    schema.validate(&value).map_err(|m| GenerationError::SchemaViolation {
        path: m.path,
        reason: m.reason,
    })?;

    // Sections the schema does not declare are dropped, not half-decoded
    let result: AnalysisResult =
        serde_json::from_value(schema.prune(value)).map_err(|e| GenerationError::SchemaViolation {
            path: "$".to_string(),
            reason: e.to_string(),
        })?;

    if !HEX_COLOR.is_match(result.personality_color.hex.trim()) {
        return Err(GenerationError::SchemaViolation {
            path: "$.personalityColor.hex".to_string(),
            reason: format!("expected a #RRGGBB colour, found {:?}", result.personality_color.hex),
        });
    }

    Ok(result)
}

/// Extract a JSON object from output that might carry a markdown fence or extra text.
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        // Skip the info string (json, JSON, ...) on the opening fence line
        let body = match after.find('\n') {
            Some(nl) if !after[..nl].contains('{') => &after[nl + 1..],
            _ => after,
        };
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if inner.starts_with('{') {
                return inner;
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return &trimmed[start..=end];
        }
    }

    trimmed
}
