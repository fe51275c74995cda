//! Gemini REST implementation of [`GenerativeService`].
//!
//! Talks to `models/{model}:generateContent` directly. Inline attachments are
//! base64-encoded on the wire; structured output is requested through
//! `generationConfig.responseSchema`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{
    Content, ContentRequest, ContentResponse, GenerativeService, Part, TokenUsage,
};
use crate::config::OracleConfig;
use crate::error::LlmError;

const PROVIDER: &str = "gemini";

/// HTTP client for the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a client. `timeout` bounds every request end to end.
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &OracleConfig) -> Result<Self, LlmError> {
        Self::new(config.api_key.clone(), config.base_url.clone(), config.request_timeout)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                provider: PROVIDER.to_string(),
                timeout: self.timeout,
            }
        } else {
            LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse, LlmError> {
        let url = self.endpoint(&request.model);
        let body = GenerateContentBody::from_request(&request);
        tracing::debug!(
            model = %request.model,
            turns = body.contents.len(),
            "Sending generateContent"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(LlmError::Http {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to parse response envelope: {e}"),
            })?;

        Ok(parsed.into_content_response())
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentBody {
    fn from_request(request: &ContentRequest) -> Self {
        let system_instruction = request.system_instruction.as_ref().map(|text| WireContent {
            role: None,
            parts: vec![WirePart::Text { text: text.clone() }],
        });

        let wants_config = request.response_schema.is_some() || request.temperature.is_some();
        let generation_config = if wants_config {
            Some(GenerationConfig {
                response_mime_type: request.response_schema.as_ref().map(|_| "application/json"),
                response_schema: request.response_schema.as_ref().map(|s| s.to_json()),
                temperature: request.temperature,
            })
        } else {
            None
        };

        Self {
            contents: request.contents.iter().map(WireContent::from).collect(),
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

impl From<&Content> for WireContent {
    fn from(content: &Content) -> Self {
        Self {
            role: Some(content.role.to_string()),
            parts: content
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => WirePart::Text { text: text.clone() },
                    Part::InlineData { mime_type, data } => WirePart::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: mime_type.clone(),
                            data: BASE64_STANDARD.encode(data),
                        },
                    },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GenerateContentResponse {
    fn into_content_response(self) -> ContentResponse {
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = self.candidates.into_iter().next() else {
            return ContentResponse {
                text: None,
                finish_reason: None,
                usage,
            };
        };

        let text: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        ContentResponse {
            text: (!text.is_empty()).then_some(text),
            finish_reason: candidate.finish_reason,
            usage,
        }
    }
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| match (w.error.status, w.error.message) {
            (Some(status), Some(msg)) => Some(format!("{status}: {msg}")),
            (None, Some(msg)) => Some(msg),
            (Some(status), None) => Some(status),
            (None, None) => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}
