//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::analysis::AnalysisVariant;
use crate::error::ConfigError;

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Oracle configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Credential for the generative service.
    pub api_key: SecretString,
    /// Model used for the structured analysis request.
    pub analysis_model: String,
    /// Model used for follow-up chat turns.
    pub chat_model: String,
    /// REST base URL, without a trailing slash.
    pub base_url: String,
    /// Upper bound on any single service call.
    pub request_timeout: Duration,
    /// Shape of the analysis document to request.
    pub variant: AnalysisVariant,
}

impl OracleConfig {
    /// Build a config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            variant: AnalysisVariant::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// A missing API key is fatal; every other setting has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let mut config = Self::new(api_key);

        if let Some(model) = lookup("SUAN_ANALYSIS_MODEL") {
            config.analysis_model = model;
        }
        if let Some(model) = lookup("SUAN_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("SUAN_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SUAN_REQUEST_TIMEOUT_SECS".to_string(),
                message: format!("expected a whole number of seconds, got {secs:?}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "SUAN_REQUEST_TIMEOUT_SECS".to_string(),
                    message: "timeout must be greater than zero".to_string(),
                });
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(variant) = lookup("SUAN_ANALYSIS_VARIANT") {
            config.variant = variant
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "SUAN_ANALYSIS_VARIANT".to_string(),
                    message,
                })?;
        }

        Ok(config)
    }
}
