use std::time::Duration;

use crate::generator::GeneratorError;

/// Default sampling and endpoint settings for the hosted model.
#[derive(Debug, Clone, Copy)]
pub struct GeminiDefaults {
    pub model: &'static str,
    pub endpoint: &'static str,
    pub api_key_env: &'static str,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: &'static str,
    pub timeout_secs: u64,
}

pub const GEMINI_DEFAULTS: GeminiDefaults = GeminiDefaults {
    model: "gemini-2.0-flash-exp",
    endpoint: "https://generativelanguage.googleapis.com/v1beta/models",
    api_key_env: "GEMINI_API_KEY",
    temperature: 0.2,
    top_p: 0.95,
    top_k: 40,
    max_output_tokens: 1024,
    response_mime_type: "text/plain",
    timeout_secs: 60,
};

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL; the request goes to `{endpoint}/{model}:generateContent`.
    pub endpoint: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Defaults with the given key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: GEMINI_DEFAULTS.model.into(),
            endpoint: GEMINI_DEFAULTS.endpoint.into(),
            temperature: GEMINI_DEFAULTS.temperature,
            top_p: GEMINI_DEFAULTS.top_p,
            top_k: GEMINI_DEFAULTS.top_k,
            max_output_tokens: GEMINI_DEFAULTS.max_output_tokens,
            response_mime_type: GEMINI_DEFAULTS.response_mime_type.into(),
            timeout: Duration::from_secs(GEMINI_DEFAULTS.timeout_secs),
        }
    }

    /// Defaults with the key read from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, GeneratorError> {
        Self::from_env_var(GEMINI_DEFAULTS.api_key_env)
    }

    pub fn from_env_var(var: &str) -> Result<Self, GeneratorError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::with_api_key(key.trim())),
            _ => Err(GeneratorError::InvalidConfiguration {
                message: format!("environment variable `{var}` is not set"),
            }),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}
