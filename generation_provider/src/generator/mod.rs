use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeminiConfig;
use crate::prompt::build_prompt;

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub query: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { query: query.into(), answer: answer.into() }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("invalid generator configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("unexpected response: {message}")]
    Response { message: String },
}

/// Produces an answer to `query` grounded in `context`.
pub trait Generator: Send + Sync {
    fn generate(&self, query: &str, context: &[&str], history: &[ChatTurn]) -> Result<String, GeneratorError>;
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug)]
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, GeneratorError> {
        if config.api_key.trim().is_empty() {
            return Err(GeneratorError::InvalidConfiguration { message: "api key is empty".into() });
        }
        if config.model.trim().is_empty() {
            return Err(GeneratorError::InvalidConfiguration { message: "model name is empty".into() });
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::InvalidConfiguration { message: format!("http client: {e}") })?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl Generator for GeminiGenerator {
    fn generate(&self, query: &str, context: &[&str], history: &[ChatTurn]) -> Result<String, GeneratorError> {
        let body = build_request(&self.config, build_prompt(query, context, history));
        tracing::debug!(model = %self.config.model, chunks = context.len(), "gemini request");

        let response = self
            .client
            .post(self.config.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| GeneratorError::Request { message: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GeneratorError::Request { message: format!("{status}: {text}") });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GeneratorError::Response { message: e.to_string() })?;
        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, GeneratorError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(GeneratorError::Response { message: "no text in response".into() });
    }
    Ok(text.to_string())
}

/// Parse a raw `generateContent` JSON body into its answer text.
pub fn parse_response(body: &str) -> Result<String, GeneratorError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GeneratorError::Response { message: e.to_string() })?;
    extract_text(parsed)
}

/// JSON body that would be sent for this prompt.
pub fn request_json(config: &GeminiConfig, query: &str, context: &[&str], history: &[ChatTurn]) -> serde_json::Value {
    serde_json::to_value(build_request(config, build_prompt(query, context, history))).unwrap_or(serde_json::Value::Null)
}

fn build_request(config: &GeminiConfig, prompt: String) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content { role: "user".into(), parts: vec![Part { text: prompt }] }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            response_mime_type: config.response_mime_type.clone(),
        },
    }
}
