use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use super::gemini_types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use super::prompt::{SYSTEM_INSTRUCTION, USER_PROMPT};
use super::schema::response_schema;
use super::variants::ModelVariant;
use super::StructuringError;
use crate::config::AppConfig;
use crate::pipeline::import::encode::{strip_data_url_prefix, EncodedDocument};

/// Anything that can turn one encoded document into the model's raw reply text.
///
/// Object safe so the orchestrator holds an `Arc<dyn ExtractionClient>` and
/// tests swap in [`MockExtractionClient`].
pub trait ExtractionClient: Send + Sync {
    fn extract(
        &self,
        document: &EncodedDocument,
        variant: ModelVariant,
    ) -> Result<String, StructuringError>;
}

/// Blocking HTTP client for the Gemini `generateContent` endpoint.
///
/// Must be built and dropped outside an async runtime; call `extract` from
/// `spawn_blocking` or a plain thread.
pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, StructuringError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StructuringError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model_id)
    }

    fn map_send_error(&self, e: reqwest::Error) -> StructuringError {
        if e.is_connect() {
            StructuringError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            StructuringError::Timeout(self.timeout_secs)
        } else {
            StructuringError::HttpClient(e.to_string())
        }
    }
}

/// Request body for one document.
pub fn build_request(document: &EncodedDocument, variant: ModelVariant) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::text(SYSTEM_INSTRUCTION)],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::inline(&document.media_type, strip_data_url_prefix(&document.data)),
                Part::text(USER_PROMPT),
            ],
        }],
        generation_config: GenerationConfig::for_variant(variant.profile(), response_schema()),
    }
}

impl ExtractionClient for GeminiClient {
    fn extract(
        &self,
        document: &EncodedDocument,
        variant: ModelVariant,
    ) -> Result<String, StructuringError> {
        let api_key = self.api_key.as_deref().ok_or(StructuringError::MissingApiKey)?;
        let model_id = variant.model_id();
        let body = build_request(document, variant);
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(model = model_id, status = status.as_u16(), "Extraction request rejected");
            return Err(StructuringError::RemoteError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        if let Some(reason) = parsed.block_reason() {
            return Err(StructuringError::Blocked(reason.to_string()));
        }

        let text = parsed.answer_text().ok_or(StructuringError::EmptyReply)?;

        tracing::debug!(
            model = model_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            reply_chars = text.len(),
            "Extraction reply received"
        );

        Ok(text)
    }
}

/// One recorded call to [`MockExtractionClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub media_type: String,
    pub variant: ModelVariant,
}

/// Scripted client for tests: replies are handed out in call order.
///
/// Once the script runs out every further call gets the fallback reply.
pub struct MockExtractionClient {
    script: Mutex<VecDeque<Result<String, StructuringError>>>,
    fallback: String,
    calls: Mutex<Vec<MockCall>>,
}

impl MockExtractionClient {
    /// Every call returns `reply`.
    pub fn new(reply: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls return `replies` in order, then `{}`.
    pub fn scripted(replies: Vec<Result<String, StructuringError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            fallback: "{}".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ExtractionClient for MockExtractionClient {
    fn extract(
        &self,
        document: &EncodedDocument,
        variant: ModelVariant,
    ) -> Result<String, StructuringError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                media_type: document.media_type.clone(),
                variant,
            });
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
