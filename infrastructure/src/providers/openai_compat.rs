//! OpenAI-compatible chat completions gateway
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, Azure OpenAI, Ollama, vLLM, llama.cpp). Streaming uses the
//! server-sent events form of the same endpoint.

use async_trait::async_trait;
use council_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession, StreamHandle};
use council_domain::StreamEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl OpenAiCompatSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(120),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Read the API key from `env_var`, if set and non-empty.
    pub fn with_api_key_from_env(mut self, env_var: &str) -> Self {
        self.api_key = std::env::var(env_var).ok().filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChatChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChunkChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// LLM Gateway for OpenAI-compatible HTTP endpoints
pub struct OpenAiCompatGateway {
    client: reqwest::Client,
    settings: OpenAiCompatSettings,
}

impl OpenAiCompatGateway {
    pub fn new(settings: OpenAiCompatSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &OpenAiCompatSettings {
        &self.settings
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        if model.trim().is_empty() {
            return Err(GatewayError::ModelNotAvailable("empty model name".to_string()));
        }
        Ok(Box::new(OpenAiCompatSession {
            client: self.client.clone(),
            settings: self.settings.clone(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
        }))
    }
}

/// One system-prompted conversation against the endpoint
///
/// Every `send` is a single-turn request: the system prompt plus the new
/// message.
pub struct OpenAiCompatSession {
    client: reqwest::Client,
    settings: OpenAiCompatSettings,
    model: String,
    system_prompt: String,
}

impl OpenAiCompatSession {
    fn request<'a>(&'a self, content: &'a str, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &self.system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content,
        });
        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream,
        }
    }

    async fn post(&self, content: &str, stream: bool) -> Result<reqwest::Response, GatewayError> {
        let mut request = self
            .client
            .post(self.settings.completions_url())
            .json(&self.request(content, stream));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!("{}: {}", status, body)));
        }
        Ok(response)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl LlmSession for OpenAiCompatSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        debug!(model = %self.model, bytes = content.len(), "Chat completion request");
        let response: ChatResponse = self
            .post(content, false)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("invalid response body: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::RequestFailed("no choices in response".to_string()))
    }

    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        debug!(model = %self.model, bytes = content.len(), "Streaming chat completion request");
        let mut response = self.post(content, true).await?;
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut parser = SseParser::default();
            let mut full_text = String::new();

            loop {
                match response.chunk().await {
                    Ok(Some(bytes)) => {
                        for event in parser.push(&String::from_utf8_lossy(&bytes)) {
                            match event {
                                SseEvent::Delta(text) => {
                                    full_text.push_str(&text);
                                    if tx.send(StreamEvent::Delta(text)).await.is_err() {
                                        return;
                                    }
                                }
                                SseEvent::Done => {
                                    let _ = tx.send(StreamEvent::Completed(full_text)).await;
                                    return;
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(StreamEvent::Completed(full_text)).await;
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "Stream interrupted");
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                }
            }
        });

        Ok(StreamHandle::new(rx))
    }
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
}

/// Incremental parser for `data:` lines of a chat completions stream
#[derive(Debug, Default)]
struct SseParser {
    buffer: String,
}

impl SseParser {
    fn push(&mut self, input: &str) -> Vec<SseEvent> {
        self.buffer.push_str(input);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                events.push(SseEvent::Done);
                continue;
            }
            match serde_json::from_str::<ChatChunk>(data) {
                Ok(chunk) => {
                    let text: String = chunk
                        .choices
                        .into_iter()
                        .filter_map(|c| c.delta.content)
                        .collect();
                    if !text.is_empty() {
                        events.push(SseEvent::Delta(text));
                    }
                }
                Err(e) => debug!(error = %e, "Skipping unparsable stream line"),
            }
        }

        events
    }
}
