//! Voice assistant glue for the side panel.
//!
//! The panel forwards transcribed text plus the running history to a remote
//! chat-completions endpoint and shows the reply. Speech capture and
//! synthesis live outside this crate; synthesized audio arrives as base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::types::assistant::{AssistantReply, AssistantStatus, ChatRole, ChatTurn};
use crate::types::errors::AssistantError;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

const SYSTEM_PROMPT: &str =
    "You are a concise voice assistant inside a web browser. Answer in one or two short sentences.";

/// Something that can answer a prompt given the prior conversation.
#[allow(async_fn_in_trait)]
pub trait AssistantBackend {
    async fn run(&self, text: &str, history: &[ChatTurn]) -> Result<AssistantReply, AssistantError>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct RemoteAssistant {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl RemoteAssistant {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, text: &str, history: &[ChatTurn]) -> Value {
        let mut messages = vec![json!({ "role": ChatRole::System, "content": SYSTEM_PROMPT })];
        messages.extend(
            history
                .iter()
                .map(|turn| json!({ "role": turn.role, "content": turn.content })),
        );
        messages.push(json!({ "role": ChatRole::User, "content": text }));
        json!({ "model": self.model, "messages": messages })
    }
}

/// Pulls the reply text (and optional audio) out of a completions payload.
pub fn parse_completion(payload: &Value) -> Result<AssistantReply, AssistantError> {
    let message = payload
        .pointer("/choices/0/message")
        .ok_or_else(|| AssistantError::InvalidResponse("missing choices[0].message".to_string()))?;
    let text = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let audio = message
        .pointer("/audio/data")
        .or_else(|| payload.get("audio"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(AssistantReply { text, audio })
}

impl AssistantBackend for RemoteAssistant {
    async fn run(&self, text: &str, history: &[ChatTurn]) -> Result<AssistantReply, AssistantError> {
        if text.trim().is_empty() {
            return Ok(AssistantReply::default());
        }
        let api_key = self.api_key.as_deref().ok_or(AssistantError::MissingApiKey)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json")
            .bearer_auth(api_key)
            .json(&self.request_body(text, history))
            .send()
            .await?;
        let status = response.status();
        let payload = response.text().await?;
        if !status.is_success() {
            return Err(AssistantError::HttpStatus(status.as_u16(), payload));
        }

        let parsed: Value = serde_json::from_str(&payload)
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
        parse_completion(&parsed)
    }
}

/// State behind the assistant side panel.
#[derive(Debug, Default)]
pub struct AssistantPanel {
    status: AssistantStatus,
    history: Vec<ChatTurn>,
    last_reply: Option<AssistantReply>,
}

impl AssistantPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &AssistantStatus {
        &self.status
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn last_reply(&self) -> Option<&AssistantReply> {
        self.last_reply.as_ref()
    }

    /// Sends `text` to `backend`. Empty input is ignored. Failures only
    /// change the panel status.
    pub async fn submit<B: AssistantBackend>(&mut self, backend: &B, text: &str) -> Option<AssistantReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.status = AssistantStatus::Thinking;
        match backend.run(text, &self.history).await {
            Ok(reply) => {
                debug!(chars = reply.text.len(), has_audio = reply.audio.is_some(), "assistant replied");
                self.history.push(ChatTurn::user(text));
                self.history.push(ChatTurn::assistant(reply.text.clone()));
                self.status = AssistantStatus::Idle;
                self.last_reply = Some(reply.clone());
                Some(reply)
            }
            Err(err) => {
                warn!(error = %err, "assistant request failed");
                self.status = AssistantStatus::Error(err.to_string());
                None
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.status, AssistantStatus::Error(_)) {
            self.status = AssistantStatus::Idle;
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.last_reply = None;
        self.status = AssistantStatus::Idle;
    }
}

/// Decodes the base64 audio of a reply, if any.
pub fn decode_audio(reply: &AssistantReply) -> Option<Vec<u8>> {
    let encoded = reply.audio.as_deref()?;
    match BASE64.decode(encoded.trim()) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(error = %err, "assistant audio is not valid base64");
            None
        }
    }
}
