use serde::{Deserialize, Serialize};

/// Role of a participant in an assistant conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One turn of the conversation history sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Reply from the remote assistant. `audio` is base64-encoded speech when the
/// backend synthesized any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AssistantReply {
    pub text: String,
    pub audio: Option<String>,
}

/// What the assistant side panel currently shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum AssistantStatus {
    #[default]
    Idle,
    Thinking,
    Error(String),
}
