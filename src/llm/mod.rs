// LLM module
// Chat-completion boundary used to turn retrieved context into an answer

pub mod groq;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use groq::GroqClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single chat-completion call, serialised as the OpenAI-compatible body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Hosted text generation. Implementations block until the model answers.
pub trait ChatModel: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

impl<M: ChatModel + ?Sized> ChatModel for Box<M> {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        (**self).complete(request)
    }
}
