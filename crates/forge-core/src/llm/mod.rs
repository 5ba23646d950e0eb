//! Text-generation seam.
//!
//! Plan generation and chat talk to the model only through
//! [`TextGenerator`], so tests can substitute a scripted implementation and
//! the HTTP client stays in [`anthropic`].

pub mod anthropic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicClient;

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Speaker of a conversation turn. Chat is single-turn, so only the user
/// ever speaks in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single, non-streaming completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Default output budget for plan-sized replies.
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    /// A request with one user turn.
    pub fn single(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: vec![Message::user(user)],
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Failures from a completion call. None of them are retried.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),

    #[error("request to model API failed: {0}")]
    Transport(String),

    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model API response could not be decoded: {0}")]
    Decode(String),

    #[error("model returned no text content")]
    EmptyResponse,
}

/// A model that turns a prompt into one complete text reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier used in logs (e.g. the model name).
    fn name(&self) -> &str;

    /// Send the request and wait for the full reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

// Compile-time assertion: TextGenerator must stay object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            request
                .messages
                .last()
                .map(|m| m.content.clone())
                .ok_or(LlmError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn generator_usable_as_trait_object() {
        let generator: Box<dyn TextGenerator> = Box::new(EchoGenerator);
        let reply = generator
            .complete(&CompletionRequest::single("sys", "hello"))
            .await
            .unwrap();
        assert_eq!(generator.name(), "echo");
        assert_eq!(reply, "hello");
    }

    #[test]
    fn single_request_shape() {
        let req = CompletionRequest::single("coach", "plan please");
        assert_eq!(req.system, "coach");
        assert_eq!(req.messages, vec![Message::user("plan please")]);
        assert_eq!(req.max_tokens, 4096);
    }

    #[test]
    fn missing_credential_message_names_variable() {
        let err = LlmError::MissingCredential(API_KEY_ENV);
        assert_eq!(
            err.to_string(),
            "ANTHROPIC_API_KEY environment variable is not set"
        );
    }
}
