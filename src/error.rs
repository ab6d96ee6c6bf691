use thiserror::Error;

use crate::cli::reflect::conversation_state::ConversationState;
use crate::cli::reflect::graph::Node;

/// A required setting for the text-generation service is absent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable '{0}'. Please set it before running the agent.")]
    Missing(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failures of a single call to the text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("empty response")]
    EmptyResponse,
}

/// Terminal failures of one loop run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No tweet content provided")]
    EmptySeed,
    #[error("{node} node failed after {} messages: {source}", .partial.len())]
    Generation {
        node: Node,
        /// Conversation as it stood before the failing call
        partial: ConversationState,
        #[source]
        source: GenerationError,
    },
}
