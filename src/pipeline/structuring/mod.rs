//! Extraction request construction, the remote model client, and recovery of
//! a structured record from the model's raw reply.

pub mod checkbox;
pub mod gemini;
pub mod gemini_types;
pub mod parser;
pub mod prompt;
pub mod schema;
pub mod variants;

pub use checkbox::*;
pub use gemini::*;
pub use parser::*;
pub use prompt::*;
pub use schema::*;
pub use variants::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Extraction API is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Extraction API returned error (status {status}): {body}")]
    RemoteError { status: u16, body: String },

    #[error("No API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Request was blocked by the model: {0}")]
    Blocked(String),

    #[error("The model returned no text")]
    EmptyReply,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

impl StructuringError {
    /// True when the reply arrived but could not be turned into a record.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::MalformedResponse(_) | Self::JsonParsing(_))
    }
}
