//! Error types for the application

use thiserror::Error;

/// Result type alias using our FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Main error type for the flow pipelines and their collaborators
#[derive(Error, Debug)]
pub enum FlowError {
    /// WebSocket connection errors
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    /// WebSocket send/receive errors
    #[error("WebSocket communication error: {0}")]
    WebSocketCommunication(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Compressed frame could not be inflated
    #[error("Decompression error: {0}")]
    Decompress(#[from] std::io::Error),

    /// Database errors from the section store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No pipeline registered for the symbol
    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    /// Channel send errors
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for FlowError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FlowError::WebSocketCommunication(err.to_string())
    }
}

impl From<config::ConfigError> for FlowError {
    fn from(err: config::ConfigError) -> Self {
        FlowError::Configuration(err.to_string())
    }
}
