//! Error types for the debate client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Topic must not be empty")]
    MissingTopic,

    #[error("No model selected")]
    MissingModel,

    #[error("Failed to start debate session: {0}")]
    SessionStart(String),

    #[error("No active debate session")]
    NoActiveSession,

    #[error("Malformed stream event: {0}")]
    MalformedEvent(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
