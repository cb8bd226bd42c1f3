//! DebateView Core Library
//!
//! Client-side engine for streamed AI debates: session lifecycle,
//! per-turn SSE streaming, ordered event processing, transcript assembly,
//! and turn pacing.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod export;
pub mod pacing;
pub mod transcript;

pub use api::{DebateApi, HttpDebateApi, ModelInfo, StartRequest};
pub use config::Config;
pub use controller::{Command, ControllerOptions, DebateController, ViewEvent};
pub use error::DebateError;
pub use event::{Role, StreamEvent};
pub use pacing::PacingState;
pub use transcript::{Message, Transcript};
