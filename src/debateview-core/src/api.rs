//! HTTP interface to the debate server.
//!
//! The server exposes three endpoints: a model catalog, a session-start
//! request, and an SSE stream delivering one turn of generated content per
//! connection. `DebateApi` abstracts them so the controller can be driven
//! by a scripted fake in tests.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::DebateError;
use crate::event::StreamEvent;

/// How long a turn stream may stay silent before it is treated as lost.
const STREAM_IDLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

const CONNECTION_LOST: &str = "Connection to the debate server was lost";

/// An entry in the server's model catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Payload for the session-start request.
#[derive(Debug, Clone, Serialize)]
pub struct StartRequest {
    pub topic: String,
    pub model: String,
    pub provider: String,
    #[serde(rename = "google_api_key", skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    session_id: String,
}

/// One item received from a turn stream: a parsed event, or a payload that
/// failed to parse (recoverable; the turn continues).
pub type TurnItem = Result<StreamEvent, DebateError>;

/// Handle to one open turn stream. Dropping or closing it aborts the pump
/// task, which tears down the underlying connection.
pub struct TurnStream {
    pub rx: mpsc::UnboundedReceiver<TurnItem>,
    task: Option<JoinHandle<()>>,
}

impl TurnStream {
    pub fn new(rx: mpsc::UnboundedReceiver<TurnItem>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Close the stream. Safe to call on an already-closed stream.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TurnStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// The debate server's client-facing surface.
#[async_trait]
pub trait DebateApi: Send + Sync {
    /// Fetch the model catalog.
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, DebateError>;

    /// Start a debate session; returns the server-issued session id.
    async fn start_session(&self, request: &StartRequest) -> Result<String, DebateError>;

    /// Open the stream for the session's next turn.
    async fn open_turn(&self, session_id: &str) -> Result<TurnStream, DebateError>;
}

/// reqwest-backed implementation of [`DebateApi`].
#[derive(Clone)]
pub struct HttpDebateApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDebateApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DebateError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| DebateError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DebateApi for HttpDebateApi {
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, DebateError> {
        let response: ModelsResponse = self
            .http
            .get(format!("{}/models", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.models)
    }

    async fn start_session(&self, request: &StartRequest) -> Result<String, DebateError> {
        let response = self
            .http
            .post(format!("{}/start_debate", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| DebateError::SessionStart(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DebateError::SessionStart(format!("{}: {}", status, body)));
        }

        let start: StartResponse = response
            .json()
            .await
            .map_err(|e| DebateError::SessionStart(e.to_string()))?;
        debug!(session_id = %start.session_id, "debate session started");
        Ok(start.session_id)
    }

    async fn open_turn(&self, session_id: &str) -> Result<TurnStream, DebateError> {
        let response = self
            .http
            .get(format!("{}/next_turn", self.base_url))
            .query(&[("session_id", session_id)])
            .send()
            .await?
            .error_for_status()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump_events(response, tx));
        Ok(TurnStream::new(rx, task))
    }
}

/// Forward SSE payloads from one turn's connection into the channel, in
/// receipt order, until a terminal event or transport failure.
///
/// A disconnect, idle timeout, or stream close that is not preceded by a
/// terminal event is surfaced as a locally injected `error` event so
/// downstream handling is uniform.
async fn pump_events(response: reqwest::Response, tx: mpsc::UnboundedSender<TurnItem>) {
    let mut stream = response.bytes_stream().eventsource();

    loop {
        let sse = match timeout(STREAM_IDLE_TIMEOUT, stream.next()).await {
            Ok(Some(Ok(sse))) => sse,
            Ok(Some(Err(e))) => {
                warn!("turn stream transport error: {}", e);
                let _ = tx.send(Ok(StreamEvent::Error {
                    content: CONNECTION_LOST.to_string(),
                }));
                return;
            }
            Ok(None) => {
                warn!("turn stream closed before a terminal event");
                let _ = tx.send(Ok(StreamEvent::Error {
                    content: CONNECTION_LOST.to_string(),
                }));
                return;
            }
            Err(_) => {
                warn!(
                    "turn stream idle for {}s, giving up",
                    STREAM_IDLE_TIMEOUT.as_secs()
                );
                let _ = tx.send(Ok(StreamEvent::Error {
                    content: CONNECTION_LOST.to_string(),
                }));
                return;
            }
        };

        match serde_json::from_str::<StreamEvent>(&sse.data) {
            Ok(event) => {
                let terminal = event.is_terminal();
                if tx.send(Ok(event)).is_err() {
                    return;
                }
                if terminal {
                    return;
                }
            }
            Err(e) => {
                warn!("unparseable stream payload: {} ({})", sse.data, e);
                let malformed = DebateError::MalformedEvent(format!("{}: {}", e, sse.data));
                if tx.send(Err(malformed)).is_err() {
                    return;
                }
            }
        }
    }
}
