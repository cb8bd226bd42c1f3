//! The turn-streaming controller.
//!
//! Owns the session lifecycle, opens one stream per turn, applies the
//! incoming events in strict arrival order through a pause-aware FIFO
//! queue, and decides how the next turn is triggered.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{DebateApi, StartRequest, TurnItem, TurnStream};
use crate::error::DebateError;
use crate::event::{Role, StreamEvent};
use crate::pacing::{PacingState, TurnAdvance};
use crate::transcript::Transcript;

const CONNECTION_LOST: &str = "Connection to the debate server was lost";

/// Callback for view events.
pub type ViewCallback = Box<dyn Fn(ViewEvent) + Send + Sync>;

/// Events surfaced to the rendering layer. Rendering is a projection of
/// controller state; the controller itself holds no presentation concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A turn was requested; show a latency placeholder.
    Thinking,
    /// The placeholder should be removed.
    ThinkingCleared,
    /// A new message opened in the transcript.
    MessageStarted { index: usize, role: Role },
    /// A fragment was appended to an existing message.
    MessageDelta { index: usize, fragment: String },
    /// A speaker finished; informational only.
    TurnEnded { speaker: String },
    /// Manual mode: the next turn is held until an advance action.
    AwaitingAdvance,
    /// The debate concluded normally.
    DebateEnded,
    /// A system notice (errors, connection loss, skipped events).
    Notice(String),
}

/// User actions fed into [`DebateController::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Advance to the next turn (manual mode).
    Advance,
    /// Toggle automatic playback.
    SetAutoPlay(bool),
    /// End the session and discard anything in flight.
    Stop,
}

/// Controller configuration, read once at construction.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Whether turns advance automatically.
    pub auto_play: bool,
    /// Delay between consecutive turns in auto-play, so turns stay
    /// visually distinguishable.
    pub turn_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            auto_play: true,
            turn_delay: Duration::from_millis(500),
        }
    }
}

/// An active debate session. Owned exclusively by the controller; cleared
/// on `end`, `error`, or stop. The start credential is sent with the
/// session-start request and never stored.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub topic: String,
    pub model: String,
    pub provider: String,
}

/// Drives a debate: session lifecycle, per-turn streaming, ordered event
/// application, and pacing.
pub struct DebateController {
    api: Box<dyn DebateApi>,
    options: ControllerOptions,
    session: Option<Session>,
    turn: Option<TurnStream>,
    queue: VecDeque<StreamEvent>,
    draining: bool,
    pacing: PacingState,
    transcript: Transcript,
    thinking: bool,
    callback: Option<ViewCallback>,
}

enum Input {
    Stream(Option<TurnItem>),
    Command(Option<Command>),
}

impl DebateController {
    pub fn new(api: Box<dyn DebateApi>, options: ControllerOptions) -> Self {
        let pacing = PacingState::new(options.auto_play);
        Self {
            api,
            options,
            session: None,
            turn: None,
            queue: VecDeque::new(),
            draining: false,
            pacing,
            transcript: Transcript::new(),
            thinking: false,
            callback: None,
        }
    }

    /// Set a callback for view events.
    pub fn with_callback(mut self, callback: ViewCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pacing(&self) -> &PacingState {
        &self.pacing
    }

    pub fn is_streaming(&self) -> bool {
        self.turn.is_some()
    }

    /// Start a new debate session and its first turn.
    ///
    /// Fails without creating a session when the topic or model is missing
    /// or the start request is rejected.
    pub async fn start(
        &mut self,
        topic: &str,
        model: &str,
        provider: &str,
        credential: Option<String>,
    ) -> Result<(), DebateError> {
        if topic.trim().is_empty() {
            return Err(DebateError::MissingTopic);
        }
        if model.trim().is_empty() {
            return Err(DebateError::MissingModel);
        }

        let request = StartRequest {
            topic: topic.to_string(),
            model: model.to_string(),
            provider: provider.to_string(),
            credential,
        };
        let session_id = self.api.start_session(&request).await?;

        self.transcript.clear();
        self.queue.clear();
        self.pacing.reset();
        self.session = Some(Session {
            id: session_id,
            topic: request.topic,
            model: request.model,
            provider: request.provider,
        });

        if let Err(e) = self.stream_turn().await {
            self.stop();
            return Err(e);
        }
        Ok(())
    }

    /// Process stream events and user commands until the debate ends or a
    /// stop is requested. Dropping the command sender counts as a stop.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while self.session.is_some() {
            let input = match self.turn.as_mut() {
                Some(turn) => tokio::select! {
                    item = turn.rx.recv() => Input::Stream(item),
                    command = commands.recv() => Input::Command(command),
                },
                None => Input::Command(commands.recv().await),
            };

            match input {
                Input::Stream(Some(Ok(event))) => {
                    self.enqueue(event);
                    self.drain().await;
                }
                Input::Stream(Some(Err(e))) => {
                    // Malformed payload: report it and keep the turn alive.
                    warn!("skipping malformed event: {}", e);
                    self.emit(ViewEvent::Notice(e.to_string()));
                }
                Input::Stream(None) => {
                    // The pump always sends a terminal item first, so a bare
                    // close means the transport went away under us.
                    self.enqueue(StreamEvent::Error {
                        content: CONNECTION_LOST.to_string(),
                    });
                    self.drain().await;
                }
                Input::Command(Some(command)) => {
                    if !self.handle_command(command).await {
                        break;
                    }
                }
                Input::Command(None) => {
                    self.stop();
                    break;
                }
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Advance => {
                if self.pacing.advance() {
                    self.request_next_turn().await;
                    self.drain().await;
                }
                true
            }
            Command::SetAutoPlay(auto_play) => {
                if self.pacing.set_auto_play(auto_play) {
                    // A held turn fires immediately, without the delay.
                    self.request_next_turn().await;
                    self.drain().await;
                }
                true
            }
            Command::Stop => {
                self.stop();
                false
            }
        }
    }

    /// End the session unconditionally: close any open stream, drop the
    /// session id, discard queued events, and reset pacing. Safe from any
    /// state, including mid-stream; idempotent.
    pub fn stop(&mut self) {
        self.close_turn();
        self.session = None;
        self.queue.clear();
        self.draining = false;
        self.clear_thinking();
        self.pacing.reset();
    }

    /// Open the stream for the next turn of the active session.
    ///
    /// Closes any previously open stream first. `NoActiveSession` here is
    /// an ordering bug in the caller, not a user-facing condition.
    async fn stream_turn(&mut self) -> Result<(), DebateError> {
        let session_id = self
            .session
            .as_ref()
            .map(|s| s.id.clone())
            .ok_or(DebateError::NoActiveSession)?;

        self.close_turn();
        self.thinking = true;
        self.emit(ViewEvent::Thinking);

        debug!(session_id = %session_id, "opening turn stream");
        let turn = self.api.open_turn(&session_id).await?;
        self.turn = Some(turn);
        Ok(())
    }

    /// Open the next turn, ending the session on failure. Errors here are
    /// terminal like any other: the user starts a new session.
    async fn request_next_turn(&mut self) {
        if self.session.is_none() {
            return;
        }
        if let Err(e) = self.stream_turn().await {
            warn!("failed to open next turn: {}", e);
            self.close_turn();
            self.session = None;
            self.clear_thinking();
            self.emit(ViewEvent::Notice(format!("Failed to start next turn: {}", e)));
        }
    }

    fn enqueue(&mut self, event: StreamEvent) {
        self.queue.push_back(event);
    }

    /// Apply queued events in arrival order. Reentrant calls are no-ops;
    /// while the pacing gate is closed nothing is removed, so a later
    /// drain resumes exactly where this one paused.
    async fn drain(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;

        while !self.pacing.waiting_for_next() {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            if let Err(e) = self.apply_event(event).await {
                // One bad event must not cost us the rest of the queue.
                warn!("error applying event: {}", e);
                self.emit(ViewEvent::Notice(format!("Error processing event: {}", e)));
            }
        }

        self.draining = false;
    }

    async fn apply_event(&mut self, event: StreamEvent) -> Result<(), DebateError> {
        match event {
            StreamEvent::Token { role, content } => {
                self.clear_thinking();
                let update = self.transcript.apply_token(role, &content);
                if update.started {
                    self.emit(ViewEvent::MessageStarted {
                        index: update.index,
                        role,
                    });
                }
                self.emit(ViewEvent::MessageDelta {
                    index: update.index,
                    fragment: content,
                });
            }
            StreamEvent::TurnEnd { role } => {
                debug!(speaker = %role, "turn ended");
                self.emit(ViewEvent::TurnEnded { speaker: role });
            }
            StreamEvent::StreamEnd => {
                self.close_turn();
                match self.pacing.on_stream_end() {
                    TurnAdvance::Automatic => {
                        tokio::time::sleep(self.options.turn_delay).await;
                        if self.session.is_some() {
                            self.request_next_turn().await;
                        }
                    }
                    TurnAdvance::Hold => self.emit(ViewEvent::AwaitingAdvance),
                }
            }
            StreamEvent::End => {
                self.close_turn();
                self.session = None;
                self.clear_thinking();
                self.emit(ViewEvent::DebateEnded);
            }
            StreamEvent::Error { content } => {
                self.close_turn();
                self.session = None;
                self.clear_thinking();
                self.emit(ViewEvent::Notice(content));
            }
        }
        Ok(())
    }

    fn close_turn(&mut self) {
        if let Some(mut turn) = self.turn.take() {
            turn.close();
        }
    }

    fn clear_thinking(&mut self) {
        if self.thinking {
            self.thinking = false;
            self.emit(ViewEvent::ThinkingCleared);
        }
    }

    fn emit(&self, event: ViewEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}
