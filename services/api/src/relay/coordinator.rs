//! Drives one upstream conversation per session: handshake, initiation,
//! receive loop, outbound audio, and teardown.

use crate::registry::Session;
use crate::relay::events::AgentEventSink;
use crate::state::AppState;
use bytes::Bytes;
use elevenlabs_convai::protocol::{ClientEvent, ServerEvent};
use elevenlabs_convai::{ConvaiError, ConvaiSink, ConvaiStream, Message, WsError};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

/// Failures surfaced by relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("conversation is not active")]
    SessionInactive,
    #[error("failed to reach the conversation endpoint: {0}")]
    Connect(#[from] ConvaiError),
    #[error("timed out connecting to the conversation endpoint")]
    ConnectTimeout,
    #[error("conversation transport failed: {0}")]
    Transport(#[from] WsError),
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Launches the background task that dials the endpoint and relays events
/// for `session`. Returns the task handle so the caller can attach it to
/// the session for later cancellation.
pub fn spawn_conversation(state: Arc<AppState>, session: Arc<Session>) -> JoinHandle<()> {
    let span = tracing::info_span!(
        "conversation",
        conversation_id = %session.conversation_id,
        agent_id = %session.agent_id,
    );
    tokio::spawn(run_conversation(state, session).instrument(span))
}

async fn run_conversation(state: Arc<AppState>, session: Arc<Session>) {
    let stream = match open_connection(&state, &session).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Failed to start conversation");
            return;
        }
    };
    info!("Connected to conversation endpoint");

    receive_loop(&session, stream, state.events.as_ref()).await;
}

/// Dials the endpoint, sends the initiation frame, and installs the write
/// half on the session. The session only becomes active once the initiation
/// frame is on the wire; any earlier failure leaves it inactive.
async fn open_connection(state: &AppState, session: &Session) -> Result<ConvaiStream, RelayError> {
    let handshake = async {
        let socket = state.connector.connect(&session.agent_id).await?;
        let (mut sink, stream) = socket.split();
        send_event(&mut sink, &ClientEvent::initiation(session.conversation_id)).await?;
        Ok::<_, RelayError>((sink, stream))
    };

    let (sink, stream) = match state.config.connect_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| RelayError::ConnectTimeout)??,
        None => handshake.await?,
    };

    let mut conn = session.conn.lock().await;
    conn.sink = Some(sink);
    conn.active = true;
    Ok(stream)
}

/// Forwards every frame from the endpoint to the event sink until the
/// connection ends, then marks the session inactive and releases the sink.
async fn receive_loop(session: &Session, mut stream: ConvaiStream, events: &dyn AgentEventSink) {
    while let Some(next) = stream.next().await {
        match next {
            Ok(Message::Text(text)) => match ServerEvent::parse(text.as_str()) {
                Ok(event) => events.handle(session.conversation_id, &event),
                Err(e) => {
                    warn!(error = %e, "Ending conversation on undecodable frame");
                    break;
                }
            },
            Ok(Message::Binary(data)) => match ServerEvent::parse_slice(&data) {
                Ok(event) => events.handle(session.conversation_id, &event),
                Err(e) => {
                    warn!(error = %e, "Ending conversation on undecodable frame");
                    break;
                }
            },
            Ok(Message::Close(frame)) => {
                info!(?frame, "Conversation closed by endpoint");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Conversation stream error");
                break;
            }
        }
    }

    let mut conn = session.conn.lock().await;
    conn.active = false;
    conn.sink = None;
    info!("Conversation is no longer active");
}

/// Forwards one chunk of caller audio to the endpoint.
///
/// The connection lock is held across the write, so concurrent sends cannot
/// interleave frames. A transport failure deactivates the session and later
/// sends fail fast with [`RelayError::SessionInactive`].
pub async fn send_audio(session: &Session, chunk: Bytes) -> Result<(), RelayError> {
    let mut conn = session.conn.lock().await;
    if !conn.active {
        return Err(RelayError::SessionInactive);
    }
    let Some(sink) = conn.sink.as_mut() else {
        return Err(RelayError::SessionInactive);
    };

    let event = ClientEvent::audio_chunk(&chunk);
    match send_event(sink, &event).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if matches!(err, RelayError::Transport(_)) {
                conn.active = false;
                conn.sink = None;
            }
            Err(err)
        }
    }
}

/// Tears a session down: cancels the read loop, closes the upstream socket,
/// and leaves the session inactive. Safe to call more than once.
pub async fn close_session(session: &Session) {
    session.abort_task().await;

    let mut conn = session.conn.lock().await;
    conn.active = false;
    if let Some(mut sink) = conn.sink.take() {
        if let Err(e) = sink.close().await {
            debug!(error = %e, "Close handshake with endpoint failed");
        }
    }
    info!(conversation_id = %session.conversation_id, "Conversation closed");
}

/// Serializes and writes one client event to the upstream sink.
async fn send_event(sink: &mut ConvaiSink, event: &ClientEvent) -> Result<(), RelayError> {
    let message = event.to_message()?;
    sink.send(message).await?;
    Ok(())
}
