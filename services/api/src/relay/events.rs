//! Consumers for events arriving from the conversation endpoint.

use elevenlabs_convai::protocol::ServerEvent;
use tracing::{debug, info};
use uuid::Uuid;

/// Receives every decoded frame the endpoint sends for a conversation.
///
/// Implementations must be cheap and non-blocking; the receive loop calls
/// them inline between frames.
pub trait AgentEventSink: Send + Sync {
    fn handle(&self, conversation_id: Uuid, event: &ServerEvent);
}

/// Default sink that writes conversation traffic to the log.
pub struct LogEventSink;

impl AgentEventSink for LogEventSink {
    fn handle(&self, conversation_id: Uuid, event: &ServerEvent) {
        match event {
            ServerEvent::ConversationInitiationMetadata(meta) => {
                info!(
                    %conversation_id,
                    endpoint_conversation_id = %meta.conversation_id,
                    "Conversation initiated"
                );
            }
            ServerEvent::AgentResponse(response) => {
                info!(%conversation_id, response = %response.agent_response, "Agent response");
            }
            ServerEvent::UserTranscript(transcript) => {
                info!(%conversation_id, transcript = %transcript.user_transcript, "User transcript");
            }
            ServerEvent::Audio(audio) => {
                debug!(%conversation_id, encoded_len = audio.audio_base_64.len(), "Agent audio chunk");
            }
            ServerEvent::Ping(ping) => {
                debug!(%conversation_id, event_id = ping.event_id, "Ping from endpoint");
            }
            ServerEvent::Interruption(interruption) => {
                info!(%conversation_id, event_id = interruption.event_id, "Agent interrupted");
            }
            ServerEvent::Other(value) => {
                debug!(%conversation_id, frame = %value, "Unhandled event type");
            }
        }
    }
}
