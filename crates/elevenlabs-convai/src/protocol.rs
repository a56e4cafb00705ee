//! Wire protocol for the ElevenLabs Conversational AI websocket.
//!
//! Every frame in either direction is a JSON object tagged by a `type` field.
//! The client vocabulary is closed and small; the server vocabulary is
//! open-ended, so decoding keeps unrecognized frames as [`ServerEvent::Other`]
//! instead of rejecting them.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::protocol::Message;
use uuid::Uuid;

/// Frames sent by the relay to the conversation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Opening frame announcing the relay-side conversation id.
    ConversationInitiationClientData { conversation_id: Uuid },
    /// A chunk of caller audio, base64-encoded.
    Audio { audio: String },
}

impl ClientEvent {
    pub fn initiation(conversation_id: Uuid) -> Self {
        Self::ConversationInitiationClientData { conversation_id }
    }

    /// Wraps raw audio bytes into an outbound audio frame.
    pub fn audio_chunk(chunk: &[u8]) -> Self {
        Self::Audio {
            audio: base64::engine::general_purpose::STANDARD.encode(chunk),
        }
    }

    /// Serializes the event into a websocket text message.
    pub fn to_message(&self) -> serde_json::Result<Message> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

/// Payload of a `conversation_initiation_metadata` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationInitiationMetadataEvent {
    /// The endpoint's own id for the conversation, distinct from ours.
    pub conversation_id: String,
    pub agent_output_audio_format: Option<String>,
    pub user_input_audio_format: Option<String>,
}

/// Payload of a `user_transcript` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserTranscriptionEvent {
    pub user_transcript: String,
}

/// Payload of an `agent_response` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentResponseEvent {
    pub agent_response: String,
}

/// Payload of an `audio` frame carrying agent speech.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioEvent {
    pub audio_base_64: String,
    pub event_id: Option<u64>,
}

/// Payload of a `ping` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingEvent {
    pub event_id: u64,
    pub ping_ms: Option<u64>,
}

/// Payload of an `interruption` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterruptionEvent {
    pub event_id: u64,
}

/// Frames received from the conversation endpoint.
///
/// The endpoint is free to introduce new frame types at any time. Anything
/// without a dedicated variant, including known types whose payload does not
/// match the expected shape, decodes as [`ServerEvent::Other`] so callers
/// still see the raw frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    ConversationInitiationMetadata(ConversationInitiationMetadataEvent),
    UserTranscript(UserTranscriptionEvent),
    AgentResponse(AgentResponseEvent),
    Audio(AudioEvent),
    Ping(PingEvent),
    Interruption(InterruptionEvent),
    Other(Value),
}

impl ServerEvent {
    /// Decodes a text frame.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self::classify)
    }

    /// Decodes a binary frame carrying JSON.
    pub fn parse_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes).map(Self::classify)
    }

    fn classify(value: Value) -> Self {
        match KnownEvent::deserialize(&value) {
            Ok(known) => known.into(),
            Err(_) => Self::Other(value),
        }
    }
}

/// Decode probe for the frame types the relay understands.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownEvent {
    ConversationInitiationMetadata {
        conversation_initiation_metadata_event: ConversationInitiationMetadataEvent,
    },
    UserTranscript {
        user_transcription_event: UserTranscriptionEvent,
    },
    AgentResponse {
        agent_response_event: AgentResponseEvent,
    },
    Audio {
        audio_event: AudioEvent,
    },
    Ping {
        ping_event: PingEvent,
    },
    Interruption {
        interruption_event: InterruptionEvent,
    },
}

impl From<KnownEvent> for ServerEvent {
    fn from(event: KnownEvent) -> Self {
        match event {
            KnownEvent::ConversationInitiationMetadata {
                conversation_initiation_metadata_event,
            } => Self::ConversationInitiationMetadata(conversation_initiation_metadata_event),
            KnownEvent::UserTranscript {
                user_transcription_event,
            } => Self::UserTranscript(user_transcription_event),
            KnownEvent::AgentResponse {
                agent_response_event,
            } => Self::AgentResponse(agent_response_event),
            KnownEvent::Audio { audio_event } => Self::Audio(audio_event),
            KnownEvent::Ping { ping_event } => Self::Ping(ping_event),
            KnownEvent::Interruption { interruption_event } => {
                Self::Interruption(interruption_event)
            }
        }
    }
}
