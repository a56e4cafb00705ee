//! API Models
//!
//! This module defines the request and response bodies of the relay's HTTP
//! surface, annotated for OpenAPI documentation with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct StartConversationPayload {
    /// Identifier of the Conversational AI agent to talk to.
    #[schema(example = "agent_4901k2tkkq54f4mvgpndm3ngg6gb")]
    pub agent_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EndConversationPayload {
    #[schema(value_type = Option<String>, format = Uuid)]
    pub conversation_id: Option<String>,
}

/// Multipart form consumed by the send-audio endpoint. Documentation only;
/// the handler reads the parts directly.
#[derive(ToSchema)]
pub struct SendAudioForm {
    #[schema(value_type = String, format = Uuid)]
    pub conversation_id: String,
    /// Raw audio bytes to forward to the agent.
    #[schema(value_type = String, format = Binary)]
    pub audio: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct StartConversationResponse {
    pub success: bool,
    #[schema(value_type = String, format = Uuid)]
    pub conversation_id: Uuid,
    pub agent_id: String,
}

/// Body returned by endpoints that acknowledge without further detail.
#[derive(Serialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct AgentInfoResponse {
    pub agent_id: String,
    pub name: String,
    pub has_mcp_server: bool,
    pub mcp_servers: Vec<String>,
}

impl AgentInfoResponse {
    /// Placeholder profile; agent metadata is not fetched from the
    /// ElevenLabs management API yet.
    pub fn stub(agent_id: String) -> Self {
        Self {
            agent_id,
            name: "Your Agent Name".to_string(),
            has_mcp_server: true,
            mcp_servers: vec!["Dedalus Anthropic Search MCP".to_string()],
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ConversationStatusResponse {
    #[schema(value_type = String, format = Uuid)]
    pub conversation_id: Uuid,
    pub agent_id: String,
    pub active: bool,
    pub age_secs: u64,
}
