//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling the HTTP requests that drive
//! the conversation relay. It uses `utoipa` doc comments to generate OpenAPI
//! documentation.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    models::{
        AckResponse, AgentInfoResponse, ConversationStatusResponse, EndConversationPayload,
        ErrorResponse, SendAudioForm, StartConversationPayload, StartConversationResponse,
    },
    registry::Session,
    relay,
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::NotFound(error) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { error })).into_response()
            }
            ApiError::Conflict(error) => {
                (StatusCode::CONFLICT, Json(ErrorResponse { error })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let error = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { error }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Register a conversation and start connecting it to an agent.
///
/// The response is returned as soon as the session exists; the websocket
/// handshake continues in the background and the session becomes active once
/// it succeeds.
#[utoipa::path(
    post,
    path = "/start-conversation",
    request_body = StartConversationPayload,
    responses(
        (status = 200, description = "Conversation registered", body = StartConversationResponse),
        (status = 400, description = "Missing agent id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn start_conversation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartConversationPayload>,
) -> Result<Json<StartConversationResponse>, ApiError> {
    let agent_id = payload
        .agent_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Agent ID is required".to_string()))?;

    let session = state.registry.create(agent_id).await;
    let handle = relay::spawn_conversation(state.clone(), session.clone());
    session.attach_task(handle).await;
    info!(conversation_id = %session.conversation_id, agent_id, "Conversation registered");

    Ok(Json(StartConversationResponse {
        success: true,
        conversation_id: session.conversation_id,
        agent_id: agent_id.to_string(),
    }))
}

/// Forward a chunk of caller audio into a conversation.
///
/// Accepts multipart form data with a `conversation_id` field and an `audio`
/// file. The chunk is forwarded asynchronously; a success response means the
/// chunk was accepted for delivery, not that it reached the agent.
#[utoipa::path(
    post,
    path = "/send-audio",
    request_body(content = SendAudioForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Audio accepted for delivery", body = AckResponse),
        (status = 400, description = "Missing form fields", body = ErrorResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse),
        (status = 409, description = "Conversation is not active", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn send_audio(
    State(state): State<Arc<AppState>>,
    mut form: Multipart,
) -> Result<Json<AckResponse>, ApiError> {
    let mut conversation_id: Option<String> = None;
    let mut audio: Option<Bytes> = None;
    while let Some(field) = form.next_field().await.map_err(malformed_form)? {
        match field.name() {
            Some("conversation_id") => {
                conversation_id = Some(field.text().await.map_err(malformed_form)?);
            }
            Some("audio") => {
                audio = Some(field.bytes().await.map_err(malformed_form)?);
            }
            _ => {}
        }
    }

    let conversation_id = conversation_id.filter(|id| !id.is_empty());
    let (Some(conversation_id), Some(audio)) = (conversation_id, audio) else {
        return Err(ApiError::BadRequest(
            "Conversation ID and audio file required".to_string(),
        ));
    };

    let session = lookup_session(&state, &conversation_id).await?;
    if !session.is_active().await {
        return Err(ApiError::Conflict("Conversation is not active".to_string()));
    }

    tokio::spawn(async move {
        if let Err(e) = relay::send_audio(&session, audio).await {
            warn!(
                conversation_id = %session.conversation_id,
                error = %e,
                "Failed to forward audio chunk"
            );
        }
    });

    Ok(Json(AckResponse::ok()))
}

/// End a conversation and release its resources.
///
/// Unknown and malformed ids are acknowledged the same as live ones, so
/// clients can always call this during teardown.
#[utoipa::path(
    post,
    path = "/end-conversation",
    request_body = EndConversationPayload,
    responses(
        (status = 200, description = "Conversation ended, or was already gone", body = AckResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn end_conversation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EndConversationPayload>,
) -> Result<Json<AckResponse>, ApiError> {
    if let Some(raw_id) = payload.conversation_id.as_deref() {
        if let Ok(conversation_id) = Uuid::parse_str(raw_id) {
            if let Some(session) = state.registry.remove(&conversation_id).await {
                relay::close_session(&session).await;
                info!(%conversation_id, "Conversation ended");
            }
        }
    }
    Ok(Json(AckResponse::ok()))
}

/// Fetch display information about an agent.
#[utoipa::path(
    get,
    path = "/get-agent-info/{agent_id}",
    responses(
        (status = 200, description = "Agent information", body = AgentInfoResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("agent_id" = String, Path, description = "Agent identifier")
    )
)]
pub async fn get_agent_info(
    Path(agent_id): Path<String>,
) -> Result<Json<AgentInfoResponse>, ApiError> {
    Ok(Json(AgentInfoResponse::stub(agent_id)))
}

/// Report whether a conversation is still connected upstream.
#[utoipa::path(
    get,
    path = "/conversation-status/{conversation_id}",
    responses(
        (status = 200, description = "Current conversation state", body = ConversationStatusResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("conversation_id" = Uuid, Path, description = "Conversation identifier")
    )
)]
pub async fn conversation_status(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationStatusResponse>, ApiError> {
    let session = lookup_session(&state, &conversation_id).await?;
    Ok(Json(ConversationStatusResponse {
        conversation_id: session.conversation_id,
        agent_id: session.agent_id.clone(),
        active: session.is_active().await,
        age_secs: session.age().as_secs(),
    }))
}

/// Resolves a conversation id from request input. A malformed id maps to
/// not-found, the same as an unknown one.
async fn lookup_session(state: &AppState, raw_id: &str) -> Result<Arc<Session>, ApiError> {
    let conversation_id = Uuid::parse_str(raw_id)
        .map_err(|_| ApiError::NotFound("Conversation not found".to_string()))?;
    state
        .registry
        .get(&conversation_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))
}

fn malformed_form(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart form data: {err}"))
}
