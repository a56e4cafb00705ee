//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AckResponse, AgentInfoResponse, ConversationStatusResponse, EndConversationPayload,
        ErrorResponse, SendAudioForm, StartConversationPayload, StartConversationResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::start_conversation,
        handlers::send_audio,
        handlers::end_conversation,
        handlers::get_agent_info,
        handlers::conversation_status,
    ),
    components(
        schemas(
            StartConversationPayload,
            StartConversationResponse,
            SendAudioForm,
            EndConversationPayload,
            AckResponse,
            AgentInfoResponse,
            ConversationStatusResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Conversation Relay", description = "HTTP front door for ElevenLabs Conversational AI sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/start-conversation", post(handlers::start_conversation))
        // Callers upload whole recordings in one request, which can exceed
        // the default request-body limit.
        .route(
            "/send-audio",
            post(handlers::send_audio).layer(DefaultBodyLimit::disable()),
        )
        .route("/end-conversation", post(handlers::end_conversation))
        .route("/get-agent-info/{agent_id}", get(handlers::get_agent_info))
        .route(
            "/conversation-status/{conversation_id}",
            get(handlers::conversation_status),
        )
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI routes.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
