//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the session registry, the upstream connector, and
//! the sink that consumes agent events.

use crate::config::Config;
use crate::registry::SessionRegistry;
use crate::relay::events::AgentEventSink;
use elevenlabs_convai::ConvaiConnector;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub connector: Arc<ConvaiConnector>,
    pub events: Arc<dyn AgentEventSink>,
    pub config: Arc<Config>,
}
