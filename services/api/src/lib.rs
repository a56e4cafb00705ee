//! Conversation Relay Library Crate
//!
//! This library contains all the core logic for the conversation relay
//! service: the application state, the session registry, the upstream relay
//! coordinator, API handlers, and routing. The `api` binary is a thin
//! wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod relay;
pub mod router;
pub mod state;
