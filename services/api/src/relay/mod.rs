//! Session relay between HTTP clients and the Conversational AI websocket.
//!
//! The coordinator owns the upstream connection lifecycle: it dials the
//! endpoint, installs the write half on the session, drives the read loop,
//! and tears everything down again.

pub mod events;

mod coordinator;

pub use coordinator::{RelayError, close_session, send_audio, spawn_conversation};

#[cfg(test)]
pub(crate) mod testing;
