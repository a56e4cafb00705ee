//! Minimal client for the ElevenLabs Conversational AI websocket API.
//!
//! [`ConvaiConnector`] performs the authenticated handshake and hands back a
//! socket; [`protocol`] models the JSON frames that travel over it. Session
//! bookkeeping is left to the caller.

pub mod protocol;

mod client;

pub use client::{ConvaiConnector, ConvaiError, ConvaiSink, ConvaiSocket, ConvaiStream};
pub use tokio_tungstenite::tungstenite::Error as WsError;
pub use tokio_tungstenite::tungstenite::protocol::Message;
