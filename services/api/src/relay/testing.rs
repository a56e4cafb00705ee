//! Test doubles for the relay: an in-process websocket endpoint and a
//! recording event sink.

use crate::config::Config;
use crate::registry::{Session, SessionRegistry};
use crate::relay::events::AgentEventSink;
use crate::state::AppState;
use elevenlabs_convai::ConvaiConnector;
use elevenlabs_convai::protocol::ServerEvent;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::Message;
use uuid::Uuid;

/// Event sink that records everything it sees.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<ServerEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<ServerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl AgentEventSink for RecordingSink {
    fn handle(&self, _conversation_id: Uuid, event: &ServerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// An in-process stand-in for the Conversational AI endpoint.
///
/// Accepts a single websocket connection, records every JSON frame the relay
/// sends, and plays back whatever the test pushes through [`send`]. Once the
/// connection ends the inbound channel closes, which is what [`closed`]
/// waits for.
///
/// [`send`]: MockEndpoint::send
/// [`closed`]: MockEndpoint::closed
pub(crate) struct MockEndpoint {
    pub(crate) url: String,
    auth_header: Arc<Mutex<Option<String>>>,
    inbound: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Message>,
}

impl MockEndpoint {
    pub(crate) async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let auth_header = Arc::new(Mutex::new(None));
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        let captured_auth = auth_header.clone();
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let callback = |request: &Request, response: Response| {
                *captured_auth.lock().unwrap() = request
                    .headers()
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned);
                Ok(response)
            };
            let Ok(socket) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                return;
            };
            let (mut ws_tx, mut ws_rx) = socket.split();

            loop {
                tokio::select! {
                    frame = ws_rx.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let value: Value = serde_json::from_str(text.as_str()).unwrap();
                            if inbound_tx.send(value).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(_)) => break,
                    },
                    Some(message) = outbound_rx.recv() => {
                        let closing = matches!(message, Message::Close(_));
                        if ws_tx.send(message).await.is_err() || closing {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            url: format!("ws://{addr}"),
            auth_header,
            inbound,
            outbound,
        }
    }

    /// Pushes a message to the connected relay. Silently dropped if the
    /// connection is already gone.
    pub(crate) fn send(&self, message: Message) {
        let _ = self.outbound.send(message);
    }

    pub(crate) fn send_json(&self, value: Value) {
        self.send(Message::Text(value.to_string().into()));
    }

    /// Closes the websocket from the endpoint side.
    pub(crate) fn close(&self) {
        self.send(Message::Close(None));
    }

    /// Waits for the next JSON frame sent by the relay.
    pub(crate) async fn next_frame(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(2), self.inbound.recv())
            .await
            .expect("timed out waiting for a frame from the relay")
            .expect("endpoint connection ended before a frame arrived")
    }

    /// Asserts that no further frame arrives within a short window.
    pub(crate) async fn expect_silence(&mut self) {
        let outcome = tokio::time::timeout(Duration::from_millis(200), self.inbound.recv()).await;
        assert!(outcome.is_err(), "expected no frame, got {outcome:?}");
    }

    /// Resolves once the relay's connection has gone away.
    pub(crate) async fn closed(&mut self) {
        loop {
            match tokio::time::timeout(Duration::from_secs(2), self.inbound.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_) => panic!("timed out waiting for the relay to disconnect"),
            }
        }
    }

    pub(crate) fn auth_header(&self) -> Option<String> {
        self.auth_header.lock().unwrap().clone()
    }
}

/// Builds an [`AppState`] wired to `endpoint_url`, returning the recording
/// sink alongside so tests can inspect relayed events.
pub(crate) fn test_state(endpoint_url: &str) -> (Arc<AppState>, Arc<RecordingSink>) {
    test_state_with_timeout(endpoint_url, Some(Duration::from_secs(5)))
}

pub(crate) fn test_state_with_timeout(
    endpoint_url: &str,
    connect_timeout: Option<Duration>,
) -> (Arc<AppState>, Arc<RecordingSink>) {
    let recorder = Arc::new(RecordingSink::default());
    let config = Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        api_key: "test-xi-key".to_string(),
        convai_endpoint: endpoint_url.to_string(),
        cors_allowed_origin: "http://localhost:3000".to_string(),
        connect_timeout,
        log_level: tracing::Level::INFO,
    };
    let state = AppState {
        registry: Arc::new(SessionRegistry::new()),
        connector: Arc::new(ConvaiConnector::new(endpoint_url, config.api_key.clone())),
        events: recorder.clone(),
        config: Arc::new(config),
    };
    (Arc::new(state), recorder)
}

/// Polls until `session` reports the wanted active state.
pub(crate) async fn wait_for_active(session: &Session, want: bool) {
    for _ in 0..200 {
        if session.is_active().await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached active={want}");
}

/// Polls until the recorder has seen at least `count` events.
pub(crate) async fn wait_for_events(recorder: &RecordingSink, count: usize) {
    for _ in 0..200 {
        if recorder.count() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} events, saw {}", recorder.count());
}
