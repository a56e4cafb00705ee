//! Connection handling for the Conversational AI websocket endpoint.

use futures_util::stream::{SplitSink, SplitStream};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, InvalidHeaderValue};
use tokio_tungstenite::tungstenite::http::{self, HeaderValue, Uri};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

/// A live websocket to the conversation endpoint.
pub type ConvaiSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
/// Write half of a [`ConvaiSocket`].
pub type ConvaiSink = SplitSink<ConvaiSocket, Message>;
/// Read half of a [`ConvaiSocket`].
pub type ConvaiStream = SplitStream<ConvaiSocket>;

#[derive(Debug, thiserror::Error)]
pub enum ConvaiError {
    #[error("endpoint URL is not valid: {0}")]
    InvalidEndpoint(#[from] http::Error),
    #[error("API key is not a valid header value")]
    InvalidCredential(#[from] InvalidHeaderValue),
    #[error("websocket connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Dials the Conversational AI endpoint on behalf of an agent.
///
/// Holds the endpoint URL and API key; a single connector serves any number
/// of concurrent conversations.
pub struct ConvaiConnector {
    endpoint: String,
    api_key: SecretString,
}

impl ConvaiConnector {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds the handshake request for an agent, attaching the bearer key.
    ///
    /// The request target always carries a leading path, so a pathless
    /// endpoint like `ws://gateway:9000` dials with origin-form
    /// `/?agent_id=...` rather than the invalid `?agent_id=...`.
    fn request_for_agent(&self, agent_id: &str) -> Result<Request, ConvaiError> {
        let endpoint: Uri = self.endpoint.parse().map_err(http::Error::from)?;
        let path = match endpoint.path() {
            "" => "/",
            path => path,
        };
        let path_and_query = match endpoint.query() {
            Some(query) => format!("{path}?{query}&agent_id={agent_id}"),
            None => format!("{path}?agent_id={agent_id}"),
        };

        let mut parts = endpoint.into_parts();
        parts.path_and_query = Some(path_and_query.parse().map_err(http::Error::from)?);
        let uri = Uri::from_parts(parts).map_err(http::Error::from)?;

        let mut request = uri.into_client_request()?;
        let bearer: HeaderValue = format!("Bearer {}", self.api_key.expose_secret()).parse()?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        Ok(request)
    }

    /// Opens a websocket for one conversation with `agent_id`.
    pub async fn connect(&self, agent_id: &str) -> Result<ConvaiSocket, ConvaiError> {
        let request = self.request_for_agent(agent_id)?;
        debug!(endpoint = %self.endpoint, agent_id, "Dialing conversation endpoint");
        let (socket, _response) = connect_async(request).await?;
        Ok(socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_targets_agent_url() {
        let connector =
            ConvaiConnector::new("ws://127.0.0.1:9100/v1/convai/conversation", "xi-test-key");
        assert_eq!(
            connector.endpoint(),
            "ws://127.0.0.1:9100/v1/convai/conversation"
        );

        let request = connector.request_for_agent("agent-42").unwrap();
        assert_eq!(
            request.uri().to_string(),
            "ws://127.0.0.1:9100/v1/convai/conversation?agent_id=agent-42"
        );
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer xi-test-key"
        );
    }

    #[test]
    fn test_request_normalizes_pathless_endpoint() {
        let connector = ConvaiConnector::new("ws://127.0.0.1:9100", "xi-test-key");
        let request = connector.request_for_agent("agent-42").unwrap();
        assert_eq!(
            request.uri().path_and_query().unwrap().as_str(),
            "/?agent_id=agent-42"
        );
        assert_eq!(
            request.uri().to_string(),
            "ws://127.0.0.1:9100/?agent_id=agent-42"
        );
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let connector = ConvaiConnector::new("ws://bad host:9100", "xi-test-key");
        assert!(matches!(
            connector.request_for_agent("agent-1"),
            Err(ConvaiError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let connector = ConvaiConnector::new("ws://127.0.0.1:9100", "bad\nkey");
        assert!(matches!(
            connector.request_for_agent("agent-1"),
            Err(ConvaiError::InvalidCredential(_))
        ));
    }
}
