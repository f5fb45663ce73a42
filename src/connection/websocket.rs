//! WebSocket transport over tokio-tungstenite

use super::{Connection, Connector, RawFrame, TransportError};
use crate::session::SessionId;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Connects to `{server_url}/ws/chat/{session_id}`
#[derive(Debug, Clone)]
pub struct WsConnector {
    server_url: String,
}

impl WsConnector {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }

    /// Chat endpoint for a session
    pub fn chat_url(&self, session_id: &SessionId) -> String {
        format!(
            "{}/ws/chat/{}",
            self.server_url.trim_end_matches('/'),
            session_id
        )
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, session_id: &SessionId) -> Result<Box<dyn Connection>, TransportError> {
        let url = self.chat_url(session_id);
        tracing::debug!(url = %url, "Opening chat connection");

        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(WsConnection { stream }))
    }
}

/// One live WebSocket
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<RawFrame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(RawFrame::Text(text))),
                Ok(Message::Binary(bytes)) => return Some(Ok(RawFrame::Binary(bytes))),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Server closed chat connection");
                    return None;
                }
                // Pings are answered by tungstenite on the next read
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "Error closing chat connection");
        }
    }
}
