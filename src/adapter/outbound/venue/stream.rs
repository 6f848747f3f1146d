//! Websocket transport shared by every venue protocol.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{error, info, trace, warn};

use super::VenueProtocol;
use crate::domain::id::{Symbol, VenueId};
use crate::error::{Error, Result};
use crate::port::{MarketDataStream, MarketEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One websocket connection to a venue's public depth channel.
///
/// Close frames and transport errors surface as
/// [`MarketEvent::Disconnected`]; frames that fail to parse are logged and
/// skipped.
pub struct WsFeed<P: VenueProtocol> {
    venue: VenueId,
    url: String,
    protocol: P,
    ws: Option<Socket>,
}

impl<P: VenueProtocol> WsFeed<P> {
    pub fn new(venue: VenueId, url: impl Into<String>, protocol: P) -> Self {
        Self {
            venue,
            url: url.into(),
            protocol,
            ws: None,
        }
    }

    fn disconnected(&mut self, reason: String) -> MarketEvent {
        self.ws = None;
        MarketEvent::Disconnected { reason }
    }
}

#[async_trait]
impl<P: VenueProtocol> MarketDataStream for WsFeed<P> {
    async fn connect(&mut self) -> Result<()> {
        info!(venue = %self.venue, url = %self.url, "Connecting to WebSocket");
        let (ws, response) = connect_async(self.url.as_str()).await?;
        info!(venue = %self.venue, status = %response.status(), "WebSocket connected");
        self.ws = Some(ws);
        Ok(())
    }

    async fn subscribe(&mut self, symbols: &[Symbol]) -> Result<()> {
        let frames = self.protocol.subscribe_messages(symbols)?;
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".into()))?;

        info!(venue = %self.venue, symbols = ?symbols, "Subscribing to depth");
        for frame in frames {
            ws.send(Message::Text(frame)).await?;
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            let ws = self.ws.as_mut()?;
            let frame = match ws.next().await {
                Some(frame) => frame,
                None => return Some(self.disconnected("stream ended".into())),
            };

            match frame {
                Ok(Message::Text(text)) => {
                    trace!(venue = %self.venue, bytes = text.len(), "Received text frame");
                    match self.protocol.parse(&self.venue, &text) {
                        Ok(Some(delta)) => return Some(MarketEvent::Depth(delta)),
                        Ok(None) => {}
                        Err(e) => {
                            warn!(venue = %self.venue, error = %e, bytes = text.len(), "Failed to parse message");
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    trace!(venue = %self.venue, "Received ping");
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return Some(self.disconnected(format!("failed to send pong: {e}")));
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(venue = %self.venue, frame = ?frame, "WebSocket closed by server");
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    return Some(self.disconnected(reason));
                }
                Ok(_) => {}
                Err(e) => {
                    error!(venue = %self.venue, error = %e, "WebSocket error");
                    return Some(self.disconnected(e.to_string()));
                }
            }
        }
    }

    fn venue(&self) -> &VenueId {
        &self.venue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::venue::OkxProtocol;

    #[tokio::test]
    async fn unconnected_feed_has_no_events() {
        let mut feed = WsFeed::new(VenueId::from("okx"), "wss://example.invalid/ws", OkxProtocol::new());
        assert_eq!(feed.venue(), &VenueId::from("okx"));
        assert!(feed.next_event().await.is_none());
    }

    #[tokio::test]
    async fn subscribe_requires_connection() {
        let mut feed = WsFeed::new(VenueId::from("okx"), "wss://example.invalid/ws", OkxProtocol::new());
        let err = feed.subscribe(&[Symbol::from("BTC/USDT")]).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
