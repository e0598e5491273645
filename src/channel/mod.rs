//! Real-time chat channel.
//!
//! One WebSocket connection per open conversation, authenticated by sending
//! the bearer token as the first frame after the socket opens. The server
//! answers with a `connect` ack (or `connect_error`), after which inbound
//! `message` events are forwarded to the consumer through an mpsc queue by a
//! background reader task.
//!
//! Delivery is best effort: an outbound send while the channel is not
//! connected logs a warning and drops the message (nothing is queued or
//! retried), and a transport error tears the channel down without automatic
//! reconnection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::chat::message::WireMessage;
use crate::chat::transport::{MessageTransport, TransportConnector};
use crate::error::{Result, StrideError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// The event vocabulary spoken over the socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Frame {
    Auth {
        token: String,
    },
    Connect,
    ConnectError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Disconnect,
    Message {
        data: WireMessage,
    },
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A live channel to the chat server.
pub struct ChatChannel {
    writer: Arc<Mutex<WsSink>>,
    state_tx: Arc<watch::Sender<ChannelState>>,
    state_rx: watch::Receiver<ChannelState>,
    inbound_rx: mpsc::Receiver<WireMessage>,
    reader_task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatChannel").finish_non_exhaustive()
    }
}

impl ChatChannel {
    /// Default timeout for the connection handshake.
    pub(crate) fn default_timeout() -> Duration {
        Duration::from_secs(5)
    }

    /// Opens the socket and performs the auth handshake.
    ///
    /// The token is presented as the first frame; the call resolves once the
    /// server acks with `connect`, and fails on `connect_error`, a malformed
    /// ack, or a handshake timeout.
    pub async fn connect(url: &str, token: &str) -> Result<Self> {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let state_tx = Arc::new(state_tx);

        tracing::debug!(
            target: "stride::channel",
            "Connecting chat channel: {}",
            url
        );

        let (socket, _response) = connect_async(url).await?;
        let (mut writer, mut reader) = socket.split();

        let auth = Frame::Auth {
            token: token.to_string(),
        };
        writer
            .send(WsMessage::Text(serde_json::to_string(&auth)?))
            .await?;

        Self::await_connect_ack(&mut reader).await?;
        let _ = state_tx.send(ChannelState::Connected);
        tracing::debug!(target: "stride::channel", "Chat channel connected");

        let (inbound_tx, inbound_rx) = mpsc::channel(500);
        let reader_task = tokio::spawn(Self::read_loop(reader, inbound_tx, state_tx.clone()));

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            state_tx,
            state_rx,
            inbound_rx,
            reader_task,
        })
    }

    async fn await_connect_ack(reader: &mut WsSource) -> Result<()> {
        let ack = tokio::time::timeout(Self::default_timeout(), reader.next())
            .await
            .map_err(|_| StrideError::ChannelHandshake("timed out waiting for ack".to_string()))?;

        match ack {
            Some(Ok(WsMessage::Text(text))) => match serde_json::from_str::<Frame>(&text) {
                Ok(Frame::Connect) => Ok(()),
                Ok(Frame::ConnectError { message }) => Err(StrideError::ChannelHandshake(
                    message.unwrap_or_else(|| "connection rejected".to_string()),
                )),
                Ok(other) => Err(StrideError::ChannelHandshake(format!(
                    "unexpected frame during handshake: {:?}",
                    other
                ))),
                Err(e) => Err(StrideError::ChannelHandshake(format!(
                    "malformed ack frame: {}",
                    e
                ))),
            },
            Some(Ok(WsMessage::Close(_))) | None => {
                Err(StrideError::ChannelHandshake("socket closed".to_string()))
            }
            Some(Ok(_)) => Err(StrideError::ChannelHandshake(
                "unexpected non-text frame during handshake".to_string(),
            )),
            Some(Err(e)) => Err(e.into()),
        }
    }

    /// Forwards inbound `message` events until the socket closes or errors,
    /// then marks the channel disconnected.
    async fn read_loop(
        mut reader: WsSource,
        inbound_tx: mpsc::Sender<WireMessage>,
        state_tx: Arc<watch::Sender<ChannelState>>,
    ) {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match serde_json::from_str::<Frame>(&text) {
                    Ok(Frame::Message { data }) => {
                        if inbound_tx.send(data).await.is_err() {
                            // Consumer dropped its receiver; nothing left to do
                            break;
                        }
                    }
                    Ok(Frame::Disconnect) => {
                        tracing::debug!(
                            target: "stride::channel",
                            "Server requested disconnect"
                        );
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            target: "stride::channel",
                            "Ignoring malformed frame: {}",
                            e
                        );
                    }
                },
                Ok(WsMessage::Close(reason)) => {
                    tracing::debug!(
                        target: "stride::channel",
                        "Chat channel closed by server: {:?}",
                        reason
                    );
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        target: "stride::channel",
                        "Chat channel transport error: {}",
                        e
                    );
                    break;
                }
            }
        }
        let _ = state_tx.send(ChannelState::Disconnected);
    }

    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Waits for the next state change. Test and shell hook for observing
    /// disconnects without polling.
    pub async fn state_changed(&mut self) -> ChannelState {
        let _ = self.state_rx.changed().await;
        *self.state_rx.borrow()
    }
}

#[async_trait]
impl MessageTransport for ChatChannel {
    fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    async fn send(&self, message: &WireMessage) -> Result<()> {
        if !self.is_connected() {
            tracing::warn!(
                target: "stride::channel",
                "Chat channel not connected, cannot send message"
            );
            return Ok(());
        }

        let frame = Frame::Message {
            data: message.clone(),
        };
        self.writer
            .lock()
            .await
            .send(WsMessage::Text(serde_json::to_string(&frame)?))
            .await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<WireMessage> {
        self.inbound_rx.recv().await
    }

    async fn close(&mut self) {
        let _ = self.writer.lock().await.send(WsMessage::Close(None)).await;
        self.reader_task.abort();
        let _ = self.state_tx.send(ChannelState::Disconnected);
        tracing::debug!(target: "stride::channel", "Chat channel torn down");
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        // Deterministic teardown even when the owner forgets to close
        self.reader_task.abort();
        let _ = self.state_tx.send(ChannelState::Disconnected);
    }
}

/// Connects [`ChatChannel`]s to a fixed endpoint. This is the production
/// [`TransportConnector`]; tests substitute their own.
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    url: String,
}

impl ChannelConnector {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl TransportConnector for ChannelConnector {
    async fn connect(&self, token: &str) -> Result<Box<dyn MessageTransport>> {
        let channel = ChatChannel::connect(&self.url, token).await?;
        Ok(Box::new(channel))
    }
}
