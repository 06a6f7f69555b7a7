use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use crate::domain::MetricsSnapshot;
use crate::error::BroadcastError;
use crate::port::SnapshotSink;

/// Upper bound on sending the close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type Socket = Pin<Box<dyn Sink<Message, Error = BroadcastError> + Send>>;

/// Subscriber backed by the write half of one WebSocket.
///
/// Delivery writes the frame to the socket directly; there is no queue in
/// between. A peer that stops reading stalls the write until the
/// broadcaster's delivery timeout cancels it.
pub struct WebSocketSink {
    peer: String,
    socket: Mutex<Option<Socket>>,
}

impl WebSocketSink {
    pub fn new<S>(peer: impl Into<String>, socket: S) -> Arc<Self>
    where
        S: Sink<Message> + Send + 'static,
        S::Error: std::fmt::Display,
    {
        let socket: Socket =
            Box::pin(socket.sink_map_err(|e| BroadcastError::Transport(e.to_string())));
        Arc::new(Self {
            peer: peer.into(),
            socket: Mutex::new(Some(socket)),
        })
    }
}

#[async_trait]
impl SnapshotSink for WebSocketSink {
    async fn deliver(&self, snapshot: Arc<MetricsSnapshot>) -> Result<(), BroadcastError> {
        let json = serde_json::to_string(snapshot.as_ref())?;
        let mut socket = self.socket.lock().await;
        let writer = socket.as_mut().ok_or(BroadcastError::Closed)?;
        trace!(peer = %self.peer, bytes = json.len(), "Writing snapshot frame");
        if let Err(e) = writer.send(Message::Text(json)).await {
            debug!(peer = %self.peer, error = %e, "WebSocket write failed");
            socket.take();
            return Err(e);
        }
        Ok(())
    }

    async fn close(&self) {
        let finished = tokio::time::timeout(CLOSE_TIMEOUT, async {
            let socket = self.socket.lock().await.take();
            if let Some(mut socket) = socket {
                let _ = socket.send(Message::Close(None)).await;
                let _ = socket.close().await;
            }
        })
        .await;
        if finished.is_err() {
            debug!(peer = %self.peer, "Close frame not sent in time");
        }
    }
}
