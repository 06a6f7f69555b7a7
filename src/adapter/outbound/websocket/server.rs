use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::sink::WebSocketSink;
use crate::application::RealtimeBroadcaster;
use crate::error::Result;

/// Accept loop that turns every WebSocket client into a subscriber.
pub struct SnapshotServer {
    listener: TcpListener,
    broadcaster: Arc<RealtimeBroadcaster>,
}

impl SnapshotServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, broadcaster: Arc<RealtimeBroadcaster>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            broadcaster,
        })
    }

    /// Address actually bound; differs from the requested one for port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = self.listener.local_addr() {
            info!(addr = %addr, "Realtime endpoint listening");
        }
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Realtime endpoint shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let broadcaster = Arc::clone(&self.broadcaster);
                        tokio::spawn(handle_connection(stream, peer, broadcaster));
                    }
                    Err(e) => warn!(error = %e, "Accept failed"),
                },
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, broadcaster: Arc<RealtimeBroadcaster>) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(peer = %peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    let (write, mut read) = ws.split();
    let sink = WebSocketSink::new(peer.to_string(), write);

    let id = match broadcaster.subscribe(sink).await {
        Ok(id) => id,
        Err(e) => {
            debug!(peer = %peer, error = %e, "Subscriber rejected");
            return;
        }
    };

    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    broadcaster.unsubscribe(id).await;
    debug!(peer = %peer, subscriber = %id, "Peer disconnected");
}
