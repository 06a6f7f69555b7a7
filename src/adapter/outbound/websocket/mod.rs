//! Realtime push over WebSocket.
//!
//! Every accepted connection becomes one broadcaster subscriber. Snapshots
//! go out as JSON text frames; the connection's own frames are only read to
//! notice when the peer leaves.

mod server;
mod sink;

pub use server::SnapshotServer;
pub use sink::WebSocketSink;
