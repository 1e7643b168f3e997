//! Channel-backed transport.
//!
//! Packet finalization is synchronous, but the socket usually lives in an
//! async task. `ChannelTransport` bridges the two: `send` pushes the finished
//! bytes onto an unbounded tokio channel without blocking, and the writer
//! task drains the receiving end as a stream.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use game_envelope::transport::ChannelTransport;
//!
//! # async fn run() {
//! let (transport, mut frames) = ChannelTransport::new();
//! tokio::spawn(async move {
//!     while let Some(frame) = frames.next().await {
//!         // socket.write_all(&frame).await
//!         let _ = frame;
//!     }
//! });
//! # drop(transport);
//! # }
//! ```

use crate::error::{constants, ProtocolError, Result};
use crate::transport::Transport;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

/// Sending half; cheap to clone, one per connection writer
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelTransport {
    /// Create a transport and the stream of frames it produces
    pub fn new() -> (Self, UnboundedReceiverStream<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    /// Whether the receiving stream has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.tx.send(Bytes::copy_from_slice(bytes)).map_err(|_| {
            debug!(len = bytes.len(), "Dropping frame for closed channel");
            ProtocolError::TransportError(constants::ERR_CHANNEL_CLOSED.into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (mut transport, mut frames) = ChannelTransport::new();
        transport.send(b"first").unwrap();
        transport.send(b"second").unwrap();
        drop(transport);

        assert_eq!(frames.next().await, Some(Bytes::from_static(b"first")));
        assert_eq!(frames.next().await, Some(Bytes::from_static(b"second")));
        assert_eq!(frames.next().await, None);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (mut transport, frames) = ChannelTransport::new();
        drop(frames);
        assert!(transport.is_closed());
        assert!(matches!(
            transport.send(b"late"),
            Err(ProtocolError::TransportError(_))
        ));
    }
}
