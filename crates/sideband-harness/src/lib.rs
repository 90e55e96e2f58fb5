//! Test fixtures for exercising `sideband-proto` and `sideband-rpc`
//! end-to-end without a real transport.
//!
//! [`Loopback`] is an in-memory, `mpsc`-backed duplex pair: frames written
//! to one end arrive at the other, in order, with no encoding involved (the
//! fixture carries already-decoded [`Frame`]s). It exists only for tests -
//! real connections run over a byte stream the caller owns, not this type.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use sideband_proto::Frame;
use tokio::sync::mpsc;

/// One end of an in-memory loopback pair.
pub struct Loopback {
    tx: mpsc::Sender<Frame>,
    rx: mpsc::Receiver<Frame>,
}

impl Loopback {
    /// Build a connected pair of loopback ends.
    ///
    /// `capacity` bounds each direction's channel; a full channel makes
    /// [`Loopback::send`] wait rather than drop.
    #[must_use]
    pub fn pair(capacity: usize) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(capacity);
        let (b_tx, a_rx) = mpsc::channel(capacity);
        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }

    /// Send a frame to the other end.
    ///
    /// Returns `false` if the other end has been dropped.
    pub async fn send(&self, frame: Frame) -> bool {
        self.tx.send(frame).await.is_ok()
    }

    /// Receive the next frame sent by the other end, or `None` once it is
    /// dropped and no frames remain buffered.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sideband_proto::frame::ControlOp;
    use sideband_proto::FrameId;

    #[tokio::test]
    async fn frames_arrive_in_order() {
        let (a, mut b) = Loopback::pair(8);
        let first =
            Frame::Control { id: FrameId::new(), op: ControlOp::Ping, data: Bytes::new() };
        let second =
            Frame::Control { id: FrameId::new(), op: ControlOp::Pong, data: Bytes::new() };

        assert!(a.send(first.clone()).await);
        assert!(a.send(second.clone()).await);

        assert_eq!(b.recv().await, Some(first));
        assert_eq!(b.recv().await, Some(second));
    }

    #[tokio::test]
    async fn recv_returns_none_after_sender_dropped() {
        let (a, mut b) = Loopback::pair(8);
        drop(a);
        assert_eq!(b.recv().await, None);
    }
}
