use tokio::sync::{
    broadcast,
    mpsc::{self, error::TrySendError},
};

use crate::message::Frame;

/// Where a surface's outbound frames go.
///
/// Sending never blocks and never buffers beyond the channel's capacity: a
/// full channel drops the frame, a closed one reports disconnect. Retrying
/// is the caller's concern, and the engine never does it.
#[derive(Debug, Clone)]
pub enum Outbox {
    /// A single bounded channel, read by one transport.
    Channel(mpsc::Sender<Frame>),
    /// A fan-out to every connection attached to a shared surface.
    Broadcast(broadcast::Sender<Frame>),
    /// Every frame goes to each of several outboxes.
    Fanout(Vec<Outbox>),
    /// Frames are computed and dropped.
    Discard,
}

impl Outbox {
    /// Create a bounded channel outbox and its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::Channel(tx), rx)
    }

    /// Send a frame. Returns false if the frame was not delivered.
    pub fn send(&self, frame: Frame) -> bool {
        match self {
            Self::Channel(tx) => match tx.try_send(frame) {
                Ok(()) => true,
                Err(TrySendError::Full(frame)) => {
                    tracing::warn!("outbound channel full, dropping {}", describe(&frame));
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("outbound channel closed");
                    false
                }
            },
            // No subscribers is not an error: nobody is watching right now.
            Self::Broadcast(tx) => tx.send(frame).is_ok(),
            Self::Fanout(outs) => outs
                .iter()
                .fold(false, |sent, out| out.send(frame.clone()) || sent),
            Self::Discard => false,
        }
    }

    /// True once the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Channel(tx) => tx.is_closed(),
            Self::Broadcast(_) => false,
            Self::Fanout(outs) => outs.iter().all(Self::is_closed),
            Self::Discard => true,
        }
    }
}

/// Short frame description for logs.
fn describe(frame: &Frame) -> &'static str {
    frame.message().map_or("keepalive", |m| m.kind())
}
