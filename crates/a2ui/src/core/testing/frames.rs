use serde_json::Value;

use crate::{
    Downstream,
    message::{Frame, Message},
};

/// Take every frame that is ready now.
pub fn drain(down: &mut Downstream) -> Vec<Frame> {
    let mut out = vec![];
    while let Some(f) = down.try_recv() {
        out.push(f);
    }
    out
}

/// Receive exactly `n` frames, waiting as needed. Returns fewer if the
/// session ends first.
pub async fn take(down: &mut Downstream, n: usize) -> Vec<Frame> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        match down.recv().await {
            Some(f) => out.push(f),
            None => break,
        }
    }
    out
}

/// The kind of each frame: the message type, or `keepalive`.
pub fn kinds(frames: &[Frame]) -> Vec<&'static str> {
    frames
        .iter()
        .map(|f| f.message().map_or("keepalive", Message::kind))
        .collect()
}

/// The `(path, value)` of each data model update, in order.
pub fn updates(frames: &[Frame]) -> Vec<(String, Value)> {
    frames
        .iter()
        .filter_map(|f| match f.message() {
            Some(Message::UpdateDataModel { path, value, .. }) => {
                Some((path.to_string(), value.clone()))
            }
            _ => None,
        })
        .collect()
}
