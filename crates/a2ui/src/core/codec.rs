//! Frame encoding and incremental decoding.
//!
//! A frame is one JSON document. In SSE framing each frame is a `data:` line
//! followed by a blank line, and keepalives are `:` comment lines. In JSONL
//! framing each frame is a single line and keepalives are empty lines. Either
//! way a reader can recover frame boundaries line by line without buffering
//! the whole session.

use std::mem;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    message::{Frame, Message},
};

/// SSE keepalive comment.
const SSE_KEEPALIVE: &str = ": keepalive\n\n";

/// Wire framing for outbound channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Server-sent events.
    #[default]
    Sse,
    /// Newline-delimited JSON.
    Jsonl,
}

impl Framing {
    /// MIME type a transport should advertise.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Sse => "text/event-stream",
            Self::Jsonl => "application/jsonl",
        }
    }

    /// Encode one frame.
    pub fn encode(self, frame: &Frame) -> Result<String> {
        Ok(match (self, frame) {
            (Self::Sse, Frame::Keepalive) => SSE_KEEPALIVE.to_string(),
            (Self::Jsonl, Frame::Keepalive) => "\n".to_string(),
            (Self::Sse, Frame::Message(m)) => format!("data: {}\n\n", serde_json::to_string(m)?),
            (Self::Jsonl, Frame::Message(m)) => format!("{}\n", serde_json::to_string(m)?),
        })
    }
}

/// Incremental reader for framed message streams.
///
/// Accepts SSE and JSONL interchangeably. Input may arrive in arbitrary
/// chunks; partial lines are held until their newline arrives.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes received after the last complete line.
    pending: Vec<u8>,
}

impl FrameDecoder {
    /// Construct an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every message completed by it. Lines that do
    /// not parse are logged and skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Message> {
        self.pending.extend_from_slice(chunk);
        let mut out = vec![];
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(m) = Self::decode_line(&String::from_utf8_lossy(&line)) {
                out.push(m);
            }
        }
        out
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Option<Message> {
        let rest = mem::take(&mut self.pending);
        Self::decode_line(&String::from_utf8_lossy(&rest))
    }

    /// Decode a single line, returning None for blank lines, comments,
    /// sentinels and garbage.
    fn decode_line(raw: &str) -> Option<Message> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(':') {
            return None;
        }
        let line = line
            .strip_prefix("data: ")
            .or_else(|| line.strip_prefix("data:"))
            .unwrap_or(line);
        if line.is_empty() || line == "[DONE]" {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(m) => Some(m),
            Err(e) => {
                let shown: String = line.chars().take(100).collect();
                tracing::warn!("skipping unparseable frame {:?}: {}", shown, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn update() -> Message {
        Message::UpdateDataModel {
            surface_id: "s".into(),
            path: "/a".into(),
            value: json!(1),
        }
    }

    #[test]
    fn sse_encoding() -> Result<()> {
        assert_eq!(
            Framing::Sse.encode(&update().into())?,
            "data: {\"type\":\"updateDataModel\",\"surfaceId\":\"s\",\"path\":\"/a\",\"value\":1}\n\n"
        );
        assert_eq!(Framing::Sse.encode(&Frame::Keepalive)?, ": keepalive\n\n");
        Ok(())
    }

    #[test]
    fn jsonl_encoding() -> Result<()> {
        let s = Framing::Jsonl.encode(&update().into())?;
        assert!(s.ends_with("}\n"));
        assert_eq!(s.matches('\n').count(), 1);
        assert_eq!(Framing::Jsonl.encode(&Frame::Keepalive)?, "\n");
        Ok(())
    }

    #[test]
    fn decoder_recovers_split_frames() -> Result<()> {
        let wire = format!(
            "{}{}{}",
            Framing::Sse.encode(&update().into())?,
            Framing::Sse.encode(&Frame::Keepalive)?,
            Framing::Sse.encode(&update().into())?
        );
        let bytes = wire.as_bytes();
        let mut dec = FrameDecoder::new();
        let mut got = vec![];
        for chunk in bytes.chunks(7) {
            got.extend(dec.push(chunk));
        }
        assert_eq!(got, vec![update(), update()]);
        assert_eq!(dec.finish(), None);
        Ok(())
    }

    #[test]
    fn decoder_skips_noise() {
        let mut dec = FrameDecoder::new();
        let input = "data: [DONE]\n: comment\n\ndata: {broken\n{\"type\":\"deleteSurface\",\"surfaceId\":\"s\"}\n";
        assert_eq!(
            dec.push(input.as_bytes()),
            vec![Message::DeleteSurface {
                surface_id: "s".into()
            }]
        );
    }

    #[test]
    fn decoder_finish_flushes_tail() {
        let mut dec = FrameDecoder::new();
        assert!(
            dec.push(b"data:{\"type\":\"deleteSurface\",\"surfaceId\":\"x\"}")
                .is_empty()
        );
        assert_eq!(
            dec.finish(),
            Some(Message::DeleteSurface {
                surface_id: "x".into()
            })
        );
    }
}
