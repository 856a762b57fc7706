use bytes::Bytes;
use futures_util::{Stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;

use crate::error::GatewayError;

/// Server-Sent-Events style parser for streaming responses.
///
/// The transport body is UTF-8 text delivered as `data: {json}\n` frames.
/// Chunk boundaries do not respect line boundaries, so a partial trailing
/// line is carried over in an owned buffer and prefixed onto the next chunk.
pub struct SseParser {
    byte_stream:
        std::pin::Pin<Box<dyn Stream<Item = Result<Bytes, GatewayError>> + Send>>,
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new(response: reqwest::Response) -> Self {
        Self::from_stream(response.bytes_stream().map_err(GatewayError::from))
    }

    /// Build a parser over an arbitrary chunk stream. Used by tests to
    /// exercise chunk boundaries without a live connection.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, GatewayError>> + Send + 'static,
    {
        Self {
            byte_stream: Box::pin(stream),
            buffer: Vec::new(),
        }
    }

    /// Get the next decoded event from the stream.
    ///
    /// Returns `Ok(None)` once the transport signals end-of-body. Lines that
    /// are not `data: ` frames, and frames whose payload fails JSON parsing,
    /// are skipped rather than surfaced as errors; the protocol carries
    /// keep-alive noise that must not kill the stream.
    pub async fn next_event<T: DeserializeOwned>(
        &mut self,
    ) -> Result<Option<T>, GatewayError> {
        loop {
            while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                if let Some(event) = decode_line(&line) {
                    return Ok(Some(event));
                }
            }

            match self.byte_stream.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => {
                    // End of body: a non-empty remainder is one final line.
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let line = std::mem::take(&mut self.buffer);
                    return Ok(decode_line(&line));
                }
            }
        }
    }
}

fn decode_line<T: DeserializeOwned>(raw: &[u8]) -> Option<T> {
    let Ok(line) = std::str::from_utf8(raw) else {
        tracing::warn!("skipping stream line with invalid UTF-8");
        return None;
    };
    decode_data_line(line.trim_end_matches(['\r', '\n']))
}

/// Decode a single `data: {json}` line; anything else yields `None`.
pub fn decode_data_line<T: DeserializeOwned>(line: &str) -> Option<T> {
    let payload = line.strip_prefix("data: ")?;
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(%err, payload, "skipping malformed stream frame");
            None
        }
    }
}
