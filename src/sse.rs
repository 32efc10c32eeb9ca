//! Incremental decoding of the `/ask` response stream.
//!
//! The service answers with newline-delimited records.  Records of the form
//! `data: {"content": "..."}` carry the next delta of generated text; every
//! other line is ignored.  Transport chunks arrive with arbitrary boundaries,
//! so partial lines are buffered until their newline shows up.

use std::collections::VecDeque;
use std::error;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_DELTAS, STREAM_MALFORMED};
use crate::{Error, Result};

/// Prefix marking a data record.
const DATA_PREFIX: &[u8] = b"data: ";

#[derive(Deserialize)]
struct DeltaRecord {
    content: Option<String>,
}

/// Push-style decoder that turns raw chunks into text deltas.
///
/// A decoder belongs to exactly one response; it is not restartable.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: BytesMut,
    finished: bool,
}

impl StreamDecoder {
    /// Creates a decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one transport chunk and returns the deltas of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.finished {
            return Vec::new();
        }
        STREAM_BYTES.count(chunk.len() as u64);
        self.buffer.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(newline + 1);
            if let Some(delta) = decode_line(&line[..newline]) {
                deltas.push(delta);
            }
        }
        deltas
    }

    /// Signals end-of-stream and decodes a trailing line that never got its newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        self.finished = true;
        let rest = self.buffer.split();
        if rest.is_empty() {
            None
        } else {
            decode_line(&rest)
        }
    }

    /// Returns the number of buffered bytes that do not yet form a complete line.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Decode a single line without its terminating newline.
fn decode_line(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_slice::<DeltaRecord>(payload) {
        Ok(DeltaRecord {
            content: Some(content),
        }) if !content.is_empty() => {
            STREAM_DELTAS.click();
            Some(content)
        }
        Ok(_) => None,
        Err(err) => {
            STREAM_MALFORMED.click();
            tracing::debug!(error = %err, "dropping malformed stream record");
            None
        }
    }
}

/// Turn a transport byte stream into an ordered stream of text deltas.
///
/// Deltas are yielded in arrival order.  Malformed records are skipped.  A
/// transport error is yielded once as `Err` and ends the stream.
///
/// # Examples
///
/// ```
/// # use askstream::sse::process_sse;
/// # use bytes::Bytes;
/// # use futures::{StreamExt, stream};
/// # tokio_test::block_on(async {
/// let chunks = vec![
///     Ok::<_, std::io::Error>(Bytes::from_static(b"data: {\"content\":\"Hel")),
///     Ok(Bytes::from_static(b"lo\"}\n")),
/// ];
/// let deltas: Vec<_> = process_sse(stream::iter(chunks)).collect().await;
/// assert_eq!(deltas.len(), 1);
/// assert_eq!(deltas[0].as_ref().unwrap(), "Hello");
/// # });
/// ```
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<String>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: error::Error + Send + Sync + 'static,
{
    let state = (byte_stream, StreamDecoder::new(), VecDeque::new(), false);

    stream::unfold(
        state,
        |(mut stream, mut decoder, mut pending, mut done)| async move {
            loop {
                if let Some(delta) = pending.pop_front() {
                    return Some((Ok(delta), (stream, decoder, pending, done)));
                }
                if done {
                    return None;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => pending.extend(decoder.push(&bytes)),
                    Some(Err(e)) => {
                        done = true;
                        let err = Error::streaming(
                            format!("Error in HTTP stream: {e}"),
                            Some(Box::new(e)),
                        );
                        return Some((Err(err), (stream, decoder, pending, done)));
                    }
                    None => {
                        pending.extend(decoder.finish());
                        done = true;
                    }
                }
            }
        },
    )
}
