//! Newline-delimited JSON framing over any async byte stream.
//!
//! Each frame is one JSON-RPC message on a single line. The reader and
//! writer halves are separate so that responses can be written while the
//! next request is being read.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};

/// Framing failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from or writing to the stream failed.
    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A frame was not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// A frame was not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    /// A frame was JSON but not a JSON-RPC request.
    #[error("invalid JSON-RPC request: {reason}")]
    InvalidRequest {
        /// Id recovered from the frame, if any.
        id: Option<RequestId>,
        /// Human-readable reason.
        reason: String,
    },

    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TransportError {
    /// Returns `true` when the stream itself is still usable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::InvalidUtf8(_) | Self::InvalidRequest { .. }
        )
    }
}

/// Reads JSON-RPC requests, one per line.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    line: Vec<u8>,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wraps a buffered reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: Vec::new(),
        }
    }

    /// Reads the next frame, skipping blank lines. Returns `Ok(None)` at EOF.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the stream fails, and one of the
    /// recoverable [`TransportError::InvalidUtf8`], [`TransportError::Parse`]
    /// or [`TransportError::InvalidRequest`] for a bad frame. Reading may
    /// continue after those.
    pub async fn next_frame(&mut self) -> Result<Option<JsonRpcRequest>, TransportError> {
        loop {
            self.line.clear();
            if self.inner.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }
            let frame = std::str::from_utf8(&self.line)
                .map_err(TransportError::InvalidUtf8)?
                .trim();
            if frame.is_empty() {
                continue;
            }
            return parse_frame(frame).map(Some);
        }
    }
}

fn parse_frame(frame: &str) -> Result<JsonRpcRequest, TransportError> {
    let value: serde_json::Value = serde_json::from_str(frame).map_err(TransportError::Parse)?;
    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    serde_json::from_value(value).map_err(|err| TransportError::InvalidRequest {
        id,
        reason: err.to_string(),
    })
}

/// Writes JSON-RPC responses, one per line.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes and flushes one response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] or [`TransportError::Io`].
    pub async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError> {
        let mut bytes = serde_json::to_vec(response).map_err(TransportError::Encode)?;
        bytes.push(b'\n');
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }
}
