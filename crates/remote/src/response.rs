use crate::error::{ErrorKind, Result};
use bytes::{Bytes, BytesMut};
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

/// Response body as a stream of chunks. Errors surface as [`std::io::Error`]
/// so the stream can be handed straight to the storage layer.
pub type BodyStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Status and (not yet consumed) body of an HTTP response.
pub struct Response {
    status: u16,
    body: BodyStream,
}
impl Response {
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Collects the body into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        let mut body = self.body;
        while let Some(chunk) = body.try_next().await.or_raise(|| ErrorKind::Body)? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    /// Collects the body into a string, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response").field("status", &self.status).finish_non_exhaustive()
    }
}
