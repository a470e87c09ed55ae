pub mod error;

use self::error::{ErrorKind, Result};
use exn::ResultExt;
use radsync_remote::TransportHandle;
use radsync_storage::BackendHandle;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// How often, and how patiently, a failed download is attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Never less than one.
    pub attempts: u32,
    /// Fixed pause between two attempts.
    pub delay: Duration,
}
impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts: attempts.max(1), delay }
    }
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Downloads `url` into the mirror-relative `path`, retrying per `policy`.
///
/// Returns the number of bytes written. The body is streamed straight into
/// storage, which only replaces the destination once the stream completed;
/// after a failure the destination is exactly as absent as before, so the
/// next run tries again. Callers are responsible for holding the file gate.
pub async fn download_file(
    transport: &TransportHandle,
    backend: &BackendHandle,
    url: &Url,
    path: &Path,
    policy: &RetryPolicy,
) -> Result<u64> {
    let mut attempt = 1;
    loop {
        match download_once(transport, backend, url, path).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_retryable() && attempt < policy.attempts => {
                tracing::warn!(%url, attempt, remaining = policy.attempts - attempt, error = ?err, "Download failed; retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            },
            Err(err) => return Err(err),
        }
    }
}

async fn download_once(transport: &TransportHandle, backend: &BackendHandle, url: &Url, path: &Path) -> Result<u64> {
    let response = transport.get(url).await.or_raise(|| ErrorKind::Request)?;
    if !response.is_success() {
        exn::bail!(ErrorKind::Status(response.status()));
    }
    match backend.write_stream(path, response.into_body()).await {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            let kind = match err.is_retryable() {
                true => ErrorKind::Write,
                false => ErrorKind::Rejected,
            };
            Err(err).or_raise(|| kind)
        },
    }
}
