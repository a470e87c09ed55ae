//! Production transport backed by `reqwest`.

use crate::error::{ErrorKind, Result};
use crate::{Response, Transport};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::time::Duration;
use url::Url;

/// Timeouts and identification for [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Upper bound for any single read, waiting for the response head
    /// included. A large volume that keeps arriving never trips it.
    pub read_timeout: Duration,
    /// Optional cap on one whole request, body included.
    pub request_timeout: Option<Duration>,
    /// Upper bound for establishing the connection.
    pub connect_timeout: Duration,
    pub user_agent: String,
}
impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("radsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`Transport`] over a shared, connection-pooling `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}
impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .read_timeout(options.read_timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ErrorKind::Client(e.to_string()))?;
        Ok(Self { client })
    }

    fn classify(err: &reqwest::Error) -> ErrorKind {
        if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connect
        } else {
            ErrorKind::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<Response> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| Self::classify(&e))?;
        let status = response.status().as_u16();
        tracing::trace!(%url, status, "Response received");
        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Response::new(status, Box::pin(body)))
    }
}
