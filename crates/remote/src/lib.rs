//! HTTP transport for the mirror engine.
//!
//! [`Transport`] is the seam between the engine and the network: production
//! code uses [`ReqwestTransport`], tests use the scripted `MockTransport`
//! (feature `mock`) which also records how many requests were in flight at
//! once.

pub mod error;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod response;

pub use crate::http::{ReqwestTransport, TransportOptions};
#[cfg(feature = "mock")]
pub use crate::mock::{MockTransport, Route};
pub use crate::response::{BodyStream, Response};
pub use url::Url;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type TransportHandle = Arc<dyn Transport + Send + Sync>;

/// Issues HTTP GET requests.
///
/// A non-success status is *not* an error at this level; it is returned as a
/// [`Response`] so callers can decide what a 404 means to them. Errors are
/// reserved for requests that never produced a status at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Response>;
}
