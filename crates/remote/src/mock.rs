//! Scripted in-memory transport for testing.

use crate::error::{ErrorKind, Result};
use crate::{BodyStream, Response, Transport};
use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// What the mock answers for one URL.
#[derive(Debug, Clone)]
pub enum Route {
    /// Respond with this status and body.
    Respond(u16, Bytes),
    /// Respond `503` for the first `failures` requests, then `200` with the body.
    Flaky { failures: usize, body: Bytes },
    /// Fail every request before a status is received.
    Unreachable,
    /// Respond `200`, then fail halfway through the body.
    BrokenBody(Bytes),
}

/// Counts concurrent holders and remembers the highest count seen.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}
impl Gauge {
    fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(Arc::clone(self))
    }
}

struct GaugeGuard(Arc<Gauge>);
impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`Transport`] serving scripted [`Route`]s.
///
/// Unknown URLs answer `404`. URLs whose path ends in `/` count as listings,
/// everything else as downloads; a request stays "in flight" from the call
/// to [`get`](Transport::get) until its body has been dropped, and the
/// highest concurrency seen for each kind is recorded.
///
/// # Examples
///
/// ```
/// use radsync_remote::{MockTransport, Transport, Url};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = MockTransport::default()
///     .with_listing("http://radar.test/pz/", ["boo/", "LATEST"])
///     .with_file("http://radar.test/pz/LATEST", "20250529110000");
/// let url = Url::parse("http://radar.test/pz/LATEST").unwrap();
/// let response = transport.get(&url).await.unwrap();
/// assert_eq!(response.text().await.unwrap(), "20250529110000");
/// assert_eq!(transport.hits("http://radar.test/pz/LATEST"), 1);
/// # }
/// ```
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, Route>,
    latency: Duration,
    hits: Mutex<HashMap<String, usize>>,
    listings: Arc<Gauge>,
    downloads: Arc<Gauge>,
}

impl MockTransport {
    pub fn with_route(mut self, url: impl AsRef<str>, route: Route) -> Self {
        self.routes.insert(Self::key(url.as_ref()), route);
        self
    }

    /// Serve an nginx-style index page linking to `hrefs`.
    pub fn with_listing<'a>(self, url: impl AsRef<str>, hrefs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut html = String::from("<html><body><pre><a href=\"../\">../</a>\n");
        for href in hrefs {
            html.push_str(&format!("<a href=\"{href}\">{href}</a>\n"));
        }
        html.push_str("</pre></body></html>");
        self.with_route(url, Route::Respond(200, Bytes::from(html)))
    }

    pub fn with_file(self, url: impl AsRef<str>, body: impl Into<Bytes>) -> Self {
        self.with_route(url, Route::Respond(200, body.into()))
    }

    /// Delay applied to every request before it answers, so concurrent
    /// requests actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of requests made for `url` so far.
    pub fn hits(&self, url: impl AsRef<str>) -> usize {
        self.hits.lock().map(|h| h.get(&Self::key(url.as_ref())).copied().unwrap_or(0)).unwrap_or(0)
    }

    /// Number of requests made for non-listing URLs so far.
    pub fn download_hits(&self) -> usize {
        self.hits
            .lock()
            .map(|h| h.iter().filter(|(url, _)| !url.ends_with('/')).map(|(_, n)| n).sum())
            .unwrap_or(0)
    }

    pub fn max_concurrent_listings(&self) -> usize {
        self.listings.max.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_downloads(&self) -> usize {
        self.downloads.max.load(Ordering::SeqCst)
    }

    // Normalizes through `Url` so `http://Host/a` and `http://host/a` match.
    fn key(url: &str) -> String {
        Url::parse(url).map(String::from).unwrap_or_else(|_| url.to_string())
    }

    fn body(guard: GaugeGuard, chunks: Vec<std::io::Result<Bytes>>) -> BodyStream {
        Box::pin(stream! {
            let _guard = guard;
            for chunk in chunks {
                yield chunk;
            }
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<Response> {
        let key = String::from(url.clone());
        let attempt = {
            let mut hits = self.hits.lock().map_err(|_| ErrorKind::Request("poisoned".to_string()))?;
            let count = hits.entry(key.clone()).or_default();
            *count += 1;
            *count
        };
        let gauge = match url.path().ends_with('/') {
            true => &self.listings,
            false => &self.downloads,
        };
        let guard = gauge.enter();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(match self.routes.get(&key) {
            None => Response::new(404, Self::body(guard, vec![])),
            Some(Route::Respond(status, body)) => Response::new(*status, Self::body(guard, vec![Ok(body.clone())])),
            Some(Route::Flaky { failures, .. }) if attempt <= *failures => {
                Response::new(503, Self::body(guard, vec![]))
            },
            Some(Route::Flaky { body, .. }) => Response::new(200, Self::body(guard, vec![Ok(body.clone())])),
            Some(Route::Unreachable) => exn::bail!(ErrorKind::Connect),
            Some(Route::BrokenBody(body)) => {
                let half = body.slice(..body.len() / 2);
                let chunks = vec![Ok(half), Err(std::io::Error::other("connection reset by peer"))];
                Response::new(200, Self::body(guard, chunks))
            },
        })
    }
}
