pub mod error;

use self::error::{ErrorKind, Result};
use exn::ResultExt;
use radsync_extract::{RemoteEntry, parse_listing};
use radsync_remote::TransportHandle;
use url::Url;

/// Fetches one directory index page and parses its links.
///
/// Any 2xx status is accepted; the body is decoded lossily, so a page with
/// stray invalid UTF-8 still yields the links around it. Callers are
/// responsible for holding the directory gate.
pub async fn fetch_listing(transport: &TransportHandle, url: &Url) -> Result<Vec<RemoteEntry>> {
    let response = transport.get(url).await.or_raise(|| ErrorKind::Transport)?;
    if !response.is_success() {
        exn::bail!(ErrorKind::Status(response.status()));
    }
    let html = response.text().await.or_raise(|| ErrorKind::Body)?;
    let entries = parse_listing(&html);
    tracing::debug!(%url, entries = entries.len(), "Fetched directory listing");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use radsync_extract::EntryKind;
    use radsync_remote::{MockTransport, Route};
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let transport: TransportHandle = Arc::new(
            MockTransport::default().with_listing("http://radar.test/pz/", ["boo/", "asb/", "LATEST"]),
        );
        let entries = fetch_listing(&transport, &url("http://radar.test/pz/")).await.unwrap();
        let summary: Vec<_> = entries.iter().map(|e| (e.href.as_str(), e.kind)).collect();
        assert_eq!(
            summary,
            vec![("boo/", EntryKind::Directory), ("asb/", EntryKind::Directory), ("LATEST", EntryKind::File)]
        );
    }

    #[tokio::test]
    async fn test_status_is_an_error() {
        let transport: TransportHandle =
            Arc::new(MockTransport::default().with_route("http://radar.test/pz/", Route::Respond(503, Bytes::new())));
        let err = fetch_listing(&transport, &url("http://radar.test/pz/")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Status(503));

        let err = fetch_listing(&transport, &url("http://radar.test/missing/")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Status(404));
    }

    #[tokio::test]
    async fn test_transport_and_body_failures() {
        let transport: TransportHandle = Arc::new(
            MockTransport::default()
                .with_route("http://radar.test/down/", Route::Unreachable)
                .with_route("http://radar.test/broken/", Route::BrokenBody(Bytes::from_static(b"<a href=\"x\">"))),
        );
        let err = fetch_listing(&transport, &url("http://radar.test/down/")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Transport);
        let err = fetch_listing(&transport, &url("http://radar.test/broken/")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Body);
    }

    #[tokio::test]
    async fn test_not_html_is_empty() {
        let transport: TransportHandle =
            Arc::new(MockTransport::default().with_file("http://radar.test/pz/", "definitely not a listing"));
        assert!(fetch_listing(&transport, &url("http://radar.test/pz/")).await.unwrap().is_empty());
    }
}
