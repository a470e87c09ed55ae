//! Recursive mirroring of a remote directory tree.
//!
//! Every directory traversal returns the mirror-relative paths it found, and
//! a parent merges the sets of its children once they have settled. Apart
//! from the counters and the visited set nothing is shared between branches.
//!
//! Two semaphores bound the run as a whole, however deep or wide the tree:
//! - the file gate is held for a whole download, retries included;
//! - the directory gate is held while a single listing is fetched and parsed.
//!   It is released before the traversal waits on its children; a parent
//!   holding a permit while waiting on children that need one would deadlock
//!   as soon as the tree is deeper than the gate is wide.
//!
//! The whole tree is driven by [`FuturesUnordered`] inside the caller's task,
//! so nothing needs to be spawned.

use crate::download::{RetryPolicy, download_file};
use crate::error::{ErrorKind, Result};
use crate::listing::fetch_listing;
use crate::report::{Stats, SyncReport};
use exn::ResultExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use percent_encoding::percent_decode_str;
use radsync_extract::{EntryKind, RemoteEntry};
use radsync_remote::TransportHandle;
use radsync_storage::{BackendHandle, validate_path};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::instrument;
use url::Url;

pub const DEFAULT_FILE_CONCURRENCY: usize = 12;
pub const DEFAULT_DIRECTORY_CONCURRENCY: usize = 17;
pub const DEFAULT_MAX_DEPTH: usize = 32;
pub const DEFAULT_INDEX_FILE: &str = "current_files.json";

/// Tuning of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Simultaneous downloads across the whole tree.
    pub file_concurrency: usize,
    /// Simultaneous listing fetches across the whole tree.
    pub directory_concurrency: usize,
    /// Deepest directory level followed; the root is level 0.
    pub max_depth: usize,
    pub retry: RetryPolicy,
    /// Index location relative to the mirror root. A remote file at the same
    /// path is never downloaded, and the reconciler never prunes it.
    pub index_file: PathBuf,
}
impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            file_concurrency: DEFAULT_FILE_CONCURRENCY,
            directory_concurrency: DEFAULT_DIRECTORY_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            retry: RetryPolicy::default(),
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
        }
    }
}

/// Result of [`mirror_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOutcome {
    /// Every mirror-relative file path seen in a listing during this run,
    /// whether or not its download succeeded.
    pub found: HashSet<PathBuf>,
    pub report: SyncReport,
}

struct Gates {
    files: Semaphore,
    directories: Semaphore,
}
impl Gates {
    fn new(files: usize, directories: usize) -> Self {
        Self {
            files: Semaphore::new(files.max(1)),
            directories: Semaphore::new(directories.max(1)),
        }
    }

    // Acquiring only fails on a closed semaphore, and these are never closed.
    async fn file(&self) -> Option<SemaphorePermit<'_>> {
        self.files.acquire().await.ok()
    }

    async fn directory(&self) -> Option<SemaphorePermit<'_>> {
        self.directories.acquire().await.ok()
    }
}

#[derive(Default)]
struct Visited {
    directories: HashSet<PathBuf>,
    files: HashSet<PathBuf>,
}

/// State of one run, passed by reference down the recursion.
struct Context<'a> {
    transport: &'a TransportHandle,
    backend: &'a BackendHandle,
    options: &'a SyncOptions,
    root: Url,
    index_file: PathBuf,
    gates: Gates,
    visited: Mutex<Visited>,
    stats: Stats,
}

enum Settled {
    File,
    Directory(HashSet<PathBuf>),
}

/// Mirrors the remote tree below `root` into `backend`.
///
/// Only a failure to list `root` itself is an error, and so is a root page
/// without a single link into the tree; mirroring an empty found-set would
/// make the reconciler wipe the whole mirror. Any other listing or download
/// failure is logged, counted and isolated to its branch.
pub async fn mirror_tree(
    transport: &TransportHandle,
    backend: &BackendHandle,
    root: &Url,
    options: &SyncOptions,
) -> Result<MirrorOutcome> {
    let root = directory_url(root);
    let index_file = validate_path(&options.index_file).or_raise(|| ErrorKind::Index)?;
    let ctx = Context {
        transport,
        backend,
        options,
        root: root.clone(),
        index_file,
        gates: Gates::new(options.file_concurrency, options.directory_concurrency),
        visited: Mutex::new(Visited::default()),
        stats: Stats::default(),
    };

    let entries = {
        let _permit = ctx.gates.directory().await;
        fetch_listing(transport, &root).await.or_raise(|| ErrorKind::RootListing(root.clone()))?
    };
    Stats::bump(&ctx.stats.directories_listed);
    if !entries.iter().any(|entry| ctx.resolve(&root, entry).is_ok()) {
        exn::bail!(ErrorKind::EmptyRoot(root));
    }
    tracing::info!(url = %root, entries = entries.len(), "Mirroring remote tree");

    let found = mirror_entries(&ctx, &root, entries, 0).await;
    Ok(MirrorOutcome { found, report: ctx.stats.snapshot() })
}

/// `url` without query or fragment, and with a trailing `/` so that relative
/// links resolve inside it.
pub(crate) fn directory_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn visit_directory<'c>(ctx: &'c Context<'c>, url: Url, depth: usize) -> BoxFuture<'c, Settled> {
    Box::pin(async move {
        let listing = {
            let _permit = ctx.gates.directory().await;
            fetch_listing(ctx.transport, &url).await
        };
        match listing {
            Ok(entries) => {
                Stats::bump(&ctx.stats.directories_listed);
                Settled::Directory(mirror_entries(ctx, &url, entries, depth).await)
            },
            Err(err) => {
                tracing::warn!(%url, error = ?err, "Listing failed; treating directory as empty");
                Stats::bump(&ctx.stats.listing_failures);
                Settled::Directory(HashSet::new())
            },
        }
    })
}

#[instrument(name = "directory", level = "debug", skip_all, fields(url = %url, depth = depth))]
async fn mirror_entries<'c>(
    ctx: &'c Context<'c>,
    url: &Url,
    entries: Vec<RemoteEntry>,
    depth: usize,
) -> HashSet<PathBuf> {
    let mut found = HashSet::new();
    let mut pending: FuturesUnordered<BoxFuture<'c, Settled>> = FuturesUnordered::new();

    for entry in entries {
        let Some((target, path)) = ctx.admit(url, &entry) else {
            continue;
        };
        match entry.kind {
            EntryKind::File => {
                if !ctx.claim(EntryKind::File, &path) {
                    tracing::debug!(url = %target, "File already dispatched");
                    continue;
                }
                Stats::bump(&ctx.stats.files_found);
                found.insert(path.clone());
                pending.push(Box::pin(fetch_file(ctx, target, path)));
            },
            EntryKind::Directory if depth >= ctx.options.max_depth => {
                tracing::warn!(url = %target, max_depth = ctx.options.max_depth, "Not descending; maximum depth reached");
                Stats::bump(&ctx.stats.links_rejected);
            },
            EntryKind::Directory => {
                if !ctx.claim(EntryKind::Directory, &path) {
                    tracing::debug!(url = %target, "Directory already visited");
                    Stats::bump(&ctx.stats.links_rejected);
                    continue;
                }
                pending.push(visit_directory(ctx, target, depth + 1));
            },
        }
    }

    while let Some(settled) = pending.next().await {
        if let Settled::Directory(child) = settled {
            found.extend(child);
        }
    }
    found
}

async fn fetch_file(ctx: &Context<'_>, url: Url, path: PathBuf) -> Settled {
    match ctx.backend.exists(&path).await {
        Ok(false) => {},
        Ok(true) => {
            tracing::trace!(path = %path.display(), "Already present");
            Stats::bump(&ctx.stats.skipped);
            return Settled::File;
        },
        Err(err) => {
            tracing::error!(path = %path.display(), error = ?err, "Could not check local file");
            Stats::bump(&ctx.stats.failed);
            return Settled::File;
        },
    }

    let _permit = ctx.gates.file().await;
    match download_file(ctx.transport, ctx.backend, &url, &path, &ctx.options.retry).await {
        Ok(bytes) => {
            tracing::info!(path = %path.display(), bytes, "Downloaded");
            Stats::bump(&ctx.stats.downloaded);
            ctx.stats.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        },
        Err(err) => {
            tracing::error!(%url, path = %path.display(), error = ?err, "Download failed");
            Stats::bump(&ctx.stats.failed);
        },
    }
    Settled::File
}

impl Context<'_> {
    /// Resolves one link of the listing at `parent` to its URL and mirror
    /// path, or logs and counts why it was refused.
    fn admit(&self, parent: &Url, entry: &RemoteEntry) -> Option<(Url, PathBuf)> {
        match self.resolve(parent, entry) {
            Ok(admitted) => Some(admitted),
            Err(reason) => {
                tracing::debug!(%parent, href = %entry.href, reason, "Ignoring link");
                Stats::bump(&self.stats.links_rejected);
                None
            },
        }
    }

    fn resolve(&self, parent: &Url, entry: &RemoteEntry) -> std::result::Result<(Url, PathBuf), &'static str> {
        let mut target = parent.join(&entry.href).map_err(|_| "not a valid URL")?;
        target.set_fragment(None);
        if target.query().is_some() {
            return Err("carries a query");
        }
        if target.scheme() != parent.scheme()
            || target.host_str() != parent.host_str()
            || target.port_or_known_default() != parent.port_or_known_default()
        {
            return Err("points to another host");
        }
        // `parent` always ends in `/`, so this also rules out siblings that
        // merely share a prefix.
        if target.path().len() <= parent.path().len() || !target.path().starts_with(parent.path()) {
            return Err("outside of the listed directory");
        }
        let path = self.relative_path(&target).ok_or("not a valid mirror path")?;
        if path == self.index_file {
            return Err("collides with the index file");
        }
        Ok((target, path))
    }

    /// Mirror-relative path of `target`: its URL path below the root URL
    /// path, percent-decoded segment by segment.
    fn relative_path(&self, target: &Url) -> Option<PathBuf> {
        let relative = target.path().strip_prefix(self.root.path())?;
        let mut path = PathBuf::new();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            let segment = percent_decode_str(segment).decode_utf8().ok()?;
            if matches!(segment.as_ref(), "." | "..") || segment.contains(['/', '\\']) {
                return None;
            }
            path.push(segment.as_ref());
        }
        validate_path(&path).ok()
    }

    /// Claims `path` for this run; `false` if it was claimed already.
    fn claim(&self, kind: EntryKind, path: &Path) -> bool {
        let Ok(mut visited) = self.visited.lock() else {
            return false;
        };
        let claimed = match kind {
            EntryKind::Directory => &mut visited.directories,
            EntryKind::File => &mut visited.files,
        };
        claimed.insert(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use radsync_remote::{MockTransport, Route};
    use radsync_storage::StorageBackend;
    use radsync_storage::backend::MockBackend;
    use rstest::rstest;
    use std::sync::Arc;
    use std::time::Duration;

    const ROOT: &str = "http://radar.test/pz/";
    const BOO_VOLUME: &str = "boo/hdf5/rab02-pz_10132-20250529110000-deboo-hd5";
    const ASB_VOLUME: &str = "asb/rab02-pz_10103-20250529110500-deasb-hd5";

    fn url(path: &str) -> String {
        format!("{ROOT}{path}")
    }

    fn options() -> SyncOptions {
        SyncOptions { retry: RetryPolicy::new(3, Duration::ZERO), ..SyncOptions::default() }
    }

    /// root: boo/, asb/, LATEST, radar_photo.png
    fn radar_tree() -> MockTransport {
        MockTransport::default()
            .with_listing(ROOT, ["boo/", "asb/", "LATEST", "radar_photo.png"])
            .with_listing(url("boo/"), ["hdf5/"])
            .with_listing(url("boo/hdf5/"), ["rab02-pz_10132-20250529110000-deboo-hd5"])
            .with_listing(url("asb/"), ["rab02-pz_10103-20250529110500-deasb-hd5"])
            .with_file(url("LATEST"), "20250529110500")
            .with_file(url("radar_photo.png"), "png")
            .with_file(url(BOO_VOLUME), "boo volume")
            .with_file(url(ASB_VOLUME), "asb volume")
    }

    async fn mirror(
        transport: &Arc<MockTransport>,
        backend: &Arc<MockBackend>,
        options: &SyncOptions,
    ) -> Result<MirrorOutcome> {
        let transport: TransportHandle = transport.clone();
        let backend: BackendHandle = backend.clone();
        mirror_tree(&transport, &backend, &Url::parse(ROOT).unwrap(), options).await
    }

    fn paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> HashSet<PathBuf> {
        paths.into_iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_mirrors_whole_tree() {
        let transport = Arc::new(radar_tree());
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();

        let expected = paths(["LATEST", "radar_photo.png", BOO_VOLUME, ASB_VOLUME]);
        assert_eq!(outcome.found, expected);
        assert_eq!(backend.paths().await.into_iter().collect::<HashSet<_>>(), expected);
        assert_eq!(backend.read(Path::new(BOO_VOLUME)).await.unwrap(), b"boo volume");
        assert_eq!(outcome.report.directories_listed, 4);
        assert_eq!(outcome.report.files_found, 4);
        assert_eq!(outcome.report.downloaded, 4);
        assert_eq!(outcome.report.bytes_written, 14 + 3 + 10 + 10);
        assert!(outcome.report.is_clean());
    }

    #[tokio::test]
    async fn test_second_run_downloads_nothing() {
        let transport = Arc::new(radar_tree());
        let backend = Arc::new(MockBackend::default());
        mirror(&transport, &backend, &options()).await.unwrap();
        let before = backend.paths().await;

        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert_eq!(outcome.report.downloaded, 0);
        assert_eq!(outcome.report.skipped, 4);
        assert_eq!(transport.download_hits(), 4);
        assert_eq!(backend.paths().await, before);
    }

    #[tokio::test]
    async fn test_existing_file_is_never_refetched() {
        let transport = Arc::new(radar_tree());
        let backend = Arc::new(MockBackend::with_files([("LATEST", b"stale")]));
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert!(outcome.found.contains(Path::new("LATEST")));
        assert_eq!(transport.hits(url("LATEST")), 0);
        assert_eq!(backend.read(Path::new("LATEST")).await.unwrap(), b"stale");
    }

    #[rstest]
    #[case::unreachable(Route::Unreachable)]
    #[case::server_error(Route::Respond(500, Bytes::new()))]
    #[case::truncated(Route::BrokenBody(Bytes::from_static(b"<html><a href=\"x\">x</a>")))]
    #[tokio::test]
    async fn test_failed_listing_is_isolated(#[case] route: Route) {
        let transport = Arc::new(radar_tree().with_route(url("asb/"), route));
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();

        assert_eq!(outcome.found, paths(["LATEST", "radar_photo.png", BOO_VOLUME]));
        assert_eq!(outcome.report.listing_failures, 1);
        assert_eq!(outcome.report.downloaded, 3);
        assert!(backend.exists(Path::new(BOO_VOLUME)).await.unwrap());
    }

    #[rstest]
    #[case::unreachable(Route::Unreachable)]
    #[case::not_found(Route::Respond(404, Bytes::new()))]
    #[tokio::test]
    async fn test_root_listing_failure_is_fatal(#[case] route: Route) {
        let transport = Arc::new(MockTransport::default().with_route(ROOT, route));
        let backend = Arc::new(MockBackend::default());
        let err = mirror(&transport, &backend, &options()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RootListing(url) if url.as_str() == ROOT));
    }

    #[rstest]
    #[case::maintenance_page("<html>Service temporarily unavailable</html>")]
    #[case::only_foreign_links(r#"<a href="/">home</a><a href="http://elsewhere.test/pz/">mirror</a>"#)]
    #[case::only_sort_links(r#"<a href="?C=N;O=D">Name</a><a href="?C=M;O=A">Last modified</a>"#)]
    #[tokio::test]
    async fn test_root_without_tree_links_is_fatal(#[case] page: &'static str) {
        let transport = Arc::new(MockTransport::default().with_file(ROOT, page));
        let backend = Arc::new(MockBackend::default());
        let err = mirror(&transport, &backend, &options()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::EmptyRoot(url) if url.as_str() == ROOT));
        assert_eq!(transport.download_hits(), 0);
    }

    #[tokio::test]
    async fn test_failed_download_is_found_but_absent() {
        let flaky = Route::Flaky { failures: 3, body: Bytes::from_static(b"boo volume") };
        let transport = Arc::new(radar_tree().with_route(url(BOO_VOLUME), flaky));
        let backend = Arc::new(MockBackend::default());

        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert!(outcome.found.contains(Path::new(BOO_VOLUME)));
        assert_eq!(outcome.report.failed, 1);
        assert_eq!(outcome.report.downloaded, 3);
        assert_eq!(transport.hits(url(BOO_VOLUME)), 3);
        assert!(!backend.exists(Path::new(BOO_VOLUME)).await.unwrap());

        // The server recovered; the next run picks the file up again.
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert_eq!(outcome.report.downloaded, 1);
        assert_eq!(transport.hits(url(BOO_VOLUME)), 4);
        assert_eq!(backend.read(Path::new(BOO_VOLUME)).await.unwrap(), b"boo volume");
    }

    #[tokio::test]
    async fn test_gates_bound_concurrency() {
        // 4 sites with 2 levels each and 6 volumes per leaf, behind gates much
        // narrower than the tree.
        let sites = ["boo", "asb", "drs", "eis"];
        let mut transport = MockTransport::default().with_latency(Duration::from_millis(2));
        let site_links: Vec<String> = sites.iter().map(|s| format!("{s}/")).collect();
        transport = transport.with_listing(ROOT, site_links.iter().map(String::as_str));
        let mut expected = HashSet::new();
        for site in sites {
            transport = transport
                .with_listing(url(&format!("{site}/")), ["hdf5/"])
                .with_listing(url(&format!("{site}/hdf5/")), ["sweep/"]);
            let volumes: Vec<String> = (0..6).map(|n| format!("rab02-pz_10132-2025052911000{n}-de{site}-hd5")).collect();
            transport = transport.with_listing(url(&format!("{site}/hdf5/sweep/")), volumes.iter().map(String::as_str));
            for volume in &volumes {
                let path = format!("{site}/hdf5/sweep/{volume}");
                transport = transport.with_file(url(&path), "volume");
                expected.insert(PathBuf::from(path));
            }
        }
        let transport = Arc::new(transport);
        let backend = Arc::new(MockBackend::default());
        let options = SyncOptions { file_concurrency: 3, directory_concurrency: 1, ..options() };

        let outcome = mirror(&transport, &backend, &options).await.unwrap();
        assert_eq!(outcome.found, expected);
        assert_eq!(outcome.report.downloaded, 24);
        assert!(transport.max_concurrent_downloads() <= 3);
        assert!(transport.max_concurrent_downloads() >= 1);
        assert_eq!(transport.max_concurrent_listings(), 1);
    }

    #[tokio::test]
    async fn test_default_gates_are_reached_not_exceeded() {
        // 24 sites with 2 volumes each: wider than both default gates.
        let sites: Vec<String> = (0..24).map(|n| format!("s{n:02}")).collect();
        let site_links: Vec<String> = sites.iter().map(|s| format!("{s}/")).collect();
        let mut transport = MockTransport::default()
            .with_latency(Duration::from_millis(25))
            .with_listing(ROOT, site_links.iter().map(String::as_str));
        let mut expected = HashSet::new();
        for site in &sites {
            let volumes: Vec<String> = (0..2).map(|n| format!("rab02-pz_10132-2025052911000{n}-de{site}-hd5")).collect();
            transport = transport.with_listing(url(&format!("{site}/")), volumes.iter().map(String::as_str));
            for volume in &volumes {
                let path = format!("{site}/{volume}");
                transport = transport.with_file(url(&path), "volume");
                expected.insert(PathBuf::from(path));
            }
        }
        let transport = Arc::new(transport);
        let backend = Arc::new(MockBackend::default());
        let options = options();
        assert_eq!((options.file_concurrency, options.directory_concurrency), (12, 17));

        let outcome = mirror(&transport, &backend, &options).await.unwrap();
        assert_eq!(outcome.found, expected);
        assert_eq!(outcome.report.downloaded, 48);
        assert_eq!(transport.max_concurrent_listings(), DEFAULT_DIRECTORY_CONCURRENCY);
        assert_eq!(transport.max_concurrent_downloads(), DEFAULT_FILE_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_rejects_links_leaving_the_tree() {
        let transport = Arc::new(
            MockTransport::default()
                .with_listing(
                    ROOT,
                    [
                        "http://elsewhere.test/pz/boo/",
                        "https://radar.test/pz/LATEST",
                        "/other/",
                        "/",
                        "./",
                        "../pz-archive/",
                        "sort/?C=N;O=D",
                        "boo/",
                    ],
                )
                .with_listing(url("boo/"), ["../", "../../", "LATEST"])
                .with_file(url("boo/LATEST"), "20250529110500"),
        );
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();

        assert_eq!(outcome.found, paths(["boo/LATEST"]));
        // `../` is dropped by the parser; `../../` reaches the resolver.
        assert_eq!(outcome.report.links_rejected, 8);
        assert_eq!(transport.hits("http://elsewhere.test/pz/boo/"), 0);
        assert_eq!(transport.hits("http://radar.test/other/"), 0);
    }

    #[tokio::test]
    async fn test_absolute_link_inside_the_tree_is_followed() {
        let transport = Arc::new(
            MockTransport::default()
                .with_listing(ROOT, ["/pz/boo/"])
                .with_listing(url("boo/"), ["http://radar.test/pz/boo/LATEST"])
                .with_file(url("boo/LATEST"), "20250529110500"),
        );
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert_eq!(outcome.found, paths(["boo/LATEST"]));
    }

    #[tokio::test]
    async fn test_directory_visited_once() {
        let transport = Arc::new(
            MockTransport::default()
                .with_listing(ROOT, ["boo/", "./boo/", "boo//"])
                .with_listing(url("boo/"), ["LATEST"])
                .with_file(url("boo/LATEST"), "20250529110500"),
        );
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert_eq!(outcome.found, paths(["boo/LATEST"]));
        assert_eq!(transport.hits(url("boo/")), 1);
        assert_eq!(transport.hits(url("boo//")), 0);
        assert_eq!(transport.download_hits(), 1);
        assert_eq!(outcome.report.links_rejected, 2);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        // A server-side symlink loop: every level links to a deeper copy.
        let transport = Arc::new(
            MockTransport::default()
                .with_listing(ROOT, ["loop/", "f0"])
                .with_listing(url("loop/"), ["loop/", "f1"])
                .with_listing(url("loop/loop/"), ["loop/", "f2"])
                .with_listing(url("loop/loop/loop/"), ["loop/", "f3"])
                .with_file(url("f0"), "0")
                .with_file(url("loop/f1"), "1")
                .with_file(url("loop/loop/f2"), "2")
                .with_file(url("loop/loop/loop/f3"), "3"),
        );
        let backend = Arc::new(MockBackend::default());
        let options = SyncOptions { max_depth: 2, ..options() };
        let outcome = mirror(&transport, &backend, &options).await.unwrap();

        assert_eq!(outcome.found, paths(["f0", "loop/f1", "loop/loop/f2"]));
        assert_eq!(transport.hits(url("loop/loop/loop/")), 0);
        assert_eq!(outcome.report.links_rejected, 1);
    }

    #[tokio::test]
    async fn test_index_file_is_never_downloaded() {
        let transport = Arc::new(
            MockTransport::default()
                .with_listing(ROOT, ["current_files.json", "LATEST"])
                .with_file(url("current_files.json"), "[]")
                .with_file(url("LATEST"), "20250529110500"),
        );
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert_eq!(outcome.found, paths(["LATEST"]));
        assert_eq!(transport.hits(url("current_files.json")), 0);
    }

    #[tokio::test]
    async fn test_percent_encoded_names_are_decoded() {
        let transport = Arc::new(
            MockTransport::default()
                .with_listing(ROOT, ["radar%20photos/", "escaped%2Fslash"])
                .with_listing(url("radar%20photos/"), ["boo.png"])
                .with_file(url("radar%20photos/boo.png"), "png"),
        );
        let backend = Arc::new(MockBackend::default());
        let outcome = mirror(&transport, &backend, &options()).await.unwrap();
        assert_eq!(outcome.found, paths(["radar photos/boo.png"]));
        assert_eq!(outcome.report.links_rejected, 1);
    }

    #[rstest]
    #[case("plain", Some("plain"))]
    #[case("radar%20photo", Some("radar photo"))]
    #[case("%7e%7E", Some("~~"))]
    #[case("%C3%A4", Some("ä"))]
    #[case("%FF", None)]
    #[case("a%2Fb", None)]
    #[case("%2e%2E", None)]
    fn test_relative_path_segments(#[case] segment: &str, #[case] expected: Option<&str>) {
        let root = Url::parse(ROOT).unwrap();
        let transport: TransportHandle = Arc::new(MockTransport::default());
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let options = options();
        let ctx = Context {
            transport: &transport,
            backend: &backend,
            options: &options,
            root: root.clone(),
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
            gates: Gates::new(1, 1),
            visited: Mutex::new(Visited::default()),
            stats: Stats::default(),
        };
        let target = root.join(segment).unwrap();
        assert_eq!(ctx.relative_path(&target), expected.map(PathBuf::from));
    }

    #[rstest]
    #[case("http://radar.test/pz", "http://radar.test/pz/")]
    #[case("http://radar.test/pz/", "http://radar.test/pz/")]
    #[case("http://radar.test/pz?C=N#top", "http://radar.test/pz/")]
    #[case("http://radar.test", "http://radar.test/")]
    fn test_directory_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(directory_url(&Url::parse(input).unwrap()).as_str(), expected);
    }
}
