//! Auto-generated directory index pages (Apache, nginx, lighttpd, ...).

use std::collections::HashSet;

use scraper::Html;
use tracing::instrument;

use crate::consts;
use crate::models::RemoteEntry;

const PARENT_DIRECTORY: &str = "../";

/// Parses the HTML of a directory index page into its child entries.
///
/// Every `<a href>` is returned, except:
/// - the parent-directory link (`../`),
/// - empty targets,
/// - in-page and query-only links (`#top`, `?C=N;O=D` column sorting).
///
/// Duplicates are collapsed, keeping the first occurrence. Malformed HTML is
/// parsed leniently; a page with no usable links is simply an empty listing.
///
/// # Examples
///
/// ```
/// use radsync_extract::{EntryKind, parse_listing};
///
/// let html = r#"
///     <html><body><pre>
///         <a href="../">../</a>
///         <a href="2025/">2025/</a>
///         <a href="rab02-pz_10132-20250529110000-deboo-hd5">rab02-pz...</a>
///     </pre></body></html>
/// "#;
/// let entries = parse_listing(html);
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].kind, EntryKind::Directory);
/// assert_eq!(entries[1].kind, EntryKind::File);
/// ```
#[instrument(level = "trace", skip(html), fields(html_size = html.len()))]
pub fn parse_listing(html: &str) -> Vec<RemoteEntry> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for anchor in document.select(&consts::ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href == PARENT_DIRECTORY || href.starts_with('?') || href.starts_with('#') {
            continue;
        }
        if seen.insert(href.to_string()) {
            entries.push(RemoteEntry::new(href));
        }
    }
    entries
}
