use std::fmt::{Display, Formatter, Result as FmtResult};

/// Whether a listing hyperlink points at a file or a subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// One hyperlink of a remote directory listing.
///
/// The `href` is kept exactly as it appeared in the page (relative, possibly
/// percent-encoded); resolving it against the directory URL is the caller's
/// job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteEntry {
    pub href: String,
    pub kind: EntryKind,
}
impl RemoteEntry {
    /// Classifies `href` by its trailing separator.
    pub fn new(href: impl Into<String>) -> Self {
        let href = href.into();
        let kind = match href.ends_with('/') {
            true => EntryKind::Directory,
            false => EntryKind::File,
        };
        Self { href, kind }
    }
}
impl Display for RemoteEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.href)
    }
}
