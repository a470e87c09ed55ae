mod entry;
mod radar;

pub use self::entry::{EntryKind, RemoteEntry};
pub use self::radar::RadarMetadata;
