use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Suffix every catalogued radar volume carries.
pub(crate) const HD5_SUFFIX: &str = "-hd5";

// `_<radar id>-<14 digit timestamp>-<anything><3 letter site>-hd5`, anchored
// to the end of the filename. The free-text part is lazy so the site code is
// always the three letters directly in front of the suffix.
regex!(RADAR_FILENAME_REGEX, r"_(\d+)-(\d{14})-.*?([a-zA-Z]{3})-hd5$");
selector!(ANCHOR_SELECTOR, "a[href]");
