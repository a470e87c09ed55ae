//! Radar volume filename grammar.

use std::path::Path;

use crate::consts::HD5_SUFFIX;
use crate::models::RadarMetadata;

/// Extracts [`RadarMetadata`] from a filename.
///
/// Accepts either a bare filename or a path; only the final component is
/// matched. Returns `None` when the name does not follow the grammar
/// `_<digits>-<14 digits>-<anything><3 letters>-hd5`. That is not an error:
/// such files are still mirrored, they are just left out of the index.
///
/// # Examples
///
/// ```
/// use radsync_extract::extract_metadata;
///
/// let metadata = extract_metadata("rab02-pz_10132-20250529110000-deboo-hd5").unwrap();
/// assert_eq!(metadata.radar_id, 10132);
/// assert_eq!(metadata.timestamp, "20250529110000");
/// assert_eq!(metadata.site, "boo");
///
/// assert!(extract_metadata("radar_photo.png").is_none());
/// ```
pub fn extract_metadata(filename: impl AsRef<Path>) -> Option<RadarMetadata> {
    let name = filename.as_ref().file_name()?.to_str()?;
    // Cheap pre-check before running the regex over every file in the mirror.
    if !name.ends_with(HD5_SUFFIX) {
        return None;
    }
    match name.parse() {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::trace!(filename = name, error = %*e, "Filename excluded from index");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("rab02-pz_10132-20250529110000-deboo-hd5", 10132, "20250529110000", "boo")]
    #[case("ras07-pcpng_10908-20250101000500-defbg-hd5", 10908, "20250101000500", "fbg")]
    #[case("sweep_vol_1-20240229235959-x-ABC-hd5", 1, "20240229235959", "ABC")]
    #[case("2025/05/29/rab02-pz_10132-20250529110000-deboo-hd5", 10132, "20250529110000", "boo")]
    fn test_matches(#[case] filename: &str, #[case] radar_id: u64, #[case] timestamp: &str, #[case] site: &str) {
        let metadata = extract_metadata(filename).unwrap();
        assert_eq!(metadata.radar_id, radar_id);
        assert_eq!(metadata.timestamp, timestamp);
        assert_eq!(metadata.site, site);
    }

    #[rstest]
    #[case("radar_photo.png")]
    #[case("rab02-pz_10132-20250529110000-deboo-hd5.part")]
    #[case("rab02-pz_10132-2025052911000-deboo-hd5")] // 13 digit timestamp
    #[case("rab02-pz-10132-20250529110000-deboo-hd5")] // no underscore
    #[case("rab02-pz_10132-20250529110000-de1-hd5")] // digit in site
    #[case("rab02-pz_10132-20250529110000-deboo-HD5")]
    #[case("current_files.json")]
    #[case("")]
    fn test_no_match(#[case] filename: &str) {
        assert!(extract_metadata(filename).is_none());
    }

    #[test]
    fn test_site_casing_preserved() {
        assert_eq!(extract_metadata("a_1-20250529110000-x-BoO-hd5").unwrap().site, "BoO");
    }
}
