use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Metadata encoded in a radar volume filename.
///
/// Serialized (with the `serde` feature) using the field names downstream
/// plotting tools expect: `RadID`, `timestamp` and `site`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadarMetadata {
    /// Numeric radar (WMO-style) identifier.
    #[cfg_attr(feature = "serde", serde(rename = "RadID"))]
    pub radar_id: u64,
    /// Scan time as `YYYYMMDDHHMMSS`, kept verbatim.
    pub timestamp: String,
    /// Three letter site code, casing preserved.
    pub site: String,
}
impl FromStr for RadarMetadata {
    type Err = Error;

    /// Parses a bare filename (not a path).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(captures) = crate::consts::RADAR_FILENAME_REGEX.captures(s) else {
            exn::bail!(ErrorKind::NoMatch(s.to_string()));
        };
        let (Some(radar_id), Some(timestamp), Some(site)) = (captures.get(1), captures.get(2), captures.get(3)) else {
            exn::bail!(ErrorKind::NoMatch(s.to_string()));
        };
        let Ok(radar_id) = radar_id.as_str().parse::<u64>() else {
            exn::bail!(ErrorKind::ParseError {
                field: "radar_id",
                value: radar_id.as_str().to_string(),
            });
        };
        Ok(Self {
            radar_id,
            timestamp: timestamp.as_str().to_string(),
            site: site.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_volume_filename() {
        let metadata: RadarMetadata = "rab02-pz_10132-20250529110000-deboo-hd5".parse().unwrap();
        assert_eq!(metadata.radar_id, 10132);
        assert_eq!(metadata.timestamp, "20250529110000");
        assert_eq!(metadata.site, "boo");
    }

    #[test]
    fn rejects_non_volume() {
        let err = "radar_photo.png".parse::<RadarMetadata>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoMatch(_)));
    }

    #[test]
    fn rejects_overflowing_radar_id() {
        let err = "x_99999999999999999999999-20250529110000-deboo-hd5".parse::<RadarMetadata>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::ParseError { field: "radar_id", .. }));
    }
}
