//! Quality code enumeration
//!
//! Bilibili encodes resolution/bitrate tiers as integers. The codes are not
//! monotonic with display order in all ranges, so the mapping is a fixed table.

/// Human-readable label for a quality code.
///
/// Codes outside the known table render as `"{code}P"`.
pub fn quality_label(code: u32) -> String {
    match code {
        127 => "8K Ultra HD".to_string(),
        120 => "4K Ultra".to_string(),
        116 => "1080p60".to_string(),
        112 => "1080p High Bitrate".to_string(),
        80 => "1080p HD".to_string(),
        74 => "720p60".to_string(),
        64 => "720p HD".to_string(),
        48 => "720p HD (muxed)".to_string(),
        32 => "480p".to_string(),
        16 => "360p".to_string(),
        other => format!("{}P", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(quality_label(127), "8K Ultra HD");
        assert_eq!(quality_label(80), "1080p HD");
        assert_eq!(quality_label(64), "720p HD");
        assert_eq!(quality_label(48), "720p HD (muxed)");
        assert_eq!(quality_label(16), "360p");
    }

    #[test]
    fn test_unknown_codes_fall_back_to_numeric_label() {
        assert_eq!(quality_label(0), "0P");
        assert_eq!(quality_label(81), "81P");
        assert_eq!(quality_label(9999), "9999P");
    }
}
