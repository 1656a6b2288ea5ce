/// Space-separated hex byte pairs, as used for UUID emission (§4.1).
pub fn hex_pairs(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Contiguous hex digits, used as the name-decoding fallback (§P6) when bytes
/// are not valid UTF-8.
pub fn hex_string(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes a directory/xattr name: UTF-8 if valid, otherwise the hex
/// fallback, satisfying the round-trip property P6.
pub fn decode_name(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => hex_string(data),
    }
}

/// Renders Unix seconds-since-epoch as `YYYY-MM-DD HH:MM:SS` UTC (§4.4).
/// A value of 0 is rendered literally rather than specially-cased, matching
/// the "never" sentinel ext4 tools traditionally print for unset timestamps.
pub fn format_timestamp(secs_since_epoch: u32) -> String {
    use chrono::{DateTime, Utc};
    DateTime::<Utc>::from_timestamp(secs_since_epoch as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("<invalid:{}>", secs_since_epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_pairs_formats_lowercase_space_separated() {
        assert_eq!(hex_pairs(&[0xde, 0xad, 0xbe, 0xef]), "de ad be ef");
    }

    #[test]
    fn decode_name_round_trips_utf8() {
        assert_eq!(decode_name("readme.txt".as_bytes()), "readme.txt");
    }

    #[test]
    fn decode_name_falls_back_to_hex_for_invalid_utf8() {
        let bytes = [0xff, 0xfe, 0x00, 0x01];
        assert_eq!(decode_name(&bytes), hex_string(&bytes));
    }

    #[test]
    fn format_timestamp_renders_epoch() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }
}
