//! On-disk layout constants and the record mode tag.

/// Header size in bytes: the two u32 index-table bounds.
pub const HEADER_SIZE: u64 = 8;

/// Size of one index entry: a u32 range start plus a u24 record pointer.
pub const INDEX_ENTRY_SIZE: u32 = 7;

/// Sentinel text standing in for an area stored as a zero pointer.
pub const UNKNOWN_AREA: &str = "unknown area";

/// Mode byte controlling country/area indirection inside a record.
///
/// Byte values 1 and 2 are reserved sentinels meaning "the next three bytes
/// are a pointer"; any other value is not a tag at all but the first byte of
/// an inline string starting at the mode byte's own offset. The overload is
/// part of the wire format and must be preserved exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Country and area both continue at the pointed-to location.
    FullRedirect,
    /// Country is pointed to; the area follows inline.
    CountryRedirect,
    /// No pointer: the byte is the first character of an inline string.
    Inline(u8),
}

impl RecordMode {
    /// Classify a mode byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => RecordMode::FullRedirect,
            2 => RecordMode::CountryRedirect,
            other => RecordMode::Inline(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_classification() {
        assert_eq!(RecordMode::from_byte(1), RecordMode::FullRedirect);
        assert_eq!(RecordMode::from_byte(2), RecordMode::CountryRedirect);
        assert_eq!(RecordMode::from_byte(0), RecordMode::Inline(0));
        assert_eq!(RecordMode::from_byte(b'C'), RecordMode::Inline(b'C'));
        assert_eq!(RecordMode::from_byte(0xD6), RecordMode::Inline(0xD6));
    }
}
