//! Core constants for the Thai ID card bridge.
//!
//! Centralizes the address grammar keywords, the sentinel used for missing
//! address parts, the user-facing HTTP messages and a handful of runtime
//! defaults shared by the session and server crates.
//!
//! # Address Grammar
//!
//! Addresses stored on the card follow a loose government convention:
//!
//! ```text
//! <house>[ หมู่ที่ <n>] [ถนน <name>] [ซ. <name>] [แยก <n>] (ตำบล|แขวง) <name> (อำเภอ|เขต) <name> [จังหวัด <name>]
//! ```
//!
//! The keywords below are the tokens the decomposer anchors on. `ตำบล`/`แขวง`
//! and `อำเภอ`/`เขต` are mandatory; everything else is optional.
//!
//! ```
//! use thaiid_core::constants::*;
//!
//! assert_eq!(SENTINEL, "-");
//! assert!(SUB_DISTRICT_KEYWORDS.contains(&"แขวง"));
//! assert!(DISTRICT_KEYWORDS.contains(&"เขต"));
//! ```

// ============================================================================
// Address Grammar
// ============================================================================

/// Marker for an address part that is not present in the source address.
///
/// Distinct from the empty string: an empty string never appears in a
/// decomposed address.
pub const SENTINEL: &str = "-";

/// Village number marker ("หมู่ที่").
pub const VILLAGE_KEYWORD: &str = "หมู่ที่";

/// Road marker ("ถนน").
pub const ROAD_KEYWORD: &str = "ถนน";

/// Soi (lane) markers. The abbreviated form comes first so the longer
/// spelled-out form is not shadowed.
pub const SOI_KEYWORDS: [&str; 2] = ["ซ.", "ซอย"];

/// Junction marker ("แยก").
pub const JUNCTION_KEYWORD: &str = "แยก";

/// Sub-district anchors: `ตำบล` upcountry, `แขวง` in Bangkok.
pub const SUB_DISTRICT_KEYWORDS: [&str; 2] = ["ตำบล", "แขวง"];

/// District anchors: `อำเภอ` upcountry, `เขต` in Bangkok.
pub const DISTRICT_KEYWORDS: [&str; 2] = ["อำเภอ", "เขต"];

/// Province marker ("จังหวัด").
pub const PROVINCE_KEYWORD: &str = "จังหวัด";

/// Field separator used in the raw card encoding of names and addresses.
pub const CARD_FIELD_SEPARATOR: char = '#';

/// First code point of the Thai block accepted inside address names (ก).
pub const THAI_RANGE_START: char = '\u{0E01}';

/// Last code point of the Thai block accepted inside address names (๙).
pub const THAI_RANGE_END: char = '\u{0E59}';

// ============================================================================
// Calendar
// ============================================================================

/// Offset between Buddhist Era years printed on the card and Gregorian years.
pub const BUDDHIST_ERA_OFFSET: u16 = 543;

// ============================================================================
// HTTP Messages
// ============================================================================

/// Body message returned when the reader is not connected.
pub const MESSAGE_DEVICE_UNAVAILABLE: &str = "ไม่พบอุปกรณ์!!! กรุณาเชื่อมต่ออุปกรณ์อีกครั้ง.";

/// Body message returned when no card has been read.
pub const MESSAGE_NO_CARD_DATA: &str = "ไม่พบข้อมูล กรุณาเสียบบัตรใหม่.";

// ============================================================================
// Runtime Defaults
// ============================================================================

/// Default HTTP port when neither config nor `PORT` provide one.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default bind host: all interfaces.
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Capacity of the reader event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Minimum delay between two reader polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Number of session transitions kept for diagnostics.
pub const MAX_HISTORY_SIZE: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thai_range_covers_keywords() {
        let keywords = [VILLAGE_KEYWORD, ROAD_KEYWORD, JUNCTION_KEYWORD, PROVINCE_KEYWORD]
            .into_iter()
            .chain(SUB_DISTRICT_KEYWORDS)
            .chain(DISTRICT_KEYWORDS);

        for keyword in keywords {
            assert!(
                keyword
                    .chars()
                    .all(|c| (THAI_RANGE_START..=THAI_RANGE_END).contains(&c)),
                "{keyword} contains a character outside the Thai range"
            );
        }
    }

    #[test]
    fn test_sentinel_is_not_empty() {
        assert!(!SENTINEL.is_empty());
    }
}
