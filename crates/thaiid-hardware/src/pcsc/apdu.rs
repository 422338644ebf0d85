//! APDU commands and response decoding for the Thai national ID applet.
//!
//! Every field is read with a proprietary READ BINARY (`80 B0`) at a fixed
//! offset. The card answers `61 xx` and the data is then collected with GET
//! RESPONSE, whose P2 byte depends on the card generation.

use crate::{HardwareError, Result};
use encoding_rs::WINDOWS_874;

/// SELECT the Thai ID applet `A0 00 00 00 54 48 00 01`.
pub const SELECT_THAI_ID_APPLET: [u8; 13] = [
    0x00, 0xA4, 0x04, 0x00, 0x08, 0xA0, 0x00, 0x00, 0x00, 0x54, 0x48, 0x00, 0x01,
];

/// ATR prefix of cards that expect GET RESPONSE with P2 = 0x01.
const ATR_GET_RESPONSE_VARIANT: [u8; 2] = [0x3B, 0x67];

/// Photo bytes returned per READ BINARY.
pub const PHOTO_CHUNK_LENGTH: u8 = 0xFF;

/// Number of READ BINARY commands that cover the photo.
pub const PHOTO_CHUNK_COUNT: u16 = 20;

/// Offset of the first photo chunk.
const PHOTO_OFFSET: u16 = 0x017B;

/// Location of a fixed-size field on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    pub offset: u16,
    pub length: u8,
}

impl FieldLocation {
    pub const fn new(offset: u16, length: u8) -> Self {
        Self { offset, length }
    }

    /// READ BINARY command for this field.
    pub fn read_binary(&self) -> [u8; 7] {
        let [hi, lo] = self.offset.to_be_bytes();
        [0x80, 0xB0, hi, lo, 0x02, 0x00, self.length]
    }
}

pub const CID: FieldLocation = FieldLocation::new(0x0004, 0x0D);
pub const NAME_TH: FieldLocation = FieldLocation::new(0x0011, 0x64);
pub const NAME_EN: FieldLocation = FieldLocation::new(0x0075, 0x64);
pub const DATE_OF_BIRTH: FieldLocation = FieldLocation::new(0x00D9, 0x08);
pub const ISSUER: FieldLocation = FieldLocation::new(0x00F6, 0x64);
pub const ISSUE_DATE: FieldLocation = FieldLocation::new(0x0167, 0x08);
pub const EXPIRE_DATE: FieldLocation = FieldLocation::new(0x016F, 0x08);
pub const ADDRESS: FieldLocation = FieldLocation::new(0x1579, 0x64);

/// Locations of the photo chunks, in order.
pub fn photo_chunks() -> impl Iterator<Item = FieldLocation> {
    (0..PHOTO_CHUNK_COUNT)
        .map(|i| FieldLocation::new(PHOTO_OFFSET + i * u16::from(PHOTO_CHUNK_LENGTH), PHOTO_CHUNK_LENGTH))
}

/// P2 byte of GET RESPONSE for a card with the given ATR.
pub fn get_response_p2(atr: &[u8]) -> u8 {
    if atr.starts_with(&ATR_GET_RESPONSE_VARIANT) {
        0x01
    } else {
        0x00
    }
}

/// GET RESPONSE command collecting `length` bytes.
pub fn get_response(p2: u8, length: u8) -> [u8; 5] {
    [0x00, 0xC0, 0x00, p2, length]
}

/// Outcome of a command, from its status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `90 00`
    Ok,
    /// `61 xx`: xx bytes wait to be collected with GET RESPONSE.
    MoreData(u8),
}

/// Split a response APDU into data and status.
///
/// # Errors
///
/// Returns an error for responses shorter than a status word and for any
/// status other than `90 00` or `61 xx`.
pub fn split_response(response: &[u8]) -> Result<(&[u8], Status)> {
    let Some((data, sw)) = response.split_last_chunk::<2>() else {
        return Err(HardwareError::invalid_data(format!(
            "Response too short: {response:02X?}"
        )));
    };

    match *sw {
        [0x90, 0x00] => Ok((data, Status::Ok)),
        [0x61, available] => Ok((data, Status::MoreData(available))),
        [sw1, sw2] => Err(HardwareError::Status { sw1, sw2 }),
    }
}

/// Decode TIS-620 text, dropping the card's space and NUL padding.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_874.decode(bytes);
    text.trim_end_matches(['\0', ' ']).trim_start().to_string()
}

/// Turn the card's `#`-separated address into a space-separated string.
pub fn normalize_address(raw: &str) -> String {
    raw.split(['#', ' '])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
