use crate::{
    Result,
    address::AddressRecord,
    constants::{BUDDHIST_ERA_OFFSET, CARD_FIELD_SEPARATOR},
    error::Error,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields fetched from the card during one read, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardField {
    #[serde(rename = "cid")]
    Cid,
    #[serde(rename = "nameTH")]
    NameTh,
    #[serde(rename = "nameEN")]
    NameEn,
    #[serde(rename = "dob")]
    DateOfBirth,
    #[serde(rename = "issueDate")]
    IssueDate,
    #[serde(rename = "expireDate")]
    ExpireDate,
    #[serde(rename = "address")]
    Address,
    #[serde(rename = "issuer")]
    Issuer,
    #[serde(rename = "photo")]
    Photo,
}

impl CardField {
    /// All fields in the order the pipeline reads them.
    pub const ALL: [CardField; 9] = [
        CardField::Cid,
        CardField::NameTh,
        CardField::NameEn,
        CardField::DateOfBirth,
        CardField::IssueDate,
        CardField::ExpireDate,
        CardField::Address,
        CardField::Issuer,
        CardField::Photo,
    ];

    /// Wire name of the field, as used in the JSON record.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardField::Cid => "cid",
            CardField::NameTh => "nameTH",
            CardField::NameEn => "nameEN",
            CardField::DateOfBirth => "dob",
            CardField::IssueDate => "issueDate",
            CardField::ExpireDate => "expireDate",
            CardField::Address => "address",
            CardField::Issuer => "issuer",
            CardField::Photo => "photo",
        }
    }
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person's name in one script.
///
/// The card stores names as `prefix#first#middle#last`; the middle name is
/// usually empty and is omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonName {
    pub prefix: String,
    pub firstname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middlename: Option<String>,
    pub lastname: String,
}

impl PersonName {
    pub fn new(
        prefix: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            firstname: firstname.into(),
            middlename: None,
            lastname: lastname.into(),
        }
    }

    /// Parse the `#`-separated card encoding.
    ///
    /// # Errors
    /// Returns `Error::Device` if the value has fewer than three parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use thaiid_core::PersonName;
    ///
    /// let name = PersonName::from_card_str("Mr.#Somchai##Jaidee").unwrap();
    /// assert_eq!(name.firstname, "Somchai");
    /// assert_eq!(name.middlename, None);
    /// assert_eq!(name.lastname, "Jaidee");
    /// ```
    pub fn from_card_str(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split(CARD_FIELD_SEPARATOR).map(str::trim).collect();

        match parts.as_slice() {
            [prefix, first, last] => Ok(Self::new(*prefix, *first, *last)),
            [prefix, first, middle, last, ..] => Ok(Self {
                prefix: prefix.to_string(),
                firstname: first.to_string(),
                middlename: (!middle.is_empty()).then(|| middle.to_string()),
                lastname: last.to_string(),
            }),
            _ => Err(Error::Device(format!("Malformed name field: {raw:?}"))),
        }
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.firstname)?;
        if let Some(middle) = &self.middlename {
            write!(f, " {middle}")?;
        }
        write!(f, " {}", self.lastname)
    }
}

/// A date as printed on the card, year in the Buddhist Era.
///
/// Day and month may be zero for people whose exact birth date is unknown,
/// and lifelong cards carry an all-nines expiry. Values are kept as read;
/// use [`CardDate::to_naive_date`] for calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

impl CardDate {
    pub fn new(day: u8, month: u8, year: u16) -> Self {
        Self { day, month, year }
    }

    /// Parse the card's `YYYYMMDD` encoding.
    ///
    /// # Errors
    /// Returns `Error::Device` if the value is not eight ASCII digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use thaiid_core::CardDate;
    ///
    /// let dob = CardDate::from_card_str("25300115").unwrap();
    /// assert_eq!((dob.day, dob.month, dob.year), (15, 1, 2530));
    /// assert_eq!(dob.gregorian_year(), 1987);
    /// ```
    pub fn from_card_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Device(format!("Malformed card date: {raw:?}")));
        }

        // All-ASCII digits, so byte slicing is safe and parses cannot fail.
        let year = raw[0..4].parse().unwrap_or_default();
        let month = raw[4..6].parse().unwrap_or_default();
        let day = raw[6..8].parse().unwrap_or_default();

        Ok(Self { day, month, year })
    }

    /// Year in the Gregorian calendar.
    pub fn gregorian_year(&self) -> i32 {
        i32::from(self.year) - i32::from(BUDDHIST_ERA_OFFSET)
    }

    /// Whether this is the all-nines "does not expire" marker.
    pub fn is_lifelong(&self) -> bool {
        self.year == 9999
    }

    /// Convert to a Gregorian calendar date.
    ///
    /// Returns `None` for lifelong markers and partial dates (zero day or
    /// month).
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        if self.is_lifelong() {
            return None;
        }
        NaiveDate::from_ymd_opt(
            self.gregorian_year(),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl fmt::Display for CardDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}", self.day, self.month, self.year)
    }
}

/// One complete card read.
///
/// Built only by a successful card read and never mutated afterwards. The
/// JSON layout matches the service's public API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// 13-digit citizen identification number.
    pub cid: String,

    #[serde(rename = "nameTH")]
    pub name_th: PersonName,

    #[serde(rename = "nameEN")]
    pub name_en: PersonName,

    pub dob: CardDate,

    #[serde(rename = "issueDate")]
    pub issue_date: CardDate,

    #[serde(rename = "expireDate")]
    pub expire_date: CardDate,

    pub address: AddressRecord,

    /// Issuing office.
    pub issuer: String,

    /// Raw photo bytes (JPEG), base64 in JSON.
    #[serde(with = "photo_base64")]
    pub photo: Vec<u8>,

    /// When the read completed.
    #[serde(rename = "readAt")]
    pub read_at: DateTime<Utc>,
}

impl PersonRecord {
    /// Whether the card has expired on `today`.
    ///
    /// Lifelong cards never expire; cards with an unparseable expiry are
    /// reported as not expired.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expire_date
            .to_naive_date()
            .is_some_and(|expiry| expiry < today)
    }
}

/// Serde helpers for photo bytes carried as a base64 string.
pub mod photo_base64 {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn sample_record() -> PersonRecord {
        PersonRecord {
            cid: "1101700203451".to_string(),
            name_th: PersonName::new("นาย", "สมชาย", "ใจดี"),
            name_en: PersonName::new("Mr.", "Somchai", "Jaidee"),
            dob: CardDate::new(15, 1, 2530),
            issue_date: CardDate::new(1, 6, 2563),
            expire_date: CardDate::new(14, 1, 2572),
            address: AddressRecord::from_raw(
                "123/4 หมู่ที่ 5 ตำบลบางรัก อำเภอบางรัก จังหวัดกรุงเทพมหานคร",
            ),
            issuer: "สำนักงานเขตบางรัก".to_string(),
            photo: vec![0xFF, 0xD8, 0xFF, 0xE0],
            read_at: Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap(),
        }
    }

    #[rstest]
    #[case("นาย#สมชาย##ใจดี", "นาย", "สมชาย", None, "ใจดี")]
    #[case("Mr.#Somchai#Lee#Jaidee", "Mr.", "Somchai", Some("Lee"), "Jaidee")]
    #[case("Miss#Ploy#Srisuk", "Miss", "Ploy", None, "Srisuk")]
    #[case("  Mr.# Somchai ## Jaidee  ", "Mr.", "Somchai", None, "Jaidee")]
    fn test_person_name_from_card(
        #[case] raw: &str,
        #[case] prefix: &str,
        #[case] first: &str,
        #[case] middle: Option<&str>,
        #[case] last: &str,
    ) {
        let name = PersonName::from_card_str(raw).unwrap();
        assert_eq!(name.prefix, prefix);
        assert_eq!(name.firstname, first);
        assert_eq!(name.middlename.as_deref(), middle);
        assert_eq!(name.lastname, last);
    }

    #[test]
    fn test_person_name_malformed() {
        assert!(PersonName::from_card_str("Somchai").is_err());
        assert!(PersonName::from_card_str("Mr.#Somchai").is_err());
    }

    #[test]
    fn test_person_name_display() {
        let name = PersonName::new("นาย", "สมชาย", "ใจดี");
        assert_eq!(name.to_string(), "นาย สมชาย ใจดี");
    }

    #[rstest]
    #[case("25300115", 15, 1, 2530)]
    #[case("25000000", 0, 0, 2500)]
    #[case("99999999", 99, 99, 9999)]
    fn test_card_date_from_card(
        #[case] raw: &str,
        #[case] day: u8,
        #[case] month: u8,
        #[case] year: u16,
    ) {
        assert_eq!(CardDate::from_card_str(raw).unwrap(), CardDate::new(day, month, year));
    }

    #[rstest]
    #[case("2530011")]
    #[case("2530-1-15")]
    #[case("")]
    fn test_card_date_malformed(#[case] raw: &str) {
        assert!(CardDate::from_card_str(raw).is_err());
    }

    #[test]
    fn test_card_date_conversion() {
        let date = CardDate::new(15, 1, 2530);
        assert_eq!(date.to_naive_date(), NaiveDate::from_ymd_opt(1987, 1, 15));
        assert_eq!(date.to_string(), "15/1/2530");

        assert_eq!(CardDate::new(0, 0, 2500).to_naive_date(), None);
        assert_eq!(CardDate::new(99, 99, 9999).to_naive_date(), None);
        assert!(CardDate::new(99, 99, 9999).is_lifelong());
    }

    #[test]
    fn test_is_expired() {
        let record = sample_record();
        let before = NaiveDate::from_ymd_opt(2029, 1, 14).unwrap();
        let after = NaiveDate::from_ymd_opt(2029, 1, 15).unwrap();
        assert!(!record.is_expired(before));
        assert!(record.is_expired(after));

        let lifelong = PersonRecord {
            expire_date: CardDate::new(99, 99, 9999),
            ..sample_record()
        };
        assert!(!lifelong.is_expired(after));
    }

    #[test]
    fn test_person_record_json_layout() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["cid"], "1101700203451");
        assert_eq!(json["nameTH"]["firstname"], "สมชาย");
        assert_eq!(json["nameEN"]["lastname"], "Jaidee");
        assert!(json["nameEN"].get("middlename").is_none());
        assert_eq!(json["dob"]["year"], 2530);
        assert_eq!(json["expireDate"]["day"], 14);
        assert_eq!(json["address"]["villageNumber"], "5");
        assert_eq!(json["address"]["road"], "-");
        assert_eq!(json["photo"], "/9j/4A==");
        assert_eq!(json["readAt"], "2025-01-15T12:30:00Z");
    }

    #[test]
    fn test_person_record_json_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: PersonRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_card_field_order_and_names() {
        assert_eq!(CardField::ALL.first(), Some(&CardField::Cid));
        assert_eq!(CardField::ALL.last(), Some(&CardField::Photo));
        assert_eq!(CardField::DateOfBirth.to_string(), "dob");
        assert_eq!(
            serde_json::to_string(&CardField::NameTh).unwrap(),
            "\"nameTH\""
        );
    }
}
