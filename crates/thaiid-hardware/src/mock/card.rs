//! Mock ID card for testing and development.
//!
//! A [`MockCard`] serves the fields of a [`CardFixture`] through the
//! [`IdCard`] trait. Individual fields can be made to fail and reads can be
//! slowed down, which is how tests simulate a card pulled out mid-read.

use crate::{HardwareError, Result, traits::IdCard};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thaiid_core::{CardDate, CardField, PersonName, types::photo_base64};

/// Contents of a simulated card.
///
/// Uses the same JSON field names as the HTTP record, so a fixture file can
/// be written by hand or saved from a previous `/api/person` response (the
/// extra `readAt` field is ignored and the address is taken as the raw card
/// string or the `fullAddress` of a decomposed record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFixture {
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

    #[serde(with = "raw_address")]
    pub address: String,

    pub issuer: String,

    #[serde(default, with = "photo_base64")]
    pub photo: Vec<u8>,
}

impl CardFixture {
    /// A complete, well-formed card used by tests and the demo server.
    pub fn sample() -> Self {
        Self {
            cid: "1101700203451".to_string(),
            name_th: PersonName::new("นาย", "สมชาย", "ใจดี"),
            name_en: PersonName::new("Mr.", "Somchai", "Jaidee"),
            dob: CardDate::new(15, 1, 2530),
            issue_date: CardDate::new(1, 6, 2563),
            expire_date: CardDate::new(14, 1, 2572),
            address: "123/4 หมู่ที่ 5 ถนนพหลโยธิน ตำบลคลองหนึ่ง อำเภอคลองหลวง จังหวัดปทุมธานี"
                .to_string(),
            issuer: "ท้องถิ่นอำเภอคลองหลวง/ปทุมธานี".to_string(),
            photo: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46],
        }
    }

    /// Load a fixture from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a fixture error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HardwareError::fixture(format!("Cannot read fixture {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            HardwareError::fixture(format!("Invalid fixture {}: {e}", path.display()))
        })
    }
}

/// The address is a plain string on the card; accept a decomposed record too.
mod raw_address {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AddressInput {
        Raw(String),
        Record {
            #[serde(rename = "fullAddress")]
            full_address: String,
        },
    }

    pub fn serialize<S: Serializer>(address: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(address)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match AddressInput::deserialize(deserializer)? {
            AddressInput::Raw(raw) => raw,
            AddressInput::Record { full_address } => full_address,
        })
    }
}

/// Simulated Thai ID card.
///
/// # Examples
///
/// ```
/// use thaiid_hardware::mock::{CardFixture, MockCard};
/// use thaiid_hardware::traits::IdCard;
/// use thaiid_core::CardField;
///
/// #[tokio::main]
/// async fn main() {
///     let mut card = MockCard::new("Mock Reader", CardFixture::sample()).fail_on(CardField::Photo);
///
///     assert_eq!(card.cid().await.unwrap(), "1101700203451");
///     assert!(card.photo().await.is_err());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockCard {
    /// Reader the card was inserted into
    reader: String,

    /// Card contents
    fixture: CardFixture,

    /// Fields whose read fails
    failures: HashSet<CardField>,

    /// Simulated per-field read latency
    read_delay: Option<Duration>,
}

impl MockCard {
    /// Create a card serving `fixture`.
    pub fn new(reader: impl Into<String>, fixture: CardFixture) -> Self {
        Self {
            reader: reader.into(),
            fixture,
            failures: HashSet::new(),
            read_delay: None,
        }
    }

    /// Make reads of `field` fail with a card read error.
    pub fn fail_on(mut self, field: CardField) -> Self {
        self.failures.insert(field);
        self
    }

    /// Delay every field read by `delay`.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Card contents.
    pub fn fixture(&self) -> &CardFixture {
        &self.fixture
    }

    async fn read<T>(&self, field: CardField, value: impl FnOnce(&CardFixture) -> T) -> Result<T> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.contains(&field) {
            return Err(HardwareError::card_read(format!(
                "{field} unreadable on {}",
                self.reader
            )));
        }

        Ok(value(&self.fixture))
    }
}

impl IdCard for MockCard {
    fn reader(&self) -> &str {
        &self.reader
    }

    async fn cid(&mut self) -> Result<String> {
        self.read(CardField::Cid, |f| f.cid.clone()).await
    }

    async fn name_th(&mut self) -> Result<PersonName> {
        self.read(CardField::NameTh, |f| f.name_th.clone()).await
    }

    async fn name_en(&mut self) -> Result<PersonName> {
        self.read(CardField::NameEn, |f| f.name_en.clone()).await
    }

    async fn date_of_birth(&mut self) -> Result<CardDate> {
        self.read(CardField::DateOfBirth, |f| f.dob).await
    }

    async fn issue_date(&mut self) -> Result<CardDate> {
        self.read(CardField::IssueDate, |f| f.issue_date).await
    }

    async fn expire_date(&mut self) -> Result<CardDate> {
        self.read(CardField::ExpireDate, |f| f.expire_date).await
    }

    async fn address(&mut self) -> Result<String> {
        self.read(CardField::Address, |f| f.address.clone()).await
    }

    async fn issuer(&mut self) -> Result<String> {
        self.read(CardField::Issuer, |f| f.issuer.clone()).await
    }

    async fn photo(&mut self) -> Result<Vec<u8>> {
        self.read(CardField::Photo, |f| f.photo.clone()).await
    }
}
