//! Thai ID card in a PC/SC reader.

use super::apdu::{self, FieldLocation, Status};
use crate::{HardwareError, Result, traits::IdCard};
use std::fmt;
use std::sync::Arc;
use thaiid_core::{CardDate, PersonName};

/// A connected card with the Thai ID applet selected.
///
/// PC/SC calls block, so every field read runs on the blocking thread pool.
pub struct PcscCard {
    card: Arc<pcsc::Card>,
    reader: String,
    get_response_p2: u8,
}

impl PcscCard {
    /// Select the Thai ID applet on a freshly connected card.
    ///
    /// Blocking; called from the reader's monitor thread.
    pub(super) fn select(card: pcsc::Card, reader: String, atr: &[u8]) -> Result<Self> {
        let get_response_p2 = apdu::get_response_p2(atr);
        transmit(&card, &apdu::SELECT_THAI_ID_APPLET, get_response_p2)?;

        Ok(Self {
            card: Arc::new(card),
            reader,
            get_response_p2,
        })
    }

    async fn read(&self, location: FieldLocation) -> Result<Vec<u8>> {
        let card = Arc::clone(&self.card);
        let p2 = self.get_response_p2;

        tokio::task::spawn_blocking(move || transmit(&card, &location.read_binary(), p2))
            .await?
    }

    async fn read_text(&self, location: FieldLocation) -> Result<String> {
        Ok(apdu::decode_text(&self.read(location).await?))
    }

    async fn read_name(&self, location: FieldLocation) -> Result<PersonName> {
        let raw = self.read_text(location).await?;
        PersonName::from_card_str(&raw).map_err(|e| HardwareError::invalid_data(e.to_string()))
    }

    async fn read_date(&self, location: FieldLocation) -> Result<CardDate> {
        let raw = self.read_text(location).await?;
        CardDate::from_card_str(&raw).map_err(|e| HardwareError::invalid_data(e.to_string()))
    }
}

impl fmt::Debug for PcscCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscCard")
            .field("reader", &self.reader)
            .field("get_response_p2", &self.get_response_p2)
            .finish_non_exhaustive()
    }
}

/// Send one command and collect its data, following up with GET RESPONSE
/// when the card asks for it.
fn transmit(card: &pcsc::Card, command: &[u8], get_response_p2: u8) -> Result<Vec<u8>> {
    let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
    let response = card.transmit(command, &mut buffer)?;

    match apdu::split_response(response)? {
        (data, Status::Ok) => Ok(data.to_vec()),
        (_, Status::MoreData(available)) => {
            let command = apdu::get_response(get_response_p2, available);
            let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
            let response = card.transmit(&command, &mut buffer)?;

            match apdu::split_response(response)? {
                (data, Status::Ok) => Ok(data.to_vec()),
                (_, Status::MoreData(_)) => Err(HardwareError::invalid_data(
                    "GET RESPONSE asked for another GET RESPONSE",
                )),
            }
        }
    }
}

impl IdCard for PcscCard {
    fn reader(&self) -> &str {
        &self.reader
    }

    async fn cid(&mut self) -> Result<String> {
        self.read_text(apdu::CID).await
    }

    async fn name_th(&mut self) -> Result<PersonName> {
        self.read_name(apdu::NAME_TH).await
    }

    async fn name_en(&mut self) -> Result<PersonName> {
        self.read_name(apdu::NAME_EN).await
    }

    async fn date_of_birth(&mut self) -> Result<CardDate> {
        self.read_date(apdu::DATE_OF_BIRTH).await
    }

    async fn issue_date(&mut self) -> Result<CardDate> {
        self.read_date(apdu::ISSUE_DATE).await
    }

    async fn expire_date(&mut self) -> Result<CardDate> {
        self.read_date(apdu::EXPIRE_DATE).await
    }

    async fn address(&mut self) -> Result<String> {
        let raw = self.read_text(apdu::ADDRESS).await?;
        Ok(apdu::normalize_address(&raw))
    }

    async fn issuer(&mut self) -> Result<String> {
        self.read_text(apdu::ISSUER).await
    }

    async fn photo(&mut self) -> Result<Vec<u8>> {
        let mut photo = Vec::with_capacity(
            usize::from(apdu::PHOTO_CHUNK_COUNT) * usize::from(apdu::PHOTO_CHUNK_LENGTH),
        );
        for chunk in apdu::photo_chunks() {
            photo.extend(self.read(chunk).await?);
        }
        Ok(photo)
    }
}
