//! Card field extraction pipeline.
//!
//! Fields are fetched one after another in [`CardField::ALL`] order. The
//! first failing fetch aborts the read and nothing partial is returned.

use chrono::Utc;
use thaiid_core::{AddressRecord, CardField, Error, PersonRecord, Result, decompose};
use thaiid_hardware::{HardwareError, IdCard};
use tracing::{debug, info, warn};

/// Read a complete person record from `card`.
///
/// The raw address goes through the address decomposer; an address that
/// does not match keeps its full text with every part unknown.
///
/// # Errors
///
/// Returns `Error::FieldExtraction` naming the first field that could not
/// be read.
pub async fn read_person<C: IdCard>(card: &mut C) -> Result<PersonRecord> {
    let cid = card.cid().await.map_err(failed(CardField::Cid))?;
    let name_th = card.name_th().await.map_err(failed(CardField::NameTh))?;
    let name_en = card.name_en().await.map_err(failed(CardField::NameEn))?;
    let dob = card
        .date_of_birth()
        .await
        .map_err(failed(CardField::DateOfBirth))?;
    let issue_date = card
        .issue_date()
        .await
        .map_err(failed(CardField::IssueDate))?;
    let expire_date = card
        .expire_date()
        .await
        .map_err(failed(CardField::ExpireDate))?;
    let raw_address = card.address().await.map_err(failed(CardField::Address))?;
    let issuer = card.issuer().await.map_err(failed(CardField::Issuer))?;
    let photo = card.photo().await.map_err(failed(CardField::Photo))?;

    let address = match decompose(&raw_address) {
        Ok(address) => address,
        Err(e) => {
            warn!(error = %e, "Address kept undecomposed");
            AddressRecord::unparsed(raw_address)
        }
    };

    let record = PersonRecord {
        cid,
        name_th,
        name_en,
        dob,
        issue_date,
        expire_date,
        address,
        issuer,
        photo,
        read_at: Utc::now(),
    };

    info!(
        cid = %record.cid,
        name_th = %record.name_th,
        name_en = %record.name_en,
        dob = %record.dob,
        issue_date = %record.issue_date,
        expire_date = %record.expire_date,
        issuer = %record.issuer,
        photo_bytes = record.photo.len(),
        "Card read"
    );
    debug!(
        address = %record.address.full_address,
        house_number = %record.address.house_number,
        village_number = %record.address.village_number,
        road = %record.address.road,
        sub_district = %record.address.sub_district,
        district = %record.address.district,
        province = %record.address.province,
        "Address decomposed"
    );

    Ok(record)
}

fn failed(field: CardField) -> impl FnOnce(HardwareError) -> Error {
    move |e| Error::field_extraction(field, e.to_string())
}
