//! Address decomposition.
//!
//! Thai ID cards store the registered address as one free-form string. This
//! module splits it into house number, village number, road, sub-district,
//! district and province using the keyword anchors listed in
//! [`constants`](crate::constants).
//!
//! # Grammar
//!
//! ```text
//! <house>[ หมู่ที่ <n>] [ถนน <name>] [ซ. <name> [n]] [แยก <n>] (ตำบล|แขวง) <name> (อำเภอ|เขต) <name> [จังหวัด <name>]
//! ```
//!
//! Groups are matched in that fixed order. The sub-district and district
//! anchors are mandatory; without them decomposition fails and every part
//! stays [`AddressPart::Unknown`].
//!
//! A `<name>` is a run of Thai characters and may itself contain anchor
//! words (`บางเขต`, `สามแยก`). Each name first takes the whole run and only
//! gives characters back when the rest of the grammar cannot match otherwise,
//! so it ends at the last anchor after which the remaining groups still fit.
//! An optional group is tried present first and absent second, which makes a
//! keyword with no value count as absent.
//!
//! `<house>` is `digits ('/' digits)*`. That is wider than the strict
//! `digits/digits` form cards normally carry: bare numbers such as `99` and
//! multi-part numbers such as `1/2/3` are accepted as well. Digits directly
//! after the village or junction keyword never start a house number.
//!
//! # Examples
//!
//! ```
//! use thaiid_core::address::{AddressPart, AddressRecord};
//!
//! let address = AddressRecord::from_raw(
//!     "123/4 หมู่ที่ 5 ตำบลบางรัก อำเภอบางรัก จังหวัดกรุงเทพมหานคร",
//! );
//!
//! assert_eq!(address.house_number.as_deref(), Some("123/4"));
//! assert_eq!(address.village_number.as_deref(), Some("5"));
//! assert_eq!(address.road, AddressPart::Unknown);
//! assert_eq!(address.province.as_deref(), Some("กรุงเทพมหานคร"));
//! ```

use crate::{
    Result,
    constants::{
        CARD_FIELD_SEPARATOR, DISTRICT_KEYWORDS, JUNCTION_KEYWORD, PROVINCE_KEYWORD,
        ROAD_KEYWORD, SENTINEL, SOI_KEYWORDS, SUB_DISTRICT_KEYWORDS, THAI_RANGE_END,
        THAI_RANGE_START, VILLAGE_KEYWORD,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One decomposed address field.
///
/// Serialized as the plain string, or as the sentinel `"-"` when the field
/// was not present in the source address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AddressPart {
    /// Value extracted from the address.
    Known(String),

    /// Field not present in the address.
    #[default]
    Unknown,
}

impl AddressPart {
    pub fn known(value: impl Into<String>) -> Self {
        Self::Known(value.into())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// The extracted value, if any.
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown => None,
        }
    }
}

impl From<Option<&str>> for AddressPart {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Unknown, |v| Self::Known(v.to_string()))
    }
}

impl From<String> for AddressPart {
    fn from(value: String) -> Self {
        if value == SENTINEL {
            Self::Unknown
        } else {
            Self::Known(value)
        }
    }
}

impl From<AddressPart> for String {
    fn from(part: AddressPart) -> Self {
        match part {
            AddressPart::Known(value) => value,
            AddressPart::Unknown => SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for AddressPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_deref().unwrap_or(SENTINEL))
    }
}

/// Structured address with the original string preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    /// The address exactly as read from the card.
    pub full_address: String,
    pub house_number: AddressPart,
    pub village_number: AddressPart,
    pub road: AddressPart,
    pub sub_district: AddressPart,
    pub district: AddressPart,
    pub province: AddressPart,
}

impl AddressRecord {
    /// Record with every part unknown and the raw string preserved.
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            full_address: raw.into(),
            ..Self::default()
        }
    }

    /// Decompose `raw`, falling back to [`AddressRecord::unparsed`].
    pub fn from_raw(raw: &str) -> Self {
        decompose(raw).unwrap_or_else(|_| Self::unparsed(raw))
    }

    /// Whether structured parts are available.
    pub fn is_decomposed(&self) -> bool {
        [
            &self.house_number,
            &self.village_number,
            &self.road,
            &self.sub_district,
            &self.district,
            &self.province,
        ]
        .iter()
        .any(|part| part.is_known())
    }
}

/// Decompose a raw card address into its parts.
///
/// The first position in `raw` from which the whole grammar matches wins.
///
/// # Errors
/// Returns `Error::AddressParse` when no position satisfies the grammar,
/// typically because a sub-district or district anchor is missing.
pub fn decompose(raw: &str) -> Result<AddressRecord> {
    house_number_starts(raw)
        .find_map(|start| Cursor::at(raw, start).parse_address())
        .map(|parts| parts.into_record(raw))
        .ok_or_else(|| Error::AddressParse {
            address: raw.to_string(),
        })
}

/// Byte offsets where a house number may begin: the start of every ASCII
/// digit run that is not the value of a village or junction keyword.
fn house_number_starts(raw: &str) -> impl Iterator<Item = usize> + '_ {
    raw.char_indices()
        .filter(move |&(idx, c)| {
            c.is_ascii_digit()
                && !raw[..idx]
                    .chars()
                    .next_back()
                    .is_some_and(|prev| prev.is_ascii_digit())
        })
        .map(|(idx, _)| idx)
        .filter(move |&idx| {
            let before = raw[..idx].trim_end_matches(is_separator);
            !before.ends_with(VILLAGE_KEYWORD) && !before.ends_with(JUNCTION_KEYWORD)
        })
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == CARD_FIELD_SEPARATOR
}

fn is_thai(c: char) -> bool {
    (THAI_RANGE_START..=THAI_RANGE_END).contains(&c)
}

#[derive(Debug, Default)]
struct AddressParts<'a> {
    house_number: Option<&'a str>,
    village_number: Option<&'a str>,
    road: Option<&'a str>,
    sub_district: Option<&'a str>,
    district: Option<&'a str>,
    province: Option<&'a str>,
}

impl<'a> AddressParts<'a> {
    fn set(&mut self, group: Group, value: Option<&'a str>) {
        match group {
            Group::HouseNumber => self.house_number = value,
            Group::VillageNumber => self.village_number = value,
            Group::Road => self.road = value,
            // Soi and junction are consumed but not reported.
            Group::Soi | Group::Junction => {}
            Group::SubDistrict => self.sub_district = value,
            Group::District => self.district = value,
            Group::Province => self.province = value,
        }
    }

    fn into_record(self, raw: &str) -> AddressRecord {
        AddressRecord {
            full_address: raw.to_string(),
            house_number: self.house_number.into(),
            village_number: self.village_number.into(),
            road: self.road.into(),
            sub_district: self.sub_district.into(),
            district: self.district.into(),
            province: self.province.into(),
        }
    }
}

/// One slot of the address grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    HouseNumber,
    VillageNumber,
    Road,
    Soi,
    Junction,
    SubDistrict,
    District,
    Province,
}

impl Group {
    const ORDER: [Group; 8] = [
        Group::HouseNumber,
        Group::VillageNumber,
        Group::Road,
        Group::Soi,
        Group::Junction,
        Group::SubDistrict,
        Group::District,
        Group::Province,
    ];

    fn is_optional(self) -> bool {
        !matches!(self, Group::HouseNumber | Group::SubDistrict | Group::District)
    }
}

/// Position within the address being decomposed. `Copy` so every
/// alternative of a group can continue from its own cursor.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn advance(self, len: usize) -> Self {
        Self {
            pos: self.pos + len,
            ..self
        }
    }

    fn skip_separators(self) -> Self {
        let rest = self.rest();
        self.advance(rest.len() - rest.trim_start_matches(is_separator).len())
    }

    /// Past one of `keywords` and any separators after it.
    fn after_keyword(self, keywords: &[&str]) -> Option<Self> {
        keywords
            .iter()
            .find(|k| self.rest().starts_with(**k))
            .map(|k| self.advance(k.len()).skip_separators())
    }

    fn digits(self) -> Option<(Self, &'a str)> {
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        (len > 0).then(|| (self.advance(len), &rest[..len]))
    }

    /// `digits ('/' digits)*`
    fn house_number(self) -> Option<(Self, &'a str)> {
        let (mut end, _) = self.digits()?;
        while let Some((next, _)) = end.after_slash().and_then(Self::digits) {
            end = next;
        }
        Some((end, &self.input[self.pos..end.pos]))
    }

    fn after_slash(self) -> Option<Self> {
        self.rest().starts_with('/').then(|| self.advance(1))
    }

    /// Every non-empty prefix of the Thai run at the cursor, longest first.
    fn names(self) -> impl Iterator<Item = (Self, &'a str)> {
        let rest = self.rest();
        let run = rest.find(|c: char| !is_thai(c)).unwrap_or(rest.len());
        rest[..run]
            .char_indices()
            .map(|(idx, c)| idx + c.len_utf8())
            .rev()
            .map(move |len| (self.advance(len), &rest[..len]))
    }

    /// `keyword <name>` for every possible name length.
    fn named(self, keywords: &[&str]) -> Vec<(Self, Option<&'a str>)> {
        self.after_keyword(keywords)
            .into_iter()
            .flat_map(Self::names)
            .map(|(next, name)| (next, Some(name)))
            .collect()
    }

    /// Ways `group` can match here, in the order they are tried. An optional
    /// group ends with its absent alternative.
    fn alternatives(self, group: Group) -> Vec<(Self, Option<&'a str>)> {
        let mut found: Vec<_> = match group {
            Group::HouseNumber => self
                .house_number()
                .map(|(next, value)| (next, Some(value)))
                .into_iter()
                .collect(),
            Group::VillageNumber => self
                .after_keyword(&[VILLAGE_KEYWORD])
                .and_then(Self::digits)
                .map(|(next, value)| (next, Some(value)))
                .into_iter()
                .collect(),
            Group::Road => self.named(&[ROAD_KEYWORD]),
            Group::Soi => self
                .after_keyword(&SOI_KEYWORDS)
                .into_iter()
                .flat_map(Self::names)
                .map(|(next, _)| {
                    let next = next.skip_separators();
                    (next.digits().map_or(next, |(end, _)| end), None)
                })
                .collect(),
            Group::Junction => self
                .after_keyword(&[JUNCTION_KEYWORD])
                .and_then(Self::digits)
                .map(|(next, _)| (next, None))
                .into_iter()
                .collect(),
            Group::SubDistrict => self.named(&SUB_DISTRICT_KEYWORDS),
            Group::District => self.named(&DISTRICT_KEYWORDS),
            Group::Province => self.named(&[PROVINCE_KEYWORD]),
        };
        if group.is_optional() {
            found.push((self, None));
        }
        found
    }

    /// Depth-first search over `groups`; the first complete match wins and
    /// is left in `parts`.
    fn match_groups(self, groups: &[Group], parts: &mut AddressParts<'a>) -> bool {
        let Some((&group, remaining)) = groups.split_first() else {
            return true;
        };

        self.skip_separators()
            .alternatives(group)
            .into_iter()
            .any(|(next, value)| {
                parts.set(group, value);
                next.match_groups(remaining, parts)
            })
    }

    fn parse_address(self) -> Option<AddressParts<'a>> {
        let mut parts = AddressParts::default();
        self.match_groups(&Group::ORDER, &mut parts).then_some(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parts(address: &AddressRecord) -> [String; 6] {
        [
            address.house_number.to_string(),
            address.village_number.to_string(),
            address.road.to_string(),
            address.sub_district.to_string(),
            address.district.to_string(),
            address.province.to_string(),
        ]
    }

    #[rstest]
    #[case(
        "123/4 หมู่ที่ 5 ตำบลบางรัก อำเภอบางรัก จังหวัดกรุงเทพมหานคร",
        ["123/4", "5", "-", "บางรัก", "บางรัก", "กรุงเทพมหานคร"]
    )]
    #[case(
        "99/1 ถนนสีลม แขวงสุริยวงศ์ เขตบางรัก กรุงเทพมหานคร",
        ["99/1", "-", "สีลม", "สุริยวงศ์", "บางรัก", "-"]
    )]
    #[case(
        "55/12 หมู่ที่ 3 ถนนมิตรภาพ ตำบลในเมือง อำเภอเมืองขอนแก่น จังหวัดขอนแก่น",
        ["55/12", "3", "มิตรภาพ", "ในเมือง", "เมืองขอนแก่น", "ขอนแก่น"]
    )]
    #[case(
        "10/7 ถนนสุขุมวิท ซ.อารีย์ 5 แยก 2 แขวงพระโขนง เขตคลองเตย จังหวัดกรุงเทพมหานคร",
        ["10/7", "-", "สุขุมวิท", "พระโขนง", "คลองเตย", "กรุงเทพมหานคร"]
    )]
    #[case(
        "88/8#หมู่ที่ 4###ตำบลหนองปรือ#อำเภอบางละมุง#จังหวัดชลบุรี",
        ["88/8", "4", "-", "หนองปรือ", "บางละมุง", "ชลบุรี"]
    )]
    #[case(
        "12/3 ตำบลบางรัก อำเภอบางรัก#จังหวัดกรุงเทพมหานคร",
        ["12/3", "-", "-", "บางรัก", "บางรัก", "กรุงเทพมหานคร"]
    )]
    #[case(
        "99 หมู่ที่ 2 ตำบลท่าช้าง อำเภอเมืองจันทบุรี จังหวัดจันทบุรี",
        ["99", "2", "-", "ท่าช้าง", "เมืองจันทบุรี", "จันทบุรี"]
    )]
    #[case(
        "7/1 ซอยรามคำแหง 24 แขวงหัวหมาก เขตบางกะปิ",
        ["7/1", "-", "-", "หัวหมาก", "บางกะปิ", "-"]
    )]
    fn test_decompose(#[case] raw: &str, #[case] expected: [&str; 6]) {
        let address = decompose(raw).unwrap();
        assert_eq!(address.full_address, raw);
        assert_eq!(parts(&address), expected.map(String::from));
    }

    #[rstest]
    #[case(
        "12/3 ตำบลบางเขตใต้ อำเภอเมือง จังหวัดชลบุรี",
        ["12/3", "-", "-", "บางเขตใต้", "เมือง", "ชลบุรี"]
    )]
    #[case(
        "99/1 ถนนสามแยกบางนา แขวงบางนา เขตบางนา",
        ["99/1", "-", "สามแยกบางนา", "บางนา", "บางนา", "-"]
    )]
    #[case(
        "5/1 ตำบลอำเภอเก่า อำเภอเมือง จังหวัดลำปาง",
        ["5/1", "-", "-", "อำเภอเก่า", "เมือง", "ลำปาง"]
    )]
    #[case(
        "8/2 แขวงวังใหม่ เขตจังหวัดใหม่ กรุงเทพมหานคร",
        ["8/2", "-", "-", "วังใหม่", "จังหวัดใหม่", "-"]
    )]
    #[case(
        "1/1 แขวงบางเขตเขตบางเขต",
        ["1/1", "-", "-", "บางเขต", "บางเขต", "-"]
    )]
    #[case(
        "45/6 ถนนสุขุมวิทซ.อารีย์ แขวงพระโขนง เขตคลองเตย",
        ["45/6", "-", "สุขุมวิท", "พระโขนง", "คลองเตย", "-"]
    )]
    fn test_decompose_names_containing_anchors(
        #[case] raw: &str,
        #[case] expected: [&str; 6],
    ) {
        assert_eq!(parts(&decompose(raw).unwrap()), expected.map(String::from));
    }

    #[test]
    fn test_decompose_glued_anchors_are_greedy() {
        // With no separators the district name runs to the end of the Thai
        // text, swallowing the province keyword.
        let address = decompose("12/3 ตำบลบางรักอำเภอบางรักจังหวัดกรุงเทพมหานคร").unwrap();
        assert_eq!(address.sub_district.as_deref(), Some("บางรัก"));
        assert_eq!(
            address.district.as_deref(),
            Some("บางรักจังหวัดกรุงเทพมหานคร")
        );
        assert_eq!(address.province, AddressPart::Unknown);
    }

    #[test]
    fn test_decompose_bare_house_number() {
        let address = decompose("99 ตำบลบางรัก อำเภอบางรัก").unwrap();
        assert_eq!(address.house_number.as_deref(), Some("99"));
    }

    #[rstest]
    #[case("123/4 หมู่ที่ 5 บางรัก บางรัก จังหวัดกรุงเทพมหานคร")]
    #[case("123/4 หมู่ที่ 5 ตำบลบางรัก จังหวัดกรุงเทพมหานคร")]
    #[case("123/4 หมู่ที่ 5 อำเภอบางรัก จังหวัดกรุงเทพมหานคร")]
    #[case("หมู่ที่ 5 ตำบลบางรัก อำเภอบางรัก")]
    #[case("ตำบลบางรัก อำเภอบางรัก")]
    #[case("")]
    #[case("not an address")]
    fn test_decompose_failure_keeps_full_address(#[case] raw: &str) {
        assert!(matches!(decompose(raw), Err(Error::AddressParse { .. })));

        let address = AddressRecord::from_raw(raw);
        assert_eq!(address.full_address, raw);
        assert_eq!(parts(&address), ["-"; 6].map(String::from));
        assert!(!address.is_decomposed());
    }

    #[test]
    fn test_decompose_skips_leading_text() {
        let address = decompose("บ้านเลขที่ 45/6 ตำบลช้างเผือก อำเภอเมืองเชียงใหม่").unwrap();
        assert_eq!(address.house_number.as_deref(), Some("45/6"));
        assert_eq!(address.sub_district.as_deref(), Some("ช้างเผือก"));
        assert_eq!(address.province, AddressPart::Unknown);
    }

    #[test]
    fn test_decompose_village_keyword_without_number_is_absent() {
        // "หมู่ที่" with no number leaves the keyword in front of the anchor,
        // so the grammar cannot continue.
        assert!(decompose("12/3 หมู่ที่ ตำบลบางรัก อำเภอบางรัก").is_err());
    }

    #[test]
    fn test_decompose_province_keyword_without_name() {
        let address = decompose("12/3 ตำบลบางรัก อำเภอบางรัก จังหวัด").unwrap();
        assert_eq!(address.province, AddressPart::Unknown);
        assert_eq!(address.district.as_deref(), Some("บางรัก"));
    }

    #[test]
    fn test_decompose_multi_slash_house_number() {
        let address = decompose("1/2/3 ตำบลบางรัก อำเภอบางรัก").unwrap();
        assert_eq!(address.house_number.as_deref(), Some("1/2/3"));
    }

    #[test]
    fn test_address_part_serde() {
        let known = AddressPart::known("บางรัก");
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"บางรัก\"");
        assert_eq!(serde_json::to_string(&AddressPart::Unknown).unwrap(), "\"-\"");

        let parsed: AddressPart = serde_json::from_str("\"-\"").unwrap();
        assert_eq!(parsed, AddressPart::Unknown);

        // The empty string is a value, not the sentinel.
        let parsed: AddressPart = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, AddressPart::known(""));
    }

    #[test]
    fn test_address_record_json_layout() {
        let address = AddressRecord::from_raw("99/1 ถนนสีลม แขวงสุริยวงศ์ เขตบางรัก");
        let json = serde_json::to_value(&address).unwrap();

        assert_eq!(json["fullAddress"], "99/1 ถนนสีลม แขวงสุริยวงศ์ เขตบางรัก");
        assert_eq!(json["houseNumber"], "99/1");
        assert_eq!(json["villageNumber"], "-");
        assert_eq!(json["road"], "สีลม");
        assert_eq!(json["subDistrict"], "สุริยวงศ์");
        assert_eq!(json["district"], "บางรัก");
        assert_eq!(json["province"], "-");
    }
}
