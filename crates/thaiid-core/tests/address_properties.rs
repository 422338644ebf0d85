//! Property-based tests for address decomposition.
//!
//! These tests generate addresses from the card grammar and arbitrary noise to
//! verify that decomposition recovers every generated part, and that it never
//! panics or loses the original string. Generated place names may contain
//! anchor words (`บางเขต`, `สามแยก`), which must stay inside the name.

use proptest::prelude::*;
use thaiid_core::{AddressPart, AddressRecord, decompose};

/// Strategy for Thai place names (consonants and vowels, no keywords).
fn thai_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[กงจนบปพมยรลวสหอ][าิีุู]?[กงนมยรลว]{1,6}")
        .expect("Failed to create Thai name regex strategy")
}

/// Keywords that also occur inside real place names.
const ANCHOR_WORDS: [&str; 9] = [
    "เขต", "อำเภอ", "แยก", "จังหวัด", "ตำบล", "แขวง", "ถนน", "ซอย", "หมู่",
];

/// Strategy for names with an anchor word embedded, e.g. `บางเขตใต้`.
fn name_with_anchor() -> impl Strategy<Value = String> {
    (thai_name(), prop::sample::select(ANCHOR_WORDS.to_vec()), thai_name())
        .prop_map(|(head, anchor, tail)| format!("{head}{anchor}{tail}"))
}

/// Strategy for place names, with or without an embedded anchor word.
fn place_name() -> impl Strategy<Value = String> {
    prop_oneof![thai_name(), name_with_anchor()]
}

/// Strategy for house numbers such as `12` or `123/4`.
fn house_number() -> impl Strategy<Value = String> {
    prop::string::string_regex("[1-9][0-9]{0,3}(/[1-9][0-9]{0,2})?")
        .expect("Failed to create house number regex strategy")
}

/// Strategy for separators between groups: spaces or the card's `#`.
fn separator() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ #]{1,3}").expect("Failed to create separator regex strategy")
}

#[derive(Debug, Clone)]
struct GeneratedAddress {
    house: String,
    village: Option<u16>,
    road: Option<String>,
    bangkok: bool,
    sub_district: String,
    district: String,
    province: Option<String>,
    sep: String,
}

impl GeneratedAddress {
    fn render(&self) -> String {
        let mut groups = vec![self.house.clone()];
        if let Some(village) = self.village {
            groups.push(format!("หมู่ที่ {village}"));
        }
        if let Some(road) = &self.road {
            groups.push(format!("ถนน{road}"));
        }
        let (sub_kw, district_kw) = if self.bangkok {
            ("แขวง", "เขต")
        } else {
            ("ตำบล", "อำเภอ")
        };
        groups.push(format!("{sub_kw}{}", self.sub_district));
        groups.push(format!("{district_kw}{}", self.district));
        if let Some(province) = &self.province {
            groups.push(format!("จังหวัด{province}"));
        }
        groups.join(&self.sep)
    }
}

fn generated_address() -> impl Strategy<Value = GeneratedAddress> {
    (
        house_number(),
        prop::option::of(1u16..=30),
        prop::option::of(place_name()),
        any::<bool>(),
        place_name(),
        place_name(),
        prop::option::of(place_name()),
        separator(),
    )
        .prop_map(
            |(house, village, road, bangkok, sub_district, district, province, sep)| {
                GeneratedAddress {
                    house,
                    village,
                    road,
                    bangkok,
                    sub_district,
                    district,
                    province,
                    sep,
                }
            },
        )
}

proptest! {
    /// Property: every part of a grammar-conforming address is recovered.
    #[test]
    fn prop_grammar_addresses_decompose(address in generated_address()) {
        let raw = address.render();
        let record = decompose(&raw).unwrap();

        prop_assert_eq!(&record.full_address, &raw);
        prop_assert_eq!(record.house_number.as_deref(), Some(address.house.as_str()));
        let village = address.village.map(|v| v.to_string());
        prop_assert_eq!(record.village_number.as_deref(), village.as_deref());
        prop_assert_eq!(record.road.as_deref(), address.road.as_deref());
        prop_assert_eq!(record.sub_district.as_deref(), Some(address.sub_district.as_str()));
        prop_assert_eq!(record.district.as_deref(), Some(address.district.as_str()));
        prop_assert_eq!(record.province.as_deref(), address.province.as_deref());
    }

    /// Property: a district name may start with an anchor word and the
    /// province keyword after it is still found.
    #[test]
    fn prop_anchor_prefixed_names(
        house in house_number(),
        sub_district in thai_name(),
        district in thai_name(),
        province in place_name(),
        anchor in prop::sample::select(ANCHOR_WORDS.to_vec()),
    ) {
        let district = format!("{anchor}{district}");
        let raw = format!("{house} แขวง{sub_district} เขต{district} จังหวัด{province}");
        let record = decompose(&raw).unwrap();

        prop_assert_eq!(record.sub_district.as_deref(), Some(sub_district.as_str()));
        prop_assert_eq!(record.district.as_deref(), Some(district.as_str()));
        prop_assert_eq!(record.province.as_deref(), Some(province.as_str()));
    }

    /// Property: decomposition never panics and always keeps the raw string.
    #[test]
    fn prop_arbitrary_input_is_preserved(raw in "\\PC{0,80}") {
        let record = AddressRecord::from_raw(&raw);
        prop_assert_eq!(&record.full_address, &raw);
    }

    /// Property: without a district anchor nothing is extracted.
    #[test]
    fn prop_missing_district_anchor_fails(
        house in house_number(),
        sub_district in thai_name(),
        province in thai_name(),
    ) {
        let raw = format!("{house} ตำบล{sub_district} จังหวัด{province}");
        let record = AddressRecord::from_raw(&raw);

        prop_assert!(decompose(&raw).is_err());
        prop_assert!(!record.is_decomposed());
        prop_assert_eq!(record.province, AddressPart::Unknown);
    }
}
