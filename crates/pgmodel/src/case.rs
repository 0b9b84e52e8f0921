//! Field-key conversion between API casing (`unitNumber`) and storage casing
//! (`unit_number`).
//!
//! The conversion is purely lexical. It round-trips for keys made of ASCII
//! letters and digits with no leading underscore and no adjacent uppercase
//! letters; keys like `_private` or `unit_no` do not survive a round trip.

use crate::record::Record;

/// Convert an API key to its storage column name.
///
/// Every uppercase ASCII letter becomes `_` followed by its lowercase form.
pub fn to_storage_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a storage column name to its API key.
///
/// Every `_` directly followed by a lowercase ASCII letter is dropped and the
/// letter uppercased. Any other underscore is kept.
pub fn to_api_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_lowercase() {
                    chars.next();
                    out.push(next.to_ascii_uppercase());
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// Rename every key of a record to storage casing. Values are untouched.
pub fn to_storage_record(record: Record) -> Record {
    record
        .into_iter()
        .map(|(key, value)| (to_storage_key(&key), value))
        .collect()
}

/// Rename every key of a record to API casing. Values are untouched.
pub fn to_api_record(record: Record) -> Record {
    record
        .into_iter()
        .map(|(key, value)| (to_api_key(&key), value))
        .collect()
}

/// [`to_storage_record`] for an optional record; `None` stays `None`.
pub fn to_storage_record_opt(record: Option<Record>) -> Option<Record> {
    record.map(to_storage_record)
}

/// [`to_api_record`] for an optional record; `None` stays `None`.
pub fn to_api_record_opt(record: Option<Record>) -> Option<Record> {
    record.map(to_api_record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    #[test]
    fn storage_key_basic() {
        assert_eq!(to_storage_key("unitNumber"), "unit_number");
        assert_eq!(to_storage_key("id"), "id");
        assert_eq!(to_storage_key("propertyManagerId"), "property_manager_id");
    }

    #[test]
    fn api_key_basic() {
        assert_eq!(to_api_key("unit_number"), "unitNumber");
        assert_eq!(to_api_key("id"), "id");
        assert_eq!(to_api_key("property_manager_id"), "propertyManagerId");
    }

    #[test]
    fn api_key_keeps_underscore_before_non_lowercase() {
        assert_eq!(to_api_key("line_2"), "line_2");
        assert_eq!(to_api_key("trailing_"), "trailing_");
        assert_eq!(to_api_key("a__b"), "a_B");
    }

    #[test]
    fn keys_round_trip() {
        let keys = [
            "id",
            "unitNumber",
            "rentAmount",
            "leaseStartDate",
            "address2",
            "address2Line",
            "x",
            "aBC",
            "maintenanceRequestId",
            "isActive",
        ];
        for key in keys {
            assert_eq!(to_api_key(&to_storage_key(key)), key, "key {key}");
        }
    }

    #[test]
    fn underscored_api_keys_are_not_reversible() {
        assert_eq!(to_storage_key("_private"), "_private");
        assert_eq!(to_api_key("_private"), "Private");
        assert_eq!(to_api_key(&to_storage_key("unit_no")), "unitNo");
    }

    #[test]
    fn record_mapping_commutes_with_key_mapping() {
        let record = Record::from_json(json!({
            "unitNumber": "A1",
            "rentAmount": 1200,
            "tags": ["corner", "balcony"],
            "meta": { "floor_plan": "2b" },
        }))
        .unwrap();

        let storage = to_storage_record(record.clone());
        let keys: Vec<&str> = storage.keys().collect();
        assert_eq!(keys, vec!["unit_number", "rent_amount", "tags", "meta"]);
        // Nested JSON values are values, not keys.
        assert_eq!(storage.get("meta"), Some(&json!({ "floor_plan": "2b" })));

        assert_eq!(to_api_record(storage), record);
    }

    #[test]
    fn absent_record_maps_to_absent() {
        assert_eq!(to_api_record_opt(None), None);
        assert_eq!(to_storage_record_opt(None), None);
    }

    /// `[a-z][a-z0-9]*` segments joined by single capitals.
    fn api_key_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z][a-z0-9]{0,6}([A-Z][a-z0-9]{0,6}){0,4}").unwrap()
    }

    /// `[a-z][a-z0-9]*` segments joined by single underscores.
    fn storage_key_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z][a-z0-9]{0,6}(_[a-z][a-z0-9]{0,6}){0,4}").unwrap()
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[ -~]{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(2, 8, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec(("[a-z_]{1,8}", inner), 0..4)
                    .prop_map(|fields| Value::Object(fields.into_iter().collect())),
            ]
        })
    }

    fn record_strategy() -> impl Strategy<Value = Record> {
        prop::collection::vec((api_key_strategy(), value_strategy()), 0..8).prop_map(|fields| {
            let mut record = Record::new();
            for (key, value) in fields {
                record.insert(key, value);
            }
            record
        })
    }

    proptest! {
        #[test]
        fn api_keys_round_trip(key in api_key_strategy()) {
            let storage = to_storage_key(&key);
            prop_assert!(!storage.chars().any(|c| c.is_ascii_uppercase()));
            prop_assert_eq!(to_api_key(&storage), key);
        }

        #[test]
        fn storage_keys_round_trip(key in storage_key_strategy()) {
            prop_assert_eq!(to_storage_key(&to_api_key(&key)), key);
        }

        #[test]
        fn record_mapping_maps_each_key(record in record_strategy()) {
            let storage = to_storage_record(record.clone());

            let expected: Vec<String> = record.keys().map(to_storage_key).collect();
            let actual: Vec<&str> = storage.keys().collect();
            prop_assert_eq!(actual, expected.iter().map(String::as_str).collect::<Vec<_>>());
            for key in record.keys() {
                prop_assert_eq!(storage.get(&to_storage_key(key)), record.get(key));
            }

            prop_assert_eq!(to_api_record(storage), record);
        }
    }
}
