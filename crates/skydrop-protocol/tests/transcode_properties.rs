//! Property tests for the transcoder.

use proptest::prelude::*;
use serde_json::{Map, Value as Json};
use skydrop_protocol::{deserialize, serialize, Kind};

/// Field names that never look like collection ids.
fn field_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,7}"
}

fn scalar() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i64>().prop_map(Json::from),
        (-1.0e9_f64..1.0e9).prop_map(Json::from),
        "[a-z0-9 -]{0,12}".prop_map(Json::String),
    ]
}

/// Arbitrary JSON whose objects are all records.
fn record_json() -> impl Strategy<Value = Json> {
    scalar().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
            prop::collection::vec((field_name(), inner), 0..6)
                .prop_map(|fields| Json::Object(fields.into_iter().collect())),
        ]
    })
}

/// A `drone-…` or `order-…` id.
fn collection_key() -> impl Strategy<Value = String> {
    (prop_oneof![Just("drone-"), Just("order-")], "[a-z0-9]{1,6}")
        .prop_map(|(prefix, id)| format!("{prefix}{id}"))
}

proptest! {
    /// Decoding then encoding reproduces the input, key order included.
    #[test]
    fn prop_record_json_round_trips(raw in record_json()) {
        let back = serialize(&deserialize(raw.clone()));
        // `Map` equality ignores order, the rendered text does not.
        prop_assert_eq!(back.to_string(), raw.to_string());
        prop_assert_eq!(back, raw);
    }

    /// An object led by an id key decodes to a collection with every key intact.
    #[test]
    fn prop_prefixed_first_key_decodes_to_collection(
        first in collection_key(),
        first_value in record_json(),
        rest in prop::collection::vec(("[A-Za-z0-9-]{1,10}", record_json()), 0..6),
    ) {
        let mut map = Map::new();
        map.insert(first.clone(), first_value);
        for (key, value) in rest {
            map.insert(key, value);
        }
        let raw = Json::Object(map);
        let expected_keys: Vec<String> = raw.as_object().unwrap().keys().cloned().collect();

        let value = deserialize(raw.clone());
        prop_assert_eq!(value.kind(), Kind::Collection);
        let keys: Vec<String> = value
            .as_collection()
            .unwrap()
            .keys()
            .map(str::to_owned)
            .collect();
        prop_assert_eq!(&keys[0], &first);
        prop_assert_eq!(keys, expected_keys);
        prop_assert_eq!(serialize(&value).to_string(), raw.to_string());
    }
}
