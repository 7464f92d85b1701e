use std::cmp::Ordering;

use serde_json::json;

use crate::engine::errors::MergeError;
use crate::engine::sort::{SortDirection, SortKey, SortSpec};
use crate::engine::types::document;

#[test]
fn parses_pattern_preserving_key_order() {
    let spec = SortSpec::from_json(&json!({"b": -1, "a": 1})).expect("valid pattern");

    assert_eq!(
        spec.keys(),
        &[SortKey::descending("b"), SortKey::ascending("a")]
    );
    assert_eq!(spec.to_json().to_string(), r#"{"b":-1,"a":1}"#);
}

#[test]
fn accepts_float_directions() {
    let spec = SortSpec::from_json(&json!({"a": 1.0, "b": -1.0})).expect("valid pattern");
    assert_eq!(spec.keys()[0].direction, SortDirection::Ascending);
    assert_eq!(spec.keys()[1].direction, SortDirection::Descending);
}

#[test]
fn rejects_invalid_patterns() {
    let invalid = [
        json!({}),
        json!([1]),
        json!({"a": 0}),
        json!({"a": "asc"}),
        json!({"a": {"$meta": "textScore"}}),
        json!({"": 1}),
        json!({"a..b": 1}),
    ];

    for pattern in invalid {
        let result = SortSpec::from_json(&pattern);
        assert!(
            matches!(result, Err(MergeError::InvalidSort(_))),
            "pattern {} should be rejected",
            pattern
        );
    }
}

#[test]
fn rejects_duplicate_fields() {
    let result = SortSpec::new(vec![SortKey::ascending("a"), SortKey::descending("a")]);
    assert!(matches!(result, Err(MergeError::InvalidSort(_))));
}

#[test]
fn compares_documents_with_mixed_directions() {
    let spec = SortSpec::from_json(&json!({"group": 1, "score": -1})).unwrap();

    let low_group = document(json!({"group": 1, "score": 1}));
    let high_score = document(json!({"group": 2, "score": 9}));
    let low_score = document(json!({"group": 2, "score": 3}));

    assert_eq!(spec.compare(&low_group, &high_score), Ordering::Less);
    assert_eq!(spec.compare(&high_score, &low_score), Ordering::Less);
    assert_eq!(spec.compare(&low_score, &low_score), Ordering::Equal);
}

#[test]
fn missing_fields_sort_as_null() {
    let spec = SortSpec::from_json(&json!({"a.b": 1})).unwrap();

    let missing = document(json!({"other": 1}));
    let present = document(json!({"a": {"b": 0}}));

    assert_eq!(spec.compare(&missing, &present), Ordering::Less);
    assert_eq!(spec.extract_key(&missing), vec![json!(null)]);
}

#[test]
fn extracted_keys_compare_like_documents() {
    let spec = SortSpec::from_json(&json!({"k": -1})).unwrap();
    let a = document(json!({"k": 10}));
    let b = document(json!({"k": 20}));

    let ka = spec.extract_key(&a);
    let kb = spec.extract_key(&b);

    assert_eq!(spec.compare_keys(&ka, &kb), spec.compare(&a, &b));
    assert_eq!(spec.compare_keys(&ka, &kb), Ordering::Greater);
}

#[test]
fn serde_round_trips_through_json_object() {
    let spec = SortSpec::from_json(&json!({"ts": 1, "id": -1})).unwrap();

    let encoded = serde_json::to_value(&spec).expect("serialize");
    assert_eq!(encoded, json!({"ts": 1, "id": -1}));

    let decoded: SortSpec = serde_json::from_value(encoded).expect("deserialize");
    assert_eq!(decoded, spec);
}
