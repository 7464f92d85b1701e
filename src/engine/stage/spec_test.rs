use serde_json::json;

use crate::engine::errors::MergeError;
use crate::engine::stage::{parse_body, parse_stage, serialize_stage};
use crate::engine::types::{CursorId, HostAndPort};

#[test]
fn parses_full_stage() {
    let params = parse_stage(&json!({
        "$mergeCursors": {
            "nss": "db.coll",
            "remotes": [
                {"host": "a:1", "id": 4, "firstBatch": [{"k": 1}]},
                {"host": "b:1", "id": 0}
            ],
            "sort": {"k": 1, "t": -1},
            "batchSize": 10
        }
    }))
    .expect("valid stage");

    assert_eq!(params.nss, "db.coll");
    assert_eq!(params.remotes.len(), 2);
    assert_eq!(params.remotes[0].host, HostAndPort::new("a:1"));
    assert_eq!(params.remotes[0].cursor_id, CursorId::new(4));
    assert_eq!(params.remotes[0].first_batch.len(), 1);
    assert!(params.remotes[1].cursor_id.is_exhausted());
    assert_eq!(
        params.sort.map(|sort| sort.to_json()),
        Some(json!({"k": 1, "t": -1}))
    );
    assert_eq!(params.batch_size, Some(10));
}

#[test]
fn serialized_stage_parses_back() {
    let original = json!({
        "$mergeCursors": {
            "nss": "db.coll",
            "remotes": [{"host": "a:1", "id": 4}],
            "sort": {"z": -1, "a": 1}
        }
    });
    let params = parse_stage(&original).expect("valid stage");
    assert_eq!(serialize_stage(&params).expect("serialize"), original);
}

#[test]
fn rejects_wrong_stage_name() {
    let error = parse_stage(&json!({"$match": {}})).expect_err("wrong stage");
    assert!(matches!(error, MergeError::InvalidSpec(message) if message.contains("$match")));
}

#[test]
fn rejects_extra_top_level_fields() {
    let result = parse_stage(&json!({"$mergeCursors": {"nss": "db.c"}, "$sort": {"k": 1}}));
    assert!(matches!(result, Err(MergeError::InvalidSpec(_))));
}

#[test]
fn rejects_non_object_body() {
    assert!(matches!(parse_body(&json!([1])), Err(MergeError::InvalidSpec(_))));
    assert!(matches!(parse_stage(&json!("x")), Err(MergeError::InvalidSpec(_))));
}

#[test]
fn rejects_unknown_body_fields() {
    let result = parse_body(&json!({"nss": "db.c", "tailable": true}));
    assert!(matches!(result, Err(MergeError::InvalidSpec(_))));
}

#[test]
fn rejects_missing_namespace() {
    assert!(matches!(
        parse_body(&json!({"remotes": []})),
        Err(MergeError::InvalidSpec(_))
    ));
    assert!(matches!(
        parse_body(&json!({"nss": ""})),
        Err(MergeError::InvalidSpec(_))
    ));
}

#[test]
fn rejects_invalid_sort_pattern() {
    let result = parse_body(&json!({"nss": "db.c", "sort": {"k": 2}}));
    assert!(matches!(result, Err(MergeError::InvalidSpec(message)) if message.contains("1 or -1")));
}

#[test]
fn rejects_duplicate_live_cursor() {
    let result = parse_body(&json!({
        "nss": "db.c",
        "remotes": [{"host": "a:1", "id": 2}, {"host": "a:1", "id": 2}]
    }));
    assert!(matches!(result, Err(MergeError::InvalidSpec(_))));
}
