//! Tests for request module

use super::*;
use crate::types::{JsonObject, MAX_BATCH_SIZE};
use pretty_assertions::assert_eq;
use serde_json::json;

fn object(value: serde_json::Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// Query Tests
// ============================================================================

#[test]
fn test_build_query_flat() {
    let query = build_query(&object(json!({"ID": 1})));
    assert_eq!(query, "ID=1");
}

#[test]
fn test_build_query_nested() {
    let query = build_query(&object(json!({
        "select": ["ID", "STATUS_ID"],
        "start": -1
    })));
    assert_eq!(query, "select%5B0%5D=ID&select%5B1%5D=STATUS_ID&start=-1");
}

#[test]
fn test_build_query_filter_operators() {
    let query = build_query(&object(json!({
        "filter": {"<ID": 60, ">=ID": 10}
    })));
    assert_eq!(query, "filter%5B%3CID%5D=60&filter%5B%3E%3DID%5D=10");
}

#[test]
fn test_build_query_skips_nulls_and_encodes_values() {
    let query = build_query(&object(json!({
        "filter": {">DATE": "2025-03-14T14:00:17+03:00", "TITLE": null},
        "halt": true
    })));
    assert_eq!(
        query,
        "filter%5B%3EDATE%5D=2025-03-14T14%3A00%3A17%2B03%3A00&halt=1"
    );
}

#[test]
fn test_build_query_empty() {
    assert_eq!(build_query(&JsonObject::new()), "");
}

// ============================================================================
// Request Tests
// ============================================================================

#[test]
fn test_request_query_without_parameters() {
    assert_eq!(Request::new("profile").query(), "profile");
}

#[test]
fn test_request_query_with_parameters() {
    let request = Request::new("department.get").param("ID", 1);
    assert_eq!(request.query(), "department.get?ID=1");
}

#[test]
fn test_request_with_start_copies() {
    let template = Request::new("crm.lead.list").param("select", json!(["ID"]));
    let page = template.with_start(100);

    assert_eq!(template.start(), None);
    assert_eq!(page.start(), Some(100));
    assert_eq!(page.method(), "crm.lead.list");
    assert_eq!(page.parameters()["select"], json!(["ID"]));
}

#[test]
fn test_request_with_filter_merges() {
    let template = Request::new("crm.timeline.comment.list")
        .param("filter", json!({"=ENTITY_TYPE": "deal"}));
    let request = template
        .with_filter(&object(json!({"=ENTITY_ID": 7})))
        .unwrap();

    assert_eq!(
        request.parameters()["filter"],
        json!({"=ENTITY_TYPE": "deal", "=ENTITY_ID": 7})
    );
    assert_eq!(template.parameters()["filter"], json!({"=ENTITY_TYPE": "deal"}));
}

#[test]
fn test_request_with_filter_creates_filter() {
    let request = Request::new("crm.deal.list")
        .with_filter(&object(json!({"STAGE_ID": "WON"})))
        .unwrap();
    assert_eq!(request.parameters()["filter"], json!({"STAGE_ID": "WON"}));
}

#[test]
fn test_request_with_filter_rejects_non_object() {
    let request = Request::new("crm.deal.list").param("filter", "oops");
    let result = request.with_filter(&object(json!({"ID": 1})));
    assert!(matches!(result, Err(crate::Error::InvalidRequest { .. })));
}

#[test]
fn test_request_deserialize_defaults_parameters() {
    let request: Request = serde_json::from_value(json!({"method": "profile"})).unwrap();
    assert_eq!(request, Request::new("profile"));
}

// ============================================================================
// BatchRequest Tests
// ============================================================================

#[test]
fn test_batch_request_envelope() {
    let batch = BatchRequest::new(vec![
        Request::new("profile"),
        Request::new("crm.lead.list")
            .param("select", json!(["ID", "STATUS_ID"]))
            .param("start", -1),
        Request::new("department.get").param("ID", 1),
    ])
    .unwrap();

    assert_eq!(
        batch.envelope(true),
        json!({
            "halt": true,
            "cmd": {
                "_0": "profile",
                "_1": "crm.lead.list?select%5B0%5D=ID&select%5B1%5D=STATUS_ID&start=-1",
                "_2": "department.get?ID=1"
            }
        })
    );
    assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["_0", "_1", "_2"]);
}

#[test]
fn test_batch_request_limit() {
    let full = vec![Request::new("profile"); MAX_BATCH_SIZE];
    assert_eq!(BatchRequest::new(full).unwrap().len(), MAX_BATCH_SIZE);

    let over = vec![Request::new("profile"); MAX_BATCH_SIZE + 1];
    assert!(BatchRequest::new(over).is_err());
}

#[test]
fn test_command_key() {
    assert_eq!(command_key(0), "_0");
    assert_eq!(command_key(49), "_49");
}
