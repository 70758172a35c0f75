//! Tests for response module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;

fn default_time() -> serde_json::Value {
    json!({
        "start": 1741699660.029826,
        "finish": 1741699660.111687,
        "duration": 0.08186101913452148,
        "processing": 0.0500180721282959,
        "date_start": "2025-03-11T16:27:40+03:00",
        "date_finish": "2025-03-11T16:27:40+03:00",
        "operating_reset_at": 1741700260,
        "operating": 1.8415930271148682
    })
}

// ============================================================================
// ApiResponse Tests
// ============================================================================

#[test]
fn test_api_response_full() {
    let response = ApiResponse::from_value(json!({
        "result": [{"ID": "38945"}],
        "next": 50,
        "total": 120,
        "time": default_time()
    }))
    .unwrap();

    assert_eq!(response.result, json!([{"ID": "38945"}]));
    assert_eq!(response.next, Some(50));
    assert_eq!(response.total, Some(120));
    assert_eq!(response.start, None);

    let time = response.time.unwrap();
    assert_eq!(time.operating_reset_at, Some(1_741_700_260.0));
    assert_eq!(time.date_start.to_rfc3339(), "2025-03-11T16:27:40+03:00");
}

#[test]
fn test_api_response_error_body() {
    let err = ApiResponse::from_value(json!({
        "error": "OPERATION_TIME_LIMIT",
        "error_description": "Method is blocked due to operation time limit."
    }))
    .unwrap_err();

    match err {
        Error::Api {
            code,
            description,
            status,
        } => {
            assert_eq!(code, "operation_time_limit");
            assert_eq!(
                description.as_deref(),
                Some("Method is blocked due to operation time limit.")
            );
            assert_eq!(status, None);
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[test]
fn test_api_response_numeric_error_code() {
    let err = ApiResponse::from_value(json!({"error": 404, "error_description": ""})).unwrap_err();
    assert_eq!(err.api_code(), Some("404"));
    assert_eq!(err.to_string(), "API error [404]");
}

#[test]
fn test_api_response_missing_result() {
    let err = ApiResponse::from_value(json!({"time": default_time()})).unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[test]
fn test_error_response_detect_ignores_results() {
    assert!(ErrorResponse::detect(&json!({"result": 1, "error": "x"})).is_none());
    assert!(ErrorResponse::detect(&json!([1, 2])).is_none());
    assert!(ErrorResponse::detect(&json!({"error": "x"})).is_some());
}

// ============================================================================
// BatchResult Tests
// ============================================================================

#[test]
fn test_batch_result_in_order() {
    let batch = BatchResult::from_value(json!({
        "result": {"_0": {"ID": "12"}, "_1": {"items": [1, 2]}, "_2": [{"ID": "1"}]},
        "result_error": [],
        "result_total": {"_1": 2, "_2": 1},
        "result_next": [],
        "result_time": {"_0": default_time(), "_1": default_time(), "_2": default_time()}
    }))
    .unwrap();

    let results = batch
        .into_call_results(["_0", "_1", "_2"].map(String::from))
        .unwrap();

    let values: Vec<_> = results.iter().map(|r| r.value().cloned()).collect();
    assert_eq!(
        values,
        vec![
            Some(json!({"ID": "12"})),
            Some(json!({"items": [1, 2]})),
            Some(json!([{"ID": "1"}])),
        ]
    );

    let CallResult::Success(second) = &results[1] else {
        panic!("Expected success");
    };
    assert_eq!(second.total, Some(2));
    assert!(second.time.is_some());
}

#[test]
fn test_batch_result_inline_error() {
    let batch = BatchResult::from_value(json!({
        "result": {"_0": {"ID": "12"}, "_2": [{"ID": "1"}]},
        "result_error": {"_1": {"error": "insufficient_scope", "error_description": ""}},
        "result_total": [],
        "result_next": [],
        "result_time": []
    }))
    .unwrap();

    let results = batch
        .into_call_results(["_0", "_1", "_2"].map(String::from))
        .unwrap();

    assert!(results[0].is_success());
    assert!(!results[1].is_success());
    assert!(results[2].is_success());
    assert_eq!(results[1].error().unwrap().error, "insufficient_scope");

    let err = results[1].clone().into_value().unwrap_err();
    assert!(matches!(
        err,
        Error::BatchItem { ref key, ref code, description: None } if key == "_1" && code == "insufficient_scope"
    ));
}

#[test]
fn test_batch_result_positional_lists() {
    let batch = BatchResult::from_value(json!({
        "result": [[1], [2]],
        "result_start": [0, 50]
    }))
    .unwrap();

    let results = batch
        .into_call_results(["_0", "_1"].map(String::from))
        .unwrap();
    let CallResult::Success(second) = &results[1] else {
        panic!("Expected success");
    };
    assert_eq!(second.result, json!([2]));
    assert_eq!(second.start, Some(50));
}

#[test]
fn test_batch_result_missing_command() {
    let batch = BatchResult::from_value(json!({
        "result": {"_0": 1},
        "result_error": []
    }))
    .unwrap();

    let err = batch
        .into_call_results(["_0", "_1"].map(String::from))
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[test]
fn test_batch_result_halted_after_failure() {
    let batch = BatchResult::from_value(json!({
        "result": {"_0": {"ID": "1"}},
        "result_error": {"_1": {"error": "NOT_FOUND", "error_description": "Not found"}}
    }))
    .unwrap();

    let results = batch
        .into_call_results(["_0", "_1", "_2"].map(String::from))
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].value(), Some(&json!({"ID": "1"})));
    assert_eq!(results[1].error().unwrap().error, "not_found");
    assert_eq!(
        results[2],
        CallResult::Skipped {
            key: "_2".to_string()
        }
    );
    assert!(matches!(
        results[2].clone().into_response(),
        Err(Error::BatchSkipped { ref key }) if key == "_2"
    ));
}

#[test]
fn test_batch_result_null_maps() {
    let batch = BatchResult::from_value(json!({"result": [], "result_error": null})).unwrap();
    assert!(batch.result.is_empty());
    assert!(batch.result_error.is_empty());
}

// ============================================================================
// Normalization Tests
// ============================================================================

#[test]
fn test_normalize_list_array() {
    assert_eq!(normalize_list(json!([1, 2])).unwrap(), vec![json!(1), json!(2)]);
}

#[test]
fn test_normalize_list_empty() {
    assert!(normalize_list(json!([])).unwrap().is_empty());
    assert!(normalize_list(json!({})).unwrap().is_empty());
}

#[test]
fn test_normalize_list_wrapped() {
    let items = normalize_list(json!({"tasks": [{"id": "1"}]})).unwrap();
    assert_eq!(items, vec![json!({"id": "1"})]);
}

#[test]
fn test_normalize_list_rejects_shapes() {
    assert!(normalize_list(json!({"a": [], "b": []})).is_err());
    assert!(normalize_list(json!({"tasks": 5})).is_err());
    assert!(normalize_list(json!("text")).is_err());
}

#[test]
fn test_api_response_into_items() {
    let response = ApiResponse::new(json!({"tasks": [1, 2, 3]}));
    assert_eq!(response.into_items().unwrap().len(), 3);
}
