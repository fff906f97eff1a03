use rstest::rstest;
use serde_json::{json, Value};

use ror_search::core::errors::CoreError;
use ror_search::index::bulk::{
    build_bulk_body, parse_bulk_response, validate_index_name, BulkDocument, BulkFailure,
};

#[rstest]
#[case("org-id-grid")]
#[case("org-id-grid-2019.05")]
fn valid_index_names(#[case] name: &str) {
    assert!(validate_index_name(name).is_ok());
}

#[rstest]
#[case("")]
#[case(".")]
#[case("..")]
#[case("_org")]
#[case("-org")]
#[case("Org-Id")]
#[case("org id")]
#[case("org/id")]
#[case("org:id")]
#[case("org*")]
fn invalid_index_names(#[case] name: &str) {
    assert!(matches!(
        validate_index_name(name),
        Err(CoreError::InvalidConfig(_))
    ));
}

#[test]
fn bulk_body_pairs_action_and_source_lines() {
    let documents = vec![
        BulkDocument {
            id: "05dxps055".to_string(),
            source: json!({ "name": "Example University" }),
        },
        BulkDocument {
            id: "03yrm5c26".to_string(),
            source: json!({ "name": "Example Institute" }),
        },
    ];

    let body = build_bulk_body("org-id-grid", &documents).expect("body");
    assert!(body.ends_with('\n'));

    let lines = body.lines().map(|line| serde_json::from_str::<Value>(line).expect("line")).collect::<Vec<_>>();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], json!({ "index": { "_index": "org-id-grid", "_id": "05dxps055" } }));
    assert_eq!(lines[1], json!({ "name": "Example University" }));
    assert_eq!(lines[2]["index"]["_id"], "03yrm5c26");
}

#[test]
fn empty_bulk_is_rejected() {
    assert!(matches!(
        build_bulk_body("org-id-grid", &[]),
        Err(CoreError::InvalidInput(_))
    ));
}

#[test]
fn bulk_response_reports_item_failures() {
    let body = json!({
        "took": 5,
        "errors": true,
        "items": [
            { "index": { "_id": "05dxps055", "status": 201 } },
            { "index": { "_id": "03yrm5c26", "status": 400,
                "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [established]" } } },
            { "index": { "_id": "02mhbdp94", "status": 429 } }
        ]
    })
    .to_string();

    let outcome = parse_bulk_response(&body).expect("outcome");
    assert!(!outcome.is_success());
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(
        outcome.failures,
        vec![
            BulkFailure {
                id: "03yrm5c26".to_string(),
                status: 400,
                reason: "failed to parse field [established]".to_string(),
            },
            BulkFailure {
                id: "02mhbdp94".to_string(),
                status: 429,
                reason: "status=429".to_string(),
            },
        ]
    );
}

#[test]
fn clean_bulk_response_is_success() {
    let body = r#"{"took":1,"errors":false,"items":[{"index":{"_id":"05dxps055","status":200}}]}"#;
    let outcome = parse_bulk_response(body).expect("outcome");
    assert!(outcome.is_success());
    assert_eq!(outcome.succeeded, 1);
}

#[rstest]
#[case(r#"{"errors":true,"items":[]}"#)]
#[case("not json")]
fn unusable_bulk_response_is_serialization_error(#[case] body: &str) {
    assert!(matches!(
        parse_bulk_response(body),
        Err(CoreError::Serialization(_))
    ));
}
