//! Verify path building, option merging, and response interpretation against
//! the JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file lists inputs and expected outputs. Comparing parsed JSON
//! (not raw strings) avoids false negatives from field-ordering differences.

use std::collections::BTreeMap;

use rest_endpoint::path::parse_path;
use rest_endpoint::{
    ApiError, Body, Criteria, HttpMethod, HttpResponse, PathBuilder, RequestOptions, RequestOptionsBuilder,
};
use serde_json::Value;

fn load(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

fn criteria(value: &Value) -> Option<Criteria> {
    match value {
        Value::Null => None,
        other => Some(Criteria::from(other.clone())),
    }
}

fn options(value: &Value) -> Option<RequestOptions> {
    match value {
        Value::Null => None,
        other => Some(serde_json::from_value(other.clone()).unwrap()),
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[test]
fn path_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/paths.json"));

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let builder = PathBuilder::traditional(case["traditional"].as_bool().unwrap_or(false));
        let id = criteria(&case["id"]);
        let extra = criteria(&case["criteria"]);

        let path = builder.build(case["resource"].as_str().unwrap(), id.as_ref(), extra.as_ref());
        assert_eq!(path, case["expected"].as_str().unwrap(), "{name}");
    }
}

#[test]
fn parse_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/paths.json"));

    for case in vectors["parse"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let parsed = parse_path(case["path"].as_str().unwrap());

        assert_eq!(parsed.key, case["key"].as_str().unwrap(), "{name}: key");
        assert_eq!(parsed.id.as_deref(), case["id"].as_str(), "{name}: id");
        assert_eq!(Value::Object(parsed.query), case["query"], "{name}: query");
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[test]
fn options_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/options.json"));
    let builder = RequestOptionsBuilder::new();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = HttpMethod::parse(case["method"].as_str().unwrap());
        let defaults = options(&case["defaults"]).unwrap_or_default();
        let per_call = options(&case["per_call"]);
        let body = match &case["body"] {
            Value::Null => None,
            other => Some(Body::Json(other.clone())),
        };

        let effective = builder.build(&method, &defaults, per_call.as_ref(), body).unwrap();

        assert_eq!(effective.method.as_str(), case["expected_method"].as_str().unwrap(), "{name}");

        let expected_headers: BTreeMap<String, String> =
            serde_json::from_value(case["expected_headers"].clone()).unwrap();
        assert_eq!(effective.headers, expected_headers, "{name}: headers");

        let expected_body = case["expected_body"].as_str().map(|text| Body::Text(text.to_string()));
        assert_eq!(effective.body, expected_body, "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/responses.json"));

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };

        match case["expected_error"].as_u64() {
            Some(status) => {
                let err = response.into_json().unwrap_err();
                assert!(
                    matches!(err, ApiError::HttpError { status: s, .. } if u64::from(s) == status),
                    "{name}: {err:?}"
                );
            }
            None => assert_eq!(response.into_json().unwrap(), case["expected"], "{name}"),
        }
    }
}
