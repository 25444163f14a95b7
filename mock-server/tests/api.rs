use std::collections::HashMap;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn seeded() -> axum::Router {
    let mut seed = HashMap::new();
    seed.insert(
        "posts".to_string(),
        vec![
            json!({"id": 0, "user": "john", "comment": "last"}),
            json!({"id": 1, "user": "john", "comment": "first"}),
            json!({"id": 2, "user": "jane"}),
        ],
    );
    app_with(seed)
}

// --- list ---

#[tokio::test]
async fn list_unknown_resource_is_empty() {
    let resp = app().oneshot(get("/posts")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn list_filters_by_query() {
    let resp = seeded().oneshot(get("/posts?user=john")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let posts = body_json(resp).await;
    assert_eq!(posts.as_array().map(Vec::len), Some(2));

    let resp = seeded().oneshot(get("/posts?id=2")).await.unwrap();
    assert_eq!(body_json(resp).await, json!([{"id": 2, "user": "jane"}]));
}

#[tokio::test]
async fn list_wraps_jsonp_callback() {
    for param in ["callback", "jsoncallback"] {
        let resp = seeded()
            .oneshot(get(&format!("/posts?user=jane&{param}=cb_1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_bytes(resp).await;
        assert_eq!(&body[..], br#"cb_1([{"id":2,"user":"jane"}]);"#);
    }
}

// --- create ---

#[tokio::test]
async fn create_assigns_sequential_ids() {
    let resp = seeded()
        .oneshot(json_request("POST", "/posts", r#"{"user":"jim"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await, json!({"user": "jim", "id": 3}));

    let resp = app().oneshot(json_request("POST", "/notes", r#"{"text":"hi"}"#)).await.unwrap();
    assert_eq!(body_json(resp).await, json!({"text": "hi", "id": 0}));
}

#[tokio::test]
async fn create_after_largest_id_is_refused() {
    let seed = HashMap::from([("posts".to_string(), vec![json!({"id": u64::MAX})])]);
    let app = app_with(seed);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/posts", r#"{"user":"jim"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INSUFFICIENT_STORAGE);

    let resp = app.oneshot(get("/posts")).await.unwrap();
    assert_eq!(body_json(resp).await, json!([{"id": u64::MAX}]));
}

#[tokio::test]
async fn create_rejects_non_object() {
    let resp = app().oneshot(json_request("POST", "/posts", "[1,2]")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- single record ---

#[tokio::test]
async fn missing_record_is_404() {
    for method in ["GET", "PUT", "PATCH", "DELETE"] {
        let resp = seeded()
            .oneshot(json_request(method, "/posts/42", r#"{"x":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn put_replaces_keeping_id() {
    let resp = seeded()
        .oneshot(json_request("PUT", "/posts/0", r#"{"user":"jim"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"id": 0, "user": "jim"}));
}

#[tokio::test]
async fn patch_merges_fields() {
    let resp = seeded()
        .oneshot(json_request("PATCH", "/posts/1", r#"{"user":"joe"}"#))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, json!({"id": 1, "user": "joe", "comment": "first"}));
}

#[tokio::test]
async fn patch_merges_nested_objects() {
    let seed = HashMap::from([(
        "posts".to_string(),
        vec![json!({"id": 0, "meta": {"votes": 1, "tags": ["a"]}})],
    )]);
    let app = app_with(seed);
    let resp = app
        .clone()
        .oneshot(json_request("PATCH", "/posts/0", r#"{"meta":{"pinned":true,"tags":["b"]}}"#))
        .await
        .unwrap();
    let merged = json!({"id": 0, "meta": {"votes": 1, "tags": ["b"], "pinned": true}});
    assert_eq!(body_json(resp).await, merged);

    let resp = app.oneshot(get("/posts/0")).await.unwrap();
    assert_eq!(body_json(resp).await, merged);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_request() {
    let req = Request::builder()
        .method("POST")
        .uri("/echo")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(http::header::ACCEPT, "application/json")
        .body("user=jim".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(
        body_json(resp).await,
        json!({
            "method": "POST",
            "content_type": "application/x-www-form-urlencoded",
            "accept": "application/json",
            "body": "user=jim",
        })
    );
}

// --- lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/posts", r#"{"user":"john"}"#))
        .await
        .unwrap();
    let id = body_json(resp).await["id"].clone();
    assert_eq!(id, json!(0));

    let resp = app.clone().oneshot(get("/posts/0")).await.unwrap();
    assert_eq!(body_json(resp).await, json!({"user": "john", "id": 0}));

    let resp = app
        .clone()
        .oneshot(json_request("PATCH", "/posts/0", r#"{"comment":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri("/posts/0").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get("/posts")).await.unwrap();
    assert_eq!(body_json(resp).await, json!([]));
}
