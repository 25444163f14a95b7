use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Resource name to its ordered records.
pub type Db = Arc<RwLock<HashMap<String, Vec<Value>>>>;

const CALLBACK_PARAMS: [&str; 2] = ["callback", "jsoncallback"];

pub fn app() -> Router {
    app_with(HashMap::new())
}

/// An app whose collections start out as `seed`.
pub fn app_with(seed: HashMap<String, Vec<Value>>) -> Router {
    let db: Db = Arc::new(RwLock::new(seed));
    Router::new()
        .route("/echo", any(echo))
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record)
                .put(replace_record)
                .patch(patch_record)
                .delete(delete_record),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, seed: HashMap<String, Vec<Value>>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(seed)).await
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn id_matches(record: &Value, id: &str) -> bool {
    record.get("id").is_some_and(|v| text(v) == id)
}

/// `None` once the last id is `u64::MAX`.
fn next_id(records: &[Value]) -> Option<u64> {
    records
        .last()
        .and_then(|r| r.get("id"))
        .and_then(|id| id.as_u64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
        .map_or(Some(records.len() as u64), |id| id.checked_add(1))
}

/// Objects merge key by key. Anything else, arrays included, is replaced.
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

async fn list_records(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    let callback = CALLBACK_PARAMS.iter().find_map(|p| params.remove(*p));
    let db = db.read().await;
    let records: Vec<Value> = db
        .get(&resource)
        .map(|records| {
            records
                .iter()
                .filter(|record| {
                    params
                        .iter()
                        .all(|(key, expected)| record.get(key).is_some_and(|v| &text(v) == expected))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    match callback {
        Some(callback) => (
            [(header::CONTENT_TYPE, "application/javascript")],
            format!("{callback}({});", Value::Array(records)),
        )
            .into_response(),
        None => Json(records).into_response(),
    }
}

async fn create_record(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let mut db = db.write().await;
    let records = db.entry(resource).or_default();
    let Some(id) = next_id(records) else {
        tracing::warn!("id space exhausted");
        return Err(StatusCode::INSUFFICIENT_STORAGE);
    };
    let mut record = input;
    record.insert("id".to_string(), Value::from(id));
    let record = Value::Object(record);
    tracing::debug!(id, "record created");
    records.push(record.clone());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    let db = db.read().await;
    db.get(&resource)
        .and_then(|records| records.iter().find(|r| id_matches(r, &id)))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn replace_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, StatusCode> {
    let mut db = db.write().await;
    let record = db
        .get_mut(&resource)
        .and_then(|records| records.iter_mut().find(|r| id_matches(r, &id)))
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut replacement = Map::new();
    if let Some(original) = record.get("id") {
        replacement.insert("id".to_string(), original.clone());
    }
    replacement.extend(input);
    *record = Value::Object(replacement);
    Ok(Json(record.clone()))
}

async fn patch_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, StatusCode> {
    let mut db = db.write().await;
    let record = db
        .get_mut(&resource)
        .and_then(|records| records.iter_mut().find(|r| id_matches(r, &id)))
        .ok_or(StatusCode::NOT_FOUND)?;
    merge(record, Value::Object(input));
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, String)>,
) -> StatusCode {
    let mut db = db.write().await;
    let Some(records) = db.get_mut(&resource) else {
        return StatusCode::NOT_FOUND;
    };
    match records.iter().position(|r| id_matches(r, &id)) {
        Some(index) => {
            records.remove(index);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Reflects what the client put on the wire.
async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map_or(Value::Null, |v| Value::String(v.to_string()))
    };
    Json(serde_json::json!({
        "method": method.as_str(),
        "content_type": header(header::CONTENT_TYPE),
        "accept": header(header::ACCEPT),
        "body": String::from_utf8_lossy(&body),
    }))
}
