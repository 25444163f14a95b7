//! In-memory query matching and record mutation over a `Collection`.
//!
//! Used by the storage and file adapters to answer REST verbs without a
//! server. All routines are single-pass over the collection and keep its
//! order. Field comparison coerces both sides to strings, so `{"id": "3"}`
//! taken from a URL matches a record whose id is the number `3`.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::types::{Collection, Record};

/// String form of a value as used for matching and query strings.
pub fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Whether `record` satisfies every field equality in `criteria`.
///
/// Records missing a queried field never match. Empty criteria match all.
pub fn matches(record: &Value, criteria: &Map<String, Value>) -> bool {
    criteria.iter().all(|(key, expected)| {
        record
            .get(key)
            .is_some_and(|actual| coerce(actual) == coerce(expected))
    })
}

/// The records matching `criteria`, in collection order.
pub fn select(collection: &[Value], criteria: &Map<String, Value>) -> Collection {
    collection
        .iter()
        .filter(|record| matches(record, criteria))
        .cloned()
        .collect()
}

/// The id the next appended record receives: last id plus one.
///
/// An empty collection starts at 0. When the last id is not numeric the
/// collection length is used instead. A last id of `u64::MAX` leaves no id
/// to hand out.
pub fn next_id(collection: &[Value]) -> Result<u64, ApiError> {
    let Some(last) = collection.last() else {
        return Ok(0);
    };
    let last_id = match last.get("id") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    match last_id {
        Some(id) => id
            .checked_add(1)
            .ok_or_else(|| ApiError::Storage(format!("no id left after {id}"))),
        None => Ok(collection.len() as u64),
    }
}

/// Append `records`, assigning each a fresh id. Returns the stored copies.
pub fn insert(collection: &mut Collection, records: Vec<Value>) -> Result<Collection, ApiError> {
    let mut stored = Vec::with_capacity(records.len());
    for record in records {
        let Value::Object(mut fields) = record else {
            return Err(ApiError::SerializationError(
                "records must be JSON objects".to_string(),
            ));
        };
        fields.insert("id".to_string(), Value::from(next_id(collection)?));
        let record = Value::Object(fields);
        collection.push(record.clone());
        stored.push(record);
    }
    Ok(stored)
}

/// Replace every matching record with `{id: <original id>, ..body}`.
///
/// Fields of the original other than `id` are dropped. Returns the
/// replacements.
pub fn replace(
    collection: &mut Collection,
    criteria: &Map<String, Value>,
    body: &Record,
) -> Collection {
    let mut replaced = Vec::new();
    for record in collection.iter_mut().filter(|r| matches(r, criteria)) {
        let mut fields = Map::new();
        if let Some(id) = record.get("id") {
            fields.insert("id".to_string(), id.clone());
        }
        for (key, value) in body {
            fields.insert(key.clone(), value.clone());
        }
        *record = Value::Object(fields);
        replaced.push(record.clone());
    }
    replaced
}

/// Deep-merge `body` into every matching record. Returns the patched records.
pub fn patch(
    collection: &mut Collection,
    criteria: &Map<String, Value>,
    body: &Record,
) -> Collection {
    let body = Value::Object(body.clone());
    let mut patched = Vec::new();
    for record in collection.iter_mut().filter(|r| matches(r, criteria)) {
        merge_value(record, &body);
        patched.push(record.clone());
    }
    patched
}

/// Remove every matching record. Returns the removed records.
pub fn remove(collection: &mut Collection, criteria: &Map<String, Value>) -> Collection {
    let (removed, kept): (Collection, Collection) = std::mem::take(collection)
        .into_iter()
        .partition(|record| matches(record, criteria));
    *collection = kept;
    removed
}

/// Right-biased deep merge. Objects merge key by key, everything else
/// (arrays included) is replaced.
pub fn merge_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn posts() -> Collection {
        vec![
            json!({"id": 0, "user": "john", "comment": "last"}),
            json!({"id": 1, "user": "john", "comment": "first"}),
            json!({"id": 2, "user": "jane"}),
        ]
    }

    fn criteria(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn empty_criteria_is_identity() {
        assert_eq!(select(&posts(), &Map::new()), posts());
    }

    #[test]
    fn select_keeps_order() {
        let found = select(&posts(), &criteria(json!({"user": "john"})));
        assert_eq!(found, posts()[..2].to_vec());
    }

    #[test]
    fn values_compare_as_strings() {
        let found = select(&posts(), &criteria(json!({"id": "2"})));
        assert_eq!(found, vec![json!({"id": 2, "user": "jane"})]);
    }

    #[test]
    fn missing_field_never_matches() {
        let found = select(&posts(), &criteria(json!({"comment": "null"})));
        assert!(found.is_empty());
    }

    #[test]
    fn next_id_follows_last_record() {
        assert_eq!(next_id(&[]).unwrap(), 0);
        assert_eq!(next_id(&posts()).unwrap(), 3);
        assert_eq!(next_id(&[json!({"id": "9"})]).unwrap(), 10);
        assert_eq!(next_id(&[json!({"id": "x"}), json!({"name": "y"})]).unwrap(), 2);
    }

    #[test]
    fn exhausted_ids_are_an_error() {
        let err = next_id(&[json!({"id": u64::MAX})]).unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)), "{err:?}");
        let err = next_id(&[json!({"id": u64::MAX.to_string()})]).unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)), "{err:?}");

        let mut collection = vec![json!({"id": u64::MAX - 1})];
        let err = insert(&mut collection, vec![json!({"a": 1}), json!({"b": 2})]).unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)), "{err:?}");
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut collection = posts();
        let stored = insert(&mut collection, vec![json!({"user": "jim"}), json!({"user": "joe"})]).unwrap();
        assert_eq!(stored[0]["id"], 3);
        assert_eq!(stored[1]["id"], 4);
        assert_eq!(collection.len(), 5);
    }

    #[test]
    fn insert_rejects_non_objects() {
        let mut collection = posts();
        let err = insert(&mut collection, vec![json!(42)]).unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn replace_drops_original_fields() {
        let mut collection = posts();
        let replaced = replace(&mut collection, &criteria(json!({"id": 0})), &criteria(json!({"user": "jim"})));
        assert_eq!(replaced, vec![json!({"id": 0, "user": "jim"})]);
        assert_eq!(collection[0], json!({"id": 0, "user": "jim"}));
    }

    #[test]
    fn patch_keeps_original_fields() {
        let mut collection = vec![json!({"id": 0, "user": "john", "meta": {"a": 1, "tags": [1, 2]}})];
        let patched = patch(
            &mut collection,
            &criteria(json!({"id": 0})),
            &criteria(json!({"meta": {"b": 2, "tags": [3]}})),
        );
        assert_eq!(
            patched,
            vec![json!({"id": 0, "user": "john", "meta": {"a": 1, "b": 2, "tags": [3]}})]
        );
    }

    #[test]
    fn remove_returns_removed_records() {
        let mut collection = posts();
        let removed = remove(&mut collection, &criteria(json!({"id": 0})));
        assert_eq!(removed, vec![json!({"id": 0, "user": "john", "comment": "last"})]);
        let ids: Vec<_> = collection.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);
    }
}
