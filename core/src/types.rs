//! Record and criteria types shared by the path builder, the query engine,
//! and the façade.

use serde_json::{Map, Value};

/// A schema-free record. Carries an `id` once created.
pub type Record = Map<String, Value>;

/// The ordered record set behind one resource key. Order is insertion order.
pub type Collection = Vec<Value>;

/// How to select records: a scalar identifier or field/value pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Id(String),
    Fields(Map<String, Value>),
}

impl Criteria {
    pub fn is_empty(&self) -> bool {
        match self {
            Criteria::Id(_) => false,
            Criteria::Fields(fields) => fields.is_empty(),
        }
    }

    /// Field criteria as a mapping, with a scalar id expanded to `{id: ..}`.
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Criteria::Id(id) => {
                let mut fields = Map::new();
                fields.insert("id".to_string(), Value::String(id));
                fields
            }
            Criteria::Fields(fields) => fields,
        }
    }
}

impl From<&str> for Criteria {
    fn from(id: &str) -> Self {
        Criteria::Id(id.to_string())
    }
}

impl From<String> for Criteria {
    fn from(id: String) -> Self {
        Criteria::Id(id)
    }
}

macro_rules! numeric_criteria {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Criteria {
                fn from(id: $ty) -> Self {
                    Criteria::Id(id.to_string())
                }
            }
        )*
    };
}

numeric_criteria!(i32, i64, u32, u64, usize);

impl From<Map<String, Value>> for Criteria {
    fn from(fields: Map<String, Value>) -> Self {
        Criteria::Fields(fields)
    }
}

/// Strings and numbers become ids, objects become field criteria, anything
/// else selects everything.
impl From<Value> for Criteria {
    fn from(value: Value) -> Self {
        match value {
            Value::String(id) => Criteria::Id(id),
            Value::Number(n) => Criteria::Id(n.to_string()),
            Value::Object(fields) => Criteria::Fields(fields),
            _ => Criteria::Fields(Map::new()),
        }
    }
}
