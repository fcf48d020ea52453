//! Conversion of graph engine values into host JSON values
//!
//! Bolt integers are 64-bit; JSON consumers in the browser only hold
//! integers exactly up to 2^53 - 1. Integers outside that range are
//! rendered as decimal strings instead of being rounded.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Largest integer exactly representable as an IEEE-754 double
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// A value as returned by the graph engine, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Unsigned value that does not fit in `i64`
    BigInteger(u64),
    Float(f64),
    String(String),
    List(Vec<GraphValue>),
    /// Property map in engine order
    Map(Vec<(String, GraphValue)>),
}

/// One result row: `(column, value)` pairs in the query's declared order.
pub type RawRecord = Vec<(String, GraphValue)>;

/// Normalized result row
pub type Record = Map<String, Value>;

impl From<i64> for GraphValue {
    fn from(v: i64) -> Self {
        GraphValue::Integer(v)
    }
}

impl From<f64> for GraphValue {
    fn from(v: f64) -> Self {
        GraphValue::Float(v)
    }
}

impl From<&str> for GraphValue {
    fn from(v: &str) -> Self {
        GraphValue::String(v.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(v: String) -> Self {
        GraphValue::String(v)
    }
}

impl<T: Into<GraphValue>> From<Option<T>> for GraphValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(GraphValue::Null)
    }
}

/// Convert one engine value into a JSON value.
pub fn normalize_value(value: &GraphValue) -> Value {
    match value {
        GraphValue::Null => Value::Null,
        GraphValue::Bool(b) => Value::Bool(*b),
        GraphValue::Integer(i) if (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(i) => {
            Value::Number(Number::from(*i))
        }
        GraphValue::Integer(i) => Value::String(i.to_string()),
        GraphValue::BigInteger(u) => Value::String(u.to_string()),
        GraphValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        GraphValue::String(s) => Value::String(s.clone()),
        GraphValue::List(items) => Value::Array(items.iter().map(normalize_value).collect()),
        GraphValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect(),
        ),
    }
}

/// Convert result rows into JSON objects, keeping column order.
pub fn normalize_records(records: &[RawRecord]) -> Vec<Record> {
    records
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect()
        })
        .collect()
}

// ============================================================================
// Deserialization from engine rows
// ============================================================================

struct GraphValueVisitor;

impl<'de> Visitor<'de> for GraphValueVisitor {
    type Value = GraphValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a graph value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<GraphValue, E> {
        Ok(GraphValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<GraphValue, E> {
        Ok(GraphValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<GraphValue, D::Error> {
        GraphValue::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<GraphValue, E> {
        Ok(GraphValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<GraphValue, E> {
        Ok(GraphValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<GraphValue, E> {
        Ok(i64::try_from(v).map_or(GraphValue::BigInteger(v), GraphValue::Integer))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<GraphValue, E> {
        Ok(GraphValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<GraphValue, E> {
        Ok(GraphValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<GraphValue, E> {
        Ok(GraphValue::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<GraphValue, E> {
        Ok(GraphValue::List(
            v.iter().map(|b| GraphValue::Integer(i64::from(*b))).collect(),
        ))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<GraphValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<GraphValue>()? {
            items.push(item);
        }
        Ok(GraphValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<GraphValue, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry::<String, GraphValue>()? {
            entries.push((k, v));
        }
        Ok(GraphValue::Map(entries))
    }
}

impl<'de> Deserialize<'de> for GraphValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(GraphValueVisitor)
    }
}
