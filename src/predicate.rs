//! Small helpers for test assertions over dynamic JSON values.

use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Length in bytes of the randomness behind [`random_string`].
const RANDOM_BYTES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PredicateError {
    /// The value has a kind plain data cannot hold, such as a map with
    /// non-string keys.
    #[error("unsupported value kind: {0}")]
    UnsupportedValueKind(String),

    /// The plain copy did not decode back into the original type. Non-finite
    /// floats end up here since they encode as `null`.
    #[error("value did not survive the copy: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub fn is_boolean(v: &Value) -> bool {
    v.is_boolean()
}

/// `None` is the absent sentinel; JSON `null` counts as defined.
pub fn is_defined(v: Option<&Value>) -> bool {
    v.is_some()
}

/// Integral numbers, including floats with no fractional part.
pub fn is_integer(v: &Value) -> bool {
    match v {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

pub fn is_non_negative_integer(v: &Value) -> bool {
    is_integer(v) && v.as_f64().is_some_and(|f| f >= 0.0)
}

pub fn is_string(v: &Value) -> bool {
    v.is_string()
}

/// Objects and arrays.
pub fn is_object(v: &Value) -> bool {
    matches!(v, Value::Object(_) | Value::Array(_))
}

/// Recursive structural copy. The result shares nothing with `v`.
pub fn deep_clone(v: &Value) -> Value {
    match v {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.clone()),
        Value::Array(items) => Value::Array(items.iter().map(deep_clone).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), deep_clone(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}

/// Copies a typed value through its plain-data form. Anything plain data
/// cannot represent is reported instead of silently dropped.
pub fn deep_clone_typed<T>(v: &T) -> Result<T, PredicateError>
where
    T: Serialize + DeserializeOwned,
{
    let plain =
        serde_json::to_value(v).map_err(|e| PredicateError::UnsupportedValueKind(e.to_string()))?;
    Ok(serde_json::from_value(deep_clone(&plain))?)
}

/// Six lowercase hex characters from the thread-local CSPRNG.
pub fn random_string() -> String {
    random_string_with(&mut rand::rng())
}

pub fn random_string_with<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
