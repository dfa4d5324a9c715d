//! Argument decoding helpers.
//!
//! Tool arguments arrive as a loosely typed JSON object. Each tool declares a
//! `deny_unknown_fields` struct; decoding failures (missing required field,
//! unknown field, wrong type) become `invalid_argument` errors naming the tool.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use crate::common::{ToolError, ToolResult};

pub fn decode<T: DeserializeOwned>(tool: &str, args: Value) -> ToolResult<T> {
    let args = match args {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

pub fn default_max_results() -> u32 {
    10
}

/// Accepts `5` as well as `5.0` (some clients only emit floats).
pub fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = Number::deserialize(deserializer)?;
    integral(&n)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {}", n)))
}

pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = Number::deserialize(deserializer)?;
    integral(&n).ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", n)))
}

fn integral(n: &Number) -> Option<i64> {
    if let Some(v) = n.as_i64() {
        return Some(v);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
}
