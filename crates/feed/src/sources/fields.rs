// Defensive field coercion shared by the source adapters.
//
// Upstreams disagree on whether numbers arrive as JSON numbers or strings,
// and any of them may drop a field. Every helper here turns a missing or
// malformed value into a `FeedError::Parse` naming the field, so a bad
// payload fails that source instead of producing a half-filled row.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FeedError;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

pub(crate) fn text(source: &str, field: &str, value: Option<String>) -> Result<String, FeedError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(FeedError::parse(source, format!("{} is empty", field))),
        None => Err(FeedError::parse(source, format!("missing {}", field))),
    }
}

/// Accepts string or numeric identifiers.
pub(crate) fn identifier(source: &str, field: &str, value: Option<Value>) -> Result<String, FeedError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(FeedError::parse(
            source,
            format!("{} has unexpected value {}", field, other),
        )),
        None => Err(FeedError::parse(source, format!("missing {}", field))),
    }
}

/// Any finite number, sign allowed.
pub(crate) fn signed(source: &str, field: &str, value: Option<&Numeric>) -> Result<f64, FeedError> {
    let raw = value.ok_or_else(|| FeedError::parse(source, format!("missing {}", field)))?;
    raw.to_f64()
        .ok_or_else(|| FeedError::parse(source, format!("{} is not a number: {:?}", field, raw)))
}

pub(crate) fn non_negative(source: &str, field: &str, value: Option<&Numeric>) -> Result<f64, FeedError> {
    let parsed = signed(source, field, value)?;
    if parsed < 0.0 {
        return Err(FeedError::parse(source, format!("{} is negative: {}", field, parsed)));
    }
    Ok(parsed)
}

/// Positive whole number.
pub(crate) fn rank(source: &str, field: &str, value: Option<&Numeric>) -> Result<u32, FeedError> {
    let parsed = signed(source, field, value)?;
    if parsed < 1.0 || parsed.fract() != 0.0 || parsed > u32::MAX as f64 {
        return Err(FeedError::parse(source, format!("{} is not a valid rank: {}", field, parsed)));
    }
    Ok(parsed as u32)
}
