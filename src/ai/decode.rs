//! Decoding of model text into typed values.
//!
//! The only normalization is removal of a leading "```json" fence line and a
//! trailing "```" fence. Anything else the model wraps around its output
//! (prose, truncation, stray whitespace outside the fences) is left in place
//! and makes the decode fail.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

const OPENING_FENCE: &str = "```json";
const CLOSING_FENCE: &str = "```";

/// Outcome of decoding a completed response.
///
/// Transport failures never reach this type; they stay on the `Err` side of
/// the surrounding `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Value(T),
    Failed(DecodeFailure),
}

/// Raw text that could not be decoded, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub raw: String,
    pub reason: String,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (raw: {:?})", self.reason, self.raw)
    }
}

impl<T> Decoded<T> {
    pub fn failed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Decoded::Failed(DecodeFailure {
            raw: raw.into(),
            reason: reason.into(),
        })
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Decoded::Value(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DecodeFailure> {
        match self {
            Decoded::Value(_) => None,
            Decoded::Failed(failure) => Some(failure),
        }
    }
}

/// Removes a leading "```json" + line break and a trailing "```", if present.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw;
    if let Some(rest) = text.strip_prefix(OPENING_FENCE) {
        if let Some(body) = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
        {
            text = body;
        }
    }
    text.strip_suffix(CLOSING_FENCE).unwrap_or(text)
}

/// Parses model output as a single JSON value.
pub fn decode_value(raw: &str) -> Decoded<Value> {
    let body = strip_fences(raw);
    if body.trim().is_empty() {
        return Decoded::failed(raw, "empty response text");
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => Decoded::Value(value),
        Err(e) => Decoded::failed(raw, format!("invalid JSON: {}", e)),
    }
}

/// Converts an already parsed value to `T`, blaming `raw` on mismatch.
///
/// The conversion only needs `T` to deserialize from the parsed value; no
/// check against the requested shape happens here.
pub fn cast<T: DeserializeOwned>(raw: &str, value: Value) -> Decoded<T> {
    match serde_json::from_value(value) {
        Ok(typed) => Decoded::Value(typed),
        Err(e) => Decoded::failed(raw, format!("unexpected JSON structure: {}", e)),
    }
}
