//! Element data overrides passed in the boot parameters.
//!
//! The payload is base64 JSON (with `-` for `+` and `_` for `=`): an array of
//! partial element records, optionally led by the string `"replace"`. Each
//! record is merged into the element with the same symbol, or appended.
//! Unless replace mode is on (globally or via a truthy `_REPLACE_` field),
//! the merged properties are marked as overridden so they can be flagged.

use crate::catalog::{ElementRecord, Overridden};
use base64::Engine;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use serde_json::{Map, Value};
use thiserror::Error;

const REPLACE_MODE: &str = "replace";
const REPLACE_FIELD: &str = "_REPLACE_";

const OVERRIDE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Override parsing errors. The element list is left untouched.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Overrides are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Overrides must be a JSON array")]
    NotAnArray,
    #[error("Override {0} is not an object with a symbol")]
    InvalidEntry(usize),
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Decode the link form of the payload.
pub fn decode_overrides(encoded: &str) -> Result<Vec<Value>, OverrideError> {
    let normalized = encoded.trim().replace('_', "=").replace('-', "+");
    let bytes = OVERRIDE_ENGINE.decode(normalized)?;
    let text = String::from_utf8(bytes)?;
    match serde_json::from_str(&text)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(OverrideError::NotAnArray),
    }
}

/// Encode entries in the link form.
pub fn encode_overrides(entries: &[Value]) -> String {
    OVERRIDE_ENGINE
        .encode(Value::Array(entries.to_vec()).to_string())
        .replace('+', "-")
        .replace('=', "_")
}

/// Merge encoded overrides into `elements`. Returns how many records were
/// applied. On error `elements` is unchanged.
pub fn apply_overrides(
    elements: &mut Vec<ElementRecord>,
    encoded: &str,
) -> Result<usize, OverrideError> {
    let mut entries = decode_overrides(encoded)?;
    let replace = entries.first().and_then(Value::as_str) == Some(REPLACE_MODE);
    if replace {
        entries.remove(0);
    }

    let mut merged = elements.clone();
    let count = entries.len();
    for (i, entry) in entries.into_iter().enumerate() {
        let Value::Object(mut fields) = entry else {
            return Err(OverrideError::InvalidEntry(i));
        };
        let Some(symbol) = fields.get("symbol").and_then(Value::as_str).map(str::to_string) else {
            return Err(OverrideError::InvalidEntry(i));
        };
        let silent = replace || fields.remove(REPLACE_FIELD).is_some_and(|v| is_truthy(&v));

        match merged.iter_mut().find(|e| e.symbol == symbol) {
            Some(existing) => merge_into(existing, fields, silent),
            None => {
                let mut record: ElementRecord = serde_json::from_value(Value::Object(fields))
                    .map_err(|_| OverrideError::InvalidEntry(i))?;
                if !silent {
                    record.overridden = Overridden::All;
                }
                merged.push(record);
            }
        }
    }

    *elements = merged;
    log::info!("applied {count} element overrides");
    Ok(count)
}

fn merge_into(existing: &mut ElementRecord, fields: Map<String, Value>, silent: bool) {
    let keys: Vec<String> = fields.keys().filter(|k| *k != "symbol").cloned().collect();
    for (key, value) in fields {
        existing.set_field(&key, value);
    }
    if !silent {
        existing.overridden = Overridden::Properties(keys);
    }
}
