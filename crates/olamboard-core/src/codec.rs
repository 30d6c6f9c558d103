//! Save codes: compact, copy-pasteable board layouts.
//!
//! A save code is the URL-safe base64 of a JSON array
//! `["happy sheep", [[text, x, y], ...], x0, y0, x1, y1, ...]` where the
//! nested list holds notes and the flat pairs are element cells in catalog
//! order. Older codes are normalized by [`SaveFormat`] before validation.

use crate::grid::CellKey;
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tag written into every new save code.
pub const FORMAT_TAG: &str = "happy sheep";
/// Tag of codes saved before one element was added to the default data set.
pub const LEGACY_SHEEP_TAG: &str = "approved by the sheep";
/// Element missing from codes tagged [`LEGACY_SHEEP_TAG`].
pub const LEGACY_ANCHOR_SYMBOL: &str = "Gm";
/// Cell given to [`LEGACY_ANCHOR_SYMBOL`] when upgrading such codes.
pub const LEGACY_ANCHOR_CELL: CellKey = CellKey { x: 50, y: 0 };

/// URL-safe alphabet, padded on encode, padding optional on decode.
const SAVE_CODE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Save-code decoding errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Save code is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save code is not a JSON array")]
    NotAnArray,
    #[error("Save code is empty")]
    EmptyBlob,
    #[error("Note {0} is not a [text, x, y] triple")]
    InvalidNote(usize),
    #[error("Coordinate {0} is not an integer")]
    InvalidCoordinate(usize),
    #[error("Odd number of element coordinates")]
    DanglingCoordinate,
}

/// A note as stored in a save code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedNote {
    pub content: String,
    pub cell: CellKey,
}

/// A fully validated save code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveBlob {
    pub tag: String,
    pub notes: Vec<SavedNote>,
    /// Element cells in catalog order. May be shorter than the catalog.
    pub positions: Vec<CellKey>,
}

/// Where to splice the missing pair into a [`LEGACY_SHEEP_TAG`] code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyInsertion {
    /// Catalog index of the missing element.
    pub index: usize,
    pub cell: CellKey,
}

/// Catalog facts the decoder needs to upgrade old codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    pub legacy_insert: Option<LegacyInsertion>,
}

impl DecodeContext {
    /// Context for a catalog. The legacy upgrade only applies to the
    /// default data set, and only when it contains the anchor element.
    pub fn for_catalog<'a>(
        is_default_source: bool,
        symbols: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        if !is_default_source {
            return Self::default();
        }
        let legacy_insert = symbols
            .into_iter()
            .position(|symbol| symbol == LEGACY_ANCHOR_SYMBOL)
            .map(|index| LegacyInsertion {
                index,
                cell: LEGACY_ANCHOR_CELL,
            });
        Self { legacy_insert }
    }
}

/// Known layouts of the raw JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// Tag, notes list, pairs.
    Current,
    /// Tag, pairs. Saved before notes existed.
    WithoutNotes,
    /// Tag, pairs, missing the [`LEGACY_ANCHOR_SYMBOL`] pair.
    ApprovedBySheep,
}

impl SaveFormat {
    pub fn detect(values: &[Value], context: &DecodeContext) -> Self {
        let tag = values.first().and_then(Value::as_str);
        if tag == Some(LEGACY_SHEEP_TAG) && context.legacy_insert.is_some() {
            SaveFormat::ApprovedBySheep
        } else if values.get(1).is_some_and(Value::is_array) {
            SaveFormat::Current
        } else {
            SaveFormat::WithoutNotes
        }
    }

    /// Rewrite `values` into the current layout.
    fn normalize(self, values: &mut Vec<Value>, context: &DecodeContext) {
        if let (SaveFormat::ApprovedBySheep, Some(insert)) = (self, context.legacy_insert) {
            let at = (1 + insert.index * 2).min(values.len());
            values.insert(at, Value::from(insert.cell.x));
            values.insert(at + 1, Value::from(insert.cell.y));
        }
        if !values.get(1).is_some_and(Value::is_array) {
            let at = values.len().min(1);
            values.insert(at, Value::Array(Vec::new()));
        }
    }
}

impl SaveBlob {
    pub fn new(notes: Vec<SavedNote>, positions: Vec<CellKey>) -> Self {
        Self {
            tag: FORMAT_TAG.to_string(),
            notes,
            positions,
        }
    }

    fn from_values(values: Vec<Value>) -> Result<Self, CodecError> {
        let mut values = values.into_iter();
        let tag = match values.next().ok_or(CodecError::EmptyBlob)? {
            Value::String(tag) => tag,
            other => other.to_string(),
        };
        let notes = match values.next() {
            Some(Value::Array(notes)) => notes
                .iter()
                .enumerate()
                .map(|(i, note)| parse_note(note).ok_or(CodecError::InvalidNote(i)))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };
        let coords = values
            .enumerate()
            .map(|(i, value)| as_coordinate(&value).ok_or(CodecError::InvalidCoordinate(i)))
            .collect::<Result<Vec<_>, _>>()?;
        if coords.len() % 2 != 0 {
            return Err(CodecError::DanglingCoordinate);
        }
        let positions = coords
            .chunks_exact(2)
            .map(|pair| CellKey::new(pair[0], pair[1]))
            .collect();
        Ok(Self {
            tag,
            notes,
            positions,
        })
    }

    fn to_value(&self) -> Value {
        let notes = self
            .notes
            .iter()
            .map(|note| {
                Value::Array(vec![
                    Value::from(note.content.as_str()),
                    Value::from(note.cell.x),
                    Value::from(note.cell.y),
                ])
            })
            .collect();
        let mut values = vec![Value::from(self.tag.as_str()), Value::Array(notes)];
        for cell in &self.positions {
            values.push(Value::from(cell.x));
            values.push(Value::from(cell.y));
        }
        Value::Array(values)
    }
}

fn as_coordinate(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn parse_note(value: &Value) -> Option<SavedNote> {
    let [content, x, y] = value.as_array()?.as_slice() else {
        return None;
    };
    Some(SavedNote {
        content: content.as_str()?.to_string(),
        cell: CellKey::new(as_coordinate(x)?, as_coordinate(y)?),
    })
}

/// Encode a blob as a save code.
pub fn encode(blob: &SaveBlob) -> String {
    SAVE_CODE_ENGINE.encode(blob.to_value().to_string())
}

/// Decode a save code without any legacy upgrade context.
pub fn decode(code: &str) -> Result<SaveBlob, CodecError> {
    decode_with(code, &DecodeContext::default())
}

/// Decode and validate a save code. Nothing is returned unless the whole
/// code is well formed.
pub fn decode_with(code: &str, context: &DecodeContext) -> Result<SaveBlob, CodecError> {
    let Value::Array(mut values) = decode_json(code)? else {
        return Err(CodecError::NotAnArray);
    };
    if values.is_empty() {
        return Err(CodecError::EmptyBlob);
    }
    let format = SaveFormat::detect(&values, context);
    if format != SaveFormat::Current {
        log::info!("upgrading save code from {format:?}");
    }
    format.normalize(&mut values, context);
    SaveBlob::from_values(values)
}

fn decode_json(code: &str) -> Result<Value, CodecError> {
    let normalized: String = code
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    match parse_payload(&normalized) {
        Ok(value) => Ok(value),
        Err(err) => {
            // Old share links wrote padding as '_'.
            let body = normalized.trim_end_matches('_');
            let padding = normalized.len() - body.len();
            if padding == 0 || padding > 2 {
                return Err(err);
            }
            parse_payload(&format!("{body}{}", "=".repeat(padding))).map_err(|_| err)
        }
    }
}

fn parse_payload(code: &str) -> Result<Value, CodecError> {
    let bytes = SAVE_CODE_ENGINE.decode(code)?;
    let text = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(text.trim())?)
}
