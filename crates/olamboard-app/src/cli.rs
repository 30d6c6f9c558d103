//! Save-code tooling behind the native `olamboard` binary.

use crate::session::{SessionError, parse_catalog};
use olamboard_core::{BootParams, DecodeContext, SaveStore, codec};
use serde::Serialize;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a save code as JSON.
    Inspect { code: String, legacy: Option<String> },
    /// Decode and re-encode a save code in the current format.
    Reencode { code: String, legacy: Option<String> },
    /// Print the code stored for a page query.
    Stored { query: String },
    /// Print the shortcut table.
    Keys,
    Help,
}

pub const USAGE: &str = "\
usage: olamboard <command>

  inspect <code> [--catalog <elements.json>]   print a save code as JSON
  reencode <code> [--catalog <elements.json>]  rewrite a code in the current format
  stored [query]                               print the saved code for a page query
  keys                                         list board shortcuts
";

impl Command {
    /// Parse arguments (without the program name).
    pub fn parse<I, T>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        match name.as_str() {
            "inspect" | "reencode" => {
                let (code, legacy) = code_args(rest)?;
                Ok(if name == "inspect" {
                    Command::Inspect { code, legacy }
                } else {
                    Command::Reencode { code, legacy }
                })
            }
            "stored" => Ok(Command::Stored {
                query: rest.first().cloned().unwrap_or_default(),
            }),
            "keys" => Ok(Command::Keys),
            "help" | "-h" | "--help" => Ok(Command::Help),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

fn code_args(rest: &[String]) -> Result<(String, Option<String>), String> {
    let mut code = None;
    let mut legacy = None;
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        if arg == "--catalog" {
            legacy = Some(iter.next().cloned().ok_or("--catalog needs a path")?);
        } else if code.is_none() {
            code = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument: {arg}"));
        }
    }
    let code = code.ok_or("missing save code")?;
    Ok((code, legacy))
}

/// Decode context for an optional default-source element list.
pub fn context_for(elements_json: Option<&str>) -> Result<DecodeContext, SessionError> {
    let Some(json) = elements_json else {
        return Ok(DecodeContext::default());
    };
    let catalog = parse_catalog(json, "{}")?;
    Ok(DecodeContext::for_catalog(
        true,
        catalog.elements.iter().map(|record| record.symbol.as_str()),
    ))
}

#[derive(Serialize)]
struct Inspection<'a> {
    tag: &'a str,
    notes: Vec<NoteView<'a>>,
    positions: Vec<String>,
}

#[derive(Serialize)]
struct NoteView<'a> {
    cell: String,
    content: &'a str,
}

/// Pretty JSON view of a save code.
pub fn inspect(code: &str, context: &DecodeContext) -> Result<String, SessionError> {
    let blob = codec::decode_with(code.trim(), context)?;
    let view = Inspection {
        tag: &blob.tag,
        notes: blob
            .notes
            .iter()
            .map(|note| NoteView {
                cell: note.cell.to_string(),
                content: &note.content,
            })
            .collect(),
        positions: blob.positions.iter().map(ToString::to_string).collect(),
    };
    serde_json::to_string_pretty(&view).map_err(|e| SessionError::Codec(e.into()))
}

/// Rewrite a code in the current format.
pub fn reencode(code: &str, context: &DecodeContext) -> Result<String, SessionError> {
    let blob = codec::decode_with(code.trim(), context)?;
    Ok(codec::encode(&codec::SaveBlob::new(blob.notes, blob.positions)))
}

/// The code stored for a page query, if any.
pub fn stored(store: &impl SaveStore, query: &str) -> Result<Option<String>, SessionError> {
    let params = BootParams::parse(query);
    Ok(store.get(&params.storage_key())?)
}
