//! Peer wire messages exchanged through the session relay.

use serde::{Deserialize, Serialize};

/// A card's new cell, named by its identifier before the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub identifier: String,
    pub x: i64,
    pub y: i64,
}

/// A note named by its world position and text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRef {
    pub x: f64,
    pub y: f64,
    pub content: String,
}

/// Sender details the relay attaches to inbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: String,
    #[serde(default)]
    pub color: String,
}

/// Messages broadcast to every peer in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PeerMessage {
    /// Cards dropped in new cells.
    Move { positions: Vec<PositionUpdate> },
    /// The sender's full selection.
    Reselect { selected: Vec<String> },
    /// A blank note created in a grid cell.
    NoteNew { x: i64, y: i64 },
    NoteEdit {
        x: f64,
        y: f64,
        #[serde(rename = "oldContent")]
        old_content: String,
        #[serde(rename = "newContent")]
        new_content: String,
    },
    NotePoof(NoteRef),
    NoteManyWentPoof { poofers: Vec<NoteRef> },
    /// Full board state as a save code.
    LoadEntireThing { code: String },
    /// A peer joined the room.
    #[serde(rename = "togetherjs.hello")]
    Hello {
        #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
    },
    /// Reply to a join so the newcomer learns about us.
    HiIAlsoExist,
}

/// A message as delivered by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<PeerInfo>,
    #[serde(flatten)]
    pub message: PeerMessage,
}

impl InboundMessage {
    /// Id of the sending peer, falling back to the hello's client id.
    pub fn sender_id(&self) -> Option<&str> {
        if let Some(peer) = &self.peer {
            return Some(&peer.id);
        }
        match &self.message {
            PeerMessage::Hello { client_id } => client_id.as_deref(),
            _ => None,
        }
    }
}
