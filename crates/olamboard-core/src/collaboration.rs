//! Collaboration bridge between local board events and peer messages.
//!
//! Outbound, board events become JSON messages queued for the relay.
//! Inbound, peer messages are applied through a [`BoardMutationSink`], which
//! runs the same routines local actions use but never reports them back as
//! new events, so remote changes are not echoed.

use crate::codec::CodecError;
use crate::events::BoardEvent;
use crate::grid::CellKey;
use crate::protocol::{InboundMessage, NoteRef, PeerInfo, PeerMessage, PositionUpdate};
use kurbo::Point;
use thiserror::Error;

/// Errors from applying a peer message.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid peer message: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unknown cards: {}", .0.join(", "))]
    UnknownCards(Vec<String>),
    #[error("No note at ({x}, {y}) reading {content:?}")]
    UnknownNote { x: f64, y: f64, content: String },
    #[error("Message needs a sending peer")]
    MissingPeer,
    #[error("Rejected board state: {0}")]
    Codec(#[from] CodecError),
}

/// Board operations a peer message may trigger.
pub trait BoardMutationSink {
    /// Move the card named `identifier` into `cell`. Returns false if no
    /// card has that identifier.
    fn move_card(&mut self, identifier: &str, cell: CellKey) -> bool;

    /// Replace the set of cards highlighted for `peer`. Returns the
    /// identifiers that matched no card.
    fn show_peer_selection(&mut self, peer: &PeerInfo, selected: &[String]) -> Vec<String>;

    /// Remember that a peer is present.
    fn register_peer(&mut self, peer_id: &str);

    /// Create an empty note in `cell`.
    fn spawn_note(&mut self, cell: CellKey);

    /// Change the text of the note at `at` reading `old`. Returns false if
    /// there is no such note.
    fn rewrite_note(&mut self, at: Point, old: &str, new: &str) -> bool;

    /// Delete the note at `at` reading `content`. Returns false if there is
    /// no such note.
    fn discard_note(&mut self, at: Point, content: &str) -> bool;

    /// Replace the whole board with a save code.
    fn replace_state(&mut self, code: &str) -> Result<(), CodecError>;

    /// Current board as a save code.
    fn save_code(&self) -> String;

    /// Peer identifiers of the local selection.
    fn selection_identifiers(&self) -> Vec<String>;
}

/// Queues outbound messages and applies inbound ones.
#[derive(Debug, Default)]
pub struct CollaborationBridge {
    enabled: bool,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
}

impl CollaborationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.outgoing.clear();
    }

    /// The message a local event is broadcast as, if any.
    pub fn outbound(event: &BoardEvent) -> Option<PeerMessage> {
        let message = match event {
            BoardEvent::CardsMoved(moved) if !moved.is_empty() => PeerMessage::Move {
                positions: moved
                    .iter()
                    .map(|card| PositionUpdate {
                        identifier: card.identifier.clone(),
                        x: card.cell.x,
                        y: card.cell.y,
                    })
                    .collect(),
            },
            BoardEvent::SelectionChanged(selected) => PeerMessage::Reselect {
                selected: selected.clone(),
            },
            BoardEvent::NoteCreated { cell } => PeerMessage::NoteNew {
                x: cell.x,
                y: cell.y,
            },
            BoardEvent::NoteEdited {
                at,
                old_content,
                new_content,
            } => PeerMessage::NoteEdit {
                x: at.x,
                y: at.y,
                old_content: old_content.clone(),
                new_content: new_content.clone(),
            },
            BoardEvent::NoteRemoved(note) => PeerMessage::NotePoof(NoteRef {
                x: note.at.x,
                y: note.at.y,
                content: note.content.clone(),
            }),
            BoardEvent::NotesRemoved(notes) => PeerMessage::NoteManyWentPoof {
                poofers: notes
                    .iter()
                    .map(|note| NoteRef {
                        x: note.at.x,
                        y: note.at.y,
                        content: note.content.clone(),
                    })
                    .collect(),
            },
            BoardEvent::BoardReloaded { code } => PeerMessage::LoadEntireThing { code: code.clone() },
            _ => return None,
        };
        Some(message)
    }

    /// Queue the shared events for broadcast. Does nothing while disabled.
    pub fn publish(&mut self, events: &[BoardEvent]) {
        if !self.enabled {
            return;
        }
        for event in events.iter().filter(|e| e.is_shared()) {
            if let Some(message) = Self::outbound(event) {
                self.queue(&message);
            }
        }
    }

    fn queue(&mut self, message: &PeerMessage) {
        match serde_json::to_string(message) {
            Ok(json) => self.outgoing.push(json),
            Err(err) => log::error!("failed to encode peer message: {err}"),
        }
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Parse and apply a message from the relay.
    pub fn handle_message(
        &mut self,
        sink: &mut impl BoardMutationSink,
        json: &str,
    ) -> Result<(), BridgeError> {
        let inbound: InboundMessage = serde_json::from_str(json)?;
        self.apply(sink, inbound)
    }

    /// Apply a parsed peer message.
    ///
    /// Messages naming cards or notes that do not exist apply whatever they
    /// can and then report the rest as an error.
    pub fn apply(
        &mut self,
        sink: &mut impl BoardMutationSink,
        inbound: InboundMessage,
    ) -> Result<(), BridgeError> {
        let sender = inbound.sender_id().map(str::to_string);
        match inbound.message {
            PeerMessage::Move { positions } => {
                let unknown: Vec<String> = positions
                    .into_iter()
                    .filter(|p| !sink.move_card(&p.identifier, CellKey::new(p.x, p.y)))
                    .map(|p| p.identifier)
                    .collect();
                if !unknown.is_empty() {
                    log::warn!("peer moved unknown cards: {unknown:?}");
                    return Err(BridgeError::UnknownCards(unknown));
                }
            }
            PeerMessage::Reselect { selected } => {
                let peer = inbound.peer.ok_or(BridgeError::MissingPeer)?;
                sink.register_peer(&peer.id);
                let unknown = sink.show_peer_selection(&peer, &selected);
                if !unknown.is_empty() {
                    log::warn!("peer {} selected unknown cards: {unknown:?}", peer.id);
                    return Err(BridgeError::UnknownCards(unknown));
                }
            }
            PeerMessage::Hello { .. } => {
                if let Some(id) = &sender {
                    sink.register_peer(id);
                }
                log::info!("peer joined: {}", sender.as_deref().unwrap_or("?"));
                if self.enabled {
                    self.queue(&PeerMessage::LoadEntireThing {
                        code: sink.save_code(),
                    });
                    self.queue(&PeerMessage::HiIAlsoExist);
                    self.queue(&PeerMessage::Reselect {
                        selected: sink.selection_identifiers(),
                    });
                }
            }
            PeerMessage::HiIAlsoExist => {
                if let Some(id) = &sender {
                    sink.register_peer(id);
                }
            }
            PeerMessage::NoteNew { x, y } => sink.spawn_note(CellKey::new(x, y)),
            PeerMessage::NoteEdit {
                x,
                y,
                old_content,
                new_content,
            } => {
                if !sink.rewrite_note(Point::new(x, y), &old_content, &new_content) {
                    log::warn!("peer edited unknown note at ({x}, {y})");
                    return Err(BridgeError::UnknownNote {
                        x,
                        y,
                        content: old_content,
                    });
                }
            }
            PeerMessage::NotePoof(note) => discard(sink, note)?,
            PeerMessage::NoteManyWentPoof { poofers } => {
                let mut first_missing = None;
                for note in poofers {
                    if let Err(err) = discard(sink, note) {
                        first_missing.get_or_insert(err);
                    }
                }
                if let Some(err) = first_missing {
                    return Err(err);
                }
            }
            PeerMessage::LoadEntireThing { code } => sink.replace_state(&code)?,
        }
        Ok(())
    }
}

fn discard(sink: &mut impl BoardMutationSink, note: NoteRef) -> Result<(), BridgeError> {
    if sink.discard_note(Point::new(note.x, note.y), &note.content) {
        return Ok(());
    }
    log::warn!("peer removed unknown note at ({}, {})", note.x, note.y);
    Err(BridgeError::UnknownNote {
        x: note.x,
        y: note.y,
        content: note.content,
    })
}
