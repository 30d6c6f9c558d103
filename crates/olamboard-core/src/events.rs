//! Events the board reports after local mutations and UI requests.

use crate::cards::CardId;
use crate::grid::CellKey;
use kurbo::Point;

/// A card that finished moving, named by the identifier it had before the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedCard {
    pub identifier: String,
    pub cell: CellKey,
}

/// A note that was deleted, named by its world position and text.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNote {
    pub at: Point,
    pub content: String,
}

/// Something the shell or collaboration layer may need to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    CardsMoved(Vec<MovedCard>),
    /// Peer identifiers of the full local selection.
    SelectionChanged(Vec<String>),
    NoteCreated {
        cell: CellKey,
    },
    NoteEdited {
        at: Point,
        old_content: String,
        new_content: String,
    },
    NoteRemoved(RemovedNote),
    NotesRemoved(Vec<RemovedNote>),
    /// A save code was loaded locally; carries the resulting state.
    BoardReloaded {
        code: String,
    },
    /// An element card was clicked.
    ElementInfoRequested(CardId),
    /// A note was clicked or created and should be edited.
    NoteEditorOpened(CardId),
    NoteEditorClosed,
}

impl BoardEvent {
    /// Whether the event changes state that peers share.
    pub fn is_shared(&self) -> bool {
        !matches!(
            self,
            BoardEvent::ElementInfoRequested(_)
                | BoardEvent::NoteEditorOpened(_)
                | BoardEvent::NoteEditorClosed
        )
    }
}
