//! OlamBoard Core Library
//!
//! Platform-agnostic interaction engine for the OlamBoard card board.

pub mod board;
pub mod camera;
pub mod cards;
pub mod catalog;
pub mod codec;
pub mod collaboration;
pub mod config;
pub mod drag;
pub mod events;
pub mod gesture;
pub mod grid;
pub mod input;
pub mod layout;
pub mod overrides;
pub mod protocol;
pub mod selection;
pub mod storage;

pub use board::{Board, PeerPresence};
pub use camera::Camera;
pub use cards::{Card, CardId, CardKind, CardStore};
pub use catalog::{Catalog, CatalogError, ElementRecord, Metadata};
pub use codec::{CodecError, DecodeContext, SaveBlob, SavedNote};
pub use collaboration::{BoardMutationSink, BridgeError, CollaborationBridge};
pub use config::{BoardConfig, BoardOptions, BootParams};
pub use events::{BoardEvent, MovedCard, RemovedNote};
pub use gesture::{GestureEffect, GestureKind, GestureRouter};
pub use grid::{CELL_SIZE, CellKey, GridIndex, snap_to_grid};
pub use input::{CaptureChange, ContactId, Key, Modifiers, PointerEvent, WheelInput};
pub use layout::LayoutRng;
pub use overrides::{OverrideError, apply_overrides};
pub use protocol::{InboundMessage, PeerInfo, PeerMessage};
pub use storage::{AutoSaveManager, MemoryStorage, SaveStore, StorageError, StorageResult};
