//! A running board with its persistence and collaboration wiring.

use olamboard_core::{
    Board, BoardEvent, BootParams, BridgeError, CaptureChange, Catalog, CodecError,
    CollaborationBridge, LayoutRng, SaveStore, StorageError,
    storage::AutoSaveManager,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the shell.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid catalog: {0}")]
    Catalog(String),
}

/// Board plus the autosave slot and peer bridge it reports to.
pub struct BoardSession<S: SaveStore> {
    board: Board,
    bridge: CollaborationBridge,
    autosave: AutoSaveManager<S>,
    params: BootParams,
}

impl<S: SaveStore> BoardSession<S> {
    /// Start a board the way the page does: apply overrides, lay out the
    /// catalog, then restore the code from the link or from storage.
    pub fn boot(
        mut catalog: Catalog,
        params: BootParams,
        storage: Arc<S>,
        rng: &mut LayoutRng,
    ) -> Result<Self, SessionError> {
        if let Some(encoded) = &params.overrides {
            match olamboard_core::apply_overrides(&mut catalog.elements, encoded) {
                Ok(count) => log::info!("applied {count} element overrides"),
                Err(err) => log::warn!("ignoring overrides: {err}"),
            }
        }

        let mut board = Board::new(catalog, &params.board_config());
        board.apply_default_layout(rng);

        let mut autosave = AutoSaveManager::new(storage, params.storage_key());
        let restored = match &params.code {
            Some(code) => Some(code.clone()),
            None => autosave.load()?,
        };
        if let Some(code) = restored {
            if let Err(err) = board.restore_code(&code) {
                log::warn!("could not restore saved board: {err}");
            }
        }
        autosave.save(&board.save_code())?;

        let mut bridge = CollaborationBridge::new();
        if params.multiplayer() {
            log::info!("joining room {}", params.room.as_deref().unwrap_or_default());
            bridge.enable();
        }

        Ok(Self {
            board,
            bridge,
            autosave,
            params,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn params(&self) -> &BootParams {
        &self.params
    }

    /// Route pending board events to peers and mark the board dirty.
    /// Returns the events for the shell to react to.
    pub fn pump(&mut self) -> Vec<BoardEvent> {
        let events = self.board.take_events();
        if events.iter().any(BoardEvent::is_shared) {
            self.autosave.mark_dirty();
        }
        self.bridge.publish(&events);
        events
    }

    /// Advance one frame: camera inertia and periodic saving.
    pub fn frame(&mut self) -> bool {
        let moved = self.board.tick();
        let board = &self.board;
        if let Err(err) = self.autosave.maybe_save(|| board.save_code()) {
            log::error!("autosave failed: {err}");
        }
        moved
    }

    /// Save to the storage slot now.
    pub fn save_now(&mut self) -> Result<String, SessionError> {
        let code = self.board.save_code();
        self.autosave.save(&code)?;
        Ok(code)
    }

    /// Turn on once-a-second saving for the rest of the session.
    pub fn enable_autosave(&mut self) {
        self.autosave.enable();
    }

    pub fn set_autosave_interval(&mut self, interval: Duration) {
        self.autosave.set_interval(interval);
    }

    pub fn autosave_enabled(&self) -> bool {
        self.autosave.is_enabled()
    }

    /// Load a pasted save code and tell peers.
    pub fn load_code(&mut self, code: &str) -> Result<(), SessionError> {
        self.board.load_code(code)?;
        Ok(())
    }

    /// Apply a message from the relay.
    pub fn handle_peer_message(&mut self, json: &str) -> Result<(), SessionError> {
        let result = self.bridge.handle_message(&mut self.board, json);
        // Remote changes are saved like local ones.
        self.autosave.mark_dirty();
        result.map_err(SessionError::from)
    }

    /// Listener change left by a load that cut gestures short. The shell
    /// checks this after [`Self::load_code`] and [`Self::handle_peer_message`].
    pub fn take_capture_change(&mut self) -> Option<CaptureChange> {
        self.board.take_capture_change()
    }

    /// Messages waiting for the relay.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        self.bridge.take_outgoing()
    }
}

/// Parse the two catalog documents.
pub fn parse_catalog(elements_json: &str, metadata_json: &str) -> Result<Catalog, SessionError> {
    Catalog::from_json(elements_json, metadata_json).map_err(|e| SessionError::Catalog(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use olamboard_core::{
        CellKey, ContactId, MemoryStorage, Modifiers, PointerEvent, SaveBlob, codec,
    };

    const ELEMENTS: &str = r#"[
        {"symbol": "H", "name": "Hydrogen", "number": 1},
        {"symbol": "He", "name": "Helium", "number": 2},
        {"symbol": "Og", "name": "Oganesson", "number": 118, "hidden": true}
    ]"#;
    const METADATA: &str = r#"{"_DEFAULT_SORT_": "number"}"#;

    fn boot(query: &str, storage: Arc<MemoryStorage>) -> BoardSession<MemoryStorage> {
        let catalog = parse_catalog(ELEMENTS, METADATA).unwrap();
        BoardSession::boot(catalog, BootParams::parse(query), storage, &mut LayoutRng::new(3)).unwrap()
    }

    #[test]
    fn test_boot_saves_initial_layout() {
        let storage = Arc::new(MemoryStorage::new());
        let session = boot("", storage.clone());
        let stored = storage.get("[olamreee] savecode./olam").unwrap().unwrap();
        assert_eq!(stored, session.board().save_code());
    }

    #[test]
    fn test_boot_prefers_link_code_over_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let linked = codec::encode(&SaveBlob::new(Vec::new(), vec![CellKey::new(7, 7)]));
        let stored = codec::encode(&SaveBlob::new(Vec::new(), vec![CellKey::new(3, 3)]));
        storage.set("[olamreee] savecode.custom.mine", &stored).unwrap();

        let session = boot(&format!("?key=mine&code={linked}"), storage.clone());
        let h = session.board().cards().find_by_identifier("H").unwrap();
        assert_eq!(session.board().cards().get(h).unwrap().cell(), CellKey::new(7, 7));

        let session = boot("?key=mine", storage);
        let h = session.board().cards().find_by_identifier("H").unwrap();
        assert_eq!(session.board().cards().get(h).unwrap().cell(), CellKey::new(7, 7));
    }

    #[test]
    fn test_boot_survives_corrupt_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("[olamreee] savecode./olam", "%%%").unwrap();
        let session = boot("", storage);
        let he = session.board().cards().find_by_identifier("He").unwrap();
        assert_eq!(session.board().cards().get(he).unwrap().cell(), CellKey::new(1, 0));
    }

    #[test]
    fn test_local_moves_reach_peers_only_in_a_room() {
        let mut solo = boot("", Arc::new(MemoryStorage::new()));
        let mut shared = boot("?room=abc", Arc::new(MemoryStorage::new()));
        for session in [&mut solo, &mut shared] {
            let board = session.board_mut();
            board.handle_pointer_event(PointerEvent::Down {
                contact: ContactId::Mouse,
                position: Point::new(10.0, 10.0),
                modifiers: Modifiers::default(),
            });
            board.handle_pointer_event(PointerEvent::Move {
                contact: ContactId::Mouse,
                position: Point::new(10.0, 170.0),
            });
            board.handle_pointer_event(PointerEvent::Up {
                contact: ContactId::Mouse,
                position: Point::new(10.0, 170.0),
            });
            assert_eq!(session.pump().len(), 1);
        }
        assert!(solo.take_outgoing().is_empty());
        let outgoing = shared.take_outgoing();
        assert_eq!(outgoing.len(), 1);
        assert!(outgoing[0].contains(r#""identifier":"H""#));
    }

    #[test]
    fn test_autosave_after_enable() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = boot("", storage.clone());
        session
            .board_mut()
            .load_code(&codec::encode(&SaveBlob::new(Vec::new(), vec![CellKey::new(9, 9)])))
            .unwrap();
        session.pump();
        session.frame();
        let before = storage.get("[olamreee] savecode./olam").unwrap().unwrap();
        assert_ne!(before, session.board().save_code());

        session.enable_autosave();
        session.set_autosave_interval(Duration::ZERO);
        session.frame();
        let after = storage.get("[olamreee] savecode./olam").unwrap().unwrap();
        assert_eq!(after, session.board().save_code());
    }

    #[test]
    fn test_load_during_drag_releases_capture() {
        let mut session = boot("", Arc::new(MemoryStorage::new()));
        let code = session.board().save_code();
        let capture = session.board_mut().handle_pointer_event(PointerEvent::Down {
            contact: ContactId::Mouse,
            position: Point::new(10.0, 10.0),
            modifiers: Modifiers::default(),
        });
        assert_eq!(capture, Some(CaptureChange::Acquired));
        session.board_mut().handle_pointer_event(PointerEvent::Move {
            contact: ContactId::Mouse,
            position: Point::new(10.0, 170.0),
        });

        session.load_code(&code).unwrap();
        assert_eq!(session.take_capture_change(), Some(CaptureChange::Released));
        assert_eq!(session.take_capture_change(), None);
        let h = session.board().cards().find_by_identifier("H").unwrap();
        assert_eq!(session.board().cards().get(h).unwrap().cell(), CellKey::new(0, 0));
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let session = boot("?override=!!!", Arc::new(MemoryStorage::new()));
        assert_eq!(session.board().catalog().elements.len(), 3);
    }

    #[test]
    fn test_peer_error_is_reported() {
        let mut session = boot("?room=abc", Arc::new(MemoryStorage::new()));
        let err = session
            .handle_peer_message(r#"{"type":"move","positions":[{"identifier":"Xx","x":1,"y":1}]}"#)
            .unwrap_err();
        assert!(matches!(err, SessionError::Bridge(BridgeError::UnknownCards(_))));
    }
}
