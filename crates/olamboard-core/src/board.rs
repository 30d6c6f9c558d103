//! The board session: cards, camera, options and gestures in one place.

use crate::camera::Camera;
use crate::cards::{CardId, CardStore};
use crate::catalog::{Catalog, InfoLine};
use crate::codec::{self, CodecError, DecodeContext, SaveBlob, SavedNote};
use crate::collaboration::BoardMutationSink;
use crate::config::{BoardConfig, BoardOptions};
use crate::events::{BoardEvent, RemovedNote};
use crate::gesture::{GestureContext, GestureEffect, GestureRouter};
use crate::grid::CellKey;
use crate::input::{CaptureChange, Key, PointerEvent, WheelInput};
use crate::layout::{LayoutRng, default_layout};
use crate::protocol::PeerInfo;
use kurbo::{Point, Rect};
use std::collections::{HashMap, HashSet};

/// What a remote peer currently has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerPresence {
    pub color: String,
    pub selected: Vec<CardId>,
}

/// One open board.
///
/// Local actions report [`BoardEvent`]s through [`Board::take_events`].
/// Changes applied on behalf of peers go through [`BoardMutationSink`] and
/// only report editor state changes, so they are never echoed back.
#[derive(Debug)]
pub struct Board {
    camera: Camera,
    cards: CardStore,
    options: BoardOptions,
    router: GestureRouter,
    catalog: Catalog,
    decode_context: DecodeContext,
    editing_note: Option<CardId>,
    peers: HashMap<String, PeerPresence>,
    events: Vec<BoardEvent>,
    /// Capture change caused outside pointer handling, not yet reported.
    pending_capture: Option<CaptureChange>,
}

impl Board {
    /// Create a board with one unplaced card per catalog element.
    pub fn new(catalog: Catalog, config: &BoardConfig) -> Self {
        let mut cards = CardStore::new();
        for record in &catalog.elements {
            let hidden = record.hidden && !config.show_all;
            let id = cards.add_element(record.clone());
            if let Some(card) = cards.get_mut(id) {
                card.hidden = hidden;
            }
        }
        let decode_context = DecodeContext::for_catalog(
            config.is_default_source(),
            catalog.elements.iter().map(|record| record.symbol.as_str()),
        );
        log::info!(
            "board created with {} elements from {}",
            catalog.elements.len(),
            config.source
        );
        Self {
            camera: Camera::new(),
            cards,
            options: config.options,
            router: GestureRouter::new(),
            catalog,
            decode_context,
            editing_note: None,
            peers: HashMap::new(),
            events: Vec::new(),
            pending_capture: None,
        }
    }

    /// Place visible elements by the catalog's default sort.
    pub fn apply_default_layout(&mut self, rng: &mut LayoutRng) {
        let placements = default_layout(&self.cards, &self.catalog.metadata.sort(), rng);
        for (id, cell) in placements {
            self.cards.reposition(id, cell);
        }
    }

    /// Frame the first row for a viewport of the given height.
    pub fn fit_viewport(&mut self, viewport_height: f64) {
        self.camera = Camera::initial_for_viewport(viewport_height);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn cards(&self) -> &CardStore {
        &self.cards
    }

    pub fn options(&self) -> &BoardOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn decode_context(&self) -> &DecodeContext {
        &self.decode_context
    }

    pub fn gestures(&self) -> &GestureRouter {
        &self.router
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.options.toggle_grid()
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.options.toggle_snap()
    }

    pub fn toggle_notes(&mut self) -> bool {
        self.options.toggle_notes()
    }

    pub fn toggle_multiple_touch(&mut self) -> bool {
        self.options.toggle_multiple_touch()
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn route<R>(&mut self, f: impl FnOnce(&mut GestureRouter, &mut GestureContext<'_>) -> R) -> R {
        let mut ctx = GestureContext {
            camera: &mut self.camera,
            cards: &mut self.cards,
            options: &self.options,
        };
        f(&mut self.router, &mut ctx)
    }

    /// Feed one pointer event. Returns a capture change the shell should
    /// apply to its document-level listeners.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> Option<CaptureChange> {
        let effects = match event {
            PointerEvent::Down {
                contact,
                position,
                modifiers,
            } => self.route(|router, ctx| router.press(ctx, contact, position, modifiers)),
            PointerEvent::Move { contact, position } => {
                self.route(|router, ctx| router.move_to(ctx, contact, position));
                Vec::new()
            }
            PointerEvent::Up { contact, position } => {
                self.route(|router, ctx| router.release(ctx, contact, position))
            }
            PointerEvent::Cancel { contact } => self.route(|router, ctx| router.cancel(ctx, contact)),
            PointerEvent::Wheel(input) => {
                self.wheel(&input);
                Vec::new()
            }
        };
        let capture = self.apply_effects(effects);
        match (self.pending_capture.take(), capture) {
            // Released by a load, then reacquired: listeners stay attached.
            (Some(CaptureChange::Released), Some(CaptureChange::Acquired)) => None,
            (pending, None) => pending,
            (_, capture) => capture,
        }
    }

    /// Take a capture change caused by a load cancelling live gestures.
    /// Also reported by the next [`handle_pointer_event`](Self::handle_pointer_event).
    pub fn take_capture_change(&mut self) -> Option<CaptureChange> {
        self.pending_capture.take()
    }

    fn apply_effects(&mut self, effects: Vec<GestureEffect>) -> Option<CaptureChange> {
        let mut capture = None;
        for effect in effects {
            match effect {
                GestureEffect::Capture(change) => capture = Some(change),
                GestureEffect::CardClicked(id) => self.card_clicked(id),
                GestureEffect::CardsMoved(moved) => self.events.push(BoardEvent::CardsMoved(moved)),
                GestureEffect::SelectionChanged => self.selection_changed(),
                GestureEffect::NoteRequested(cell) => self.create_note(cell),
            }
        }
        capture
    }

    fn card_clicked(&mut self, id: CardId) {
        let Some(card) = self.cards.get(id) else {
            return;
        };
        if card.is_note() {
            self.editing_note = Some(id);
            self.events.push(BoardEvent::NoteEditorOpened(id));
        } else {
            self.events.push(BoardEvent::ElementInfoRequested(id));
        }
    }

    fn selection_changed(&mut self) {
        self.events
            .push(BoardEvent::SelectionChanged(self.cards.selected_identifiers()));
    }

    fn create_note(&mut self, cell: CellKey) {
        let id = self.cards.add_note("");
        self.cards.reposition(id, cell);
        self.editing_note = Some(id);
        log::debug!("note created at {cell}");
        self.events.push(BoardEvent::NoteCreated { cell });
        self.events.push(BoardEvent::NoteEditorOpened(id));
    }

    pub fn wheel(&mut self, input: &WheelInput) {
        self.camera.wheel(input);
    }

    /// Advance camera inertia by one frame. Returns true if the view moved.
    pub fn tick(&mut self) -> bool {
        self.camera.tick()
    }

    /// React to a key press. Returns true if the key did something.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => self.close_note_editor(),
            // The editor has focus while open and owns these keys.
            Key::Backspace | Key::Delete if self.editing_note.is_none() => {
                self.remove_selected_notes() > 0
            }
            _ => false,
        }
    }

    pub fn editing_note(&self) -> Option<CardId> {
        self.editing_note
    }

    /// Text of the note being edited.
    pub fn note_editor_text(&self) -> Option<&str> {
        self.cards.get(self.editing_note?)?.note_content()
    }

    /// Replace the text of the note being edited.
    pub fn edit_note(&mut self, text: &str) -> bool {
        let Some(id) = self.editing_note else {
            return false;
        };
        let Some(at) = self.cards.get(id).map(|card| card.position) else {
            return false;
        };
        match self.cards.set_note_content(id, text) {
            Some(old_content) if old_content != text => {
                self.events.push(BoardEvent::NoteEdited {
                    at,
                    old_content,
                    new_content: text.to_string(),
                });
                true
            }
            _ => false,
        }
    }

    /// Delete the note being edited and close the editor.
    pub fn remove_note(&mut self) -> bool {
        let Some(id) = self.editing_note.take() else {
            return false;
        };
        let Some(note) = self.cards.remove_note(id) else {
            return false;
        };
        self.events.push(BoardEvent::NoteRemoved(RemovedNote {
            at: note.position,
            content: note.note_content().unwrap_or_default().to_string(),
        }));
        self.events.push(BoardEvent::NoteEditorClosed);
        if note.selected {
            self.selection_changed();
        }
        true
    }

    /// Delete every selected note. Returns how many were removed.
    pub fn remove_selected_notes(&mut self) -> usize {
        let selected: Vec<CardId> = self
            .cards
            .notes()
            .filter(|note| note.selected)
            .map(|note| note.id)
            .collect();
        let removed: Vec<RemovedNote> = selected
            .into_iter()
            .filter_map(|id| self.cards.remove_note(id))
            .map(|note| RemovedNote {
                at: note.position,
                content: note.note_content().unwrap_or_default().to_string(),
            })
            .collect();
        if removed.is_empty() {
            return 0;
        }
        let count = removed.len();
        self.forget_missing_cards();
        self.events.push(BoardEvent::NotesRemoved(removed));
        self.selection_changed();
        count
    }

    /// Close the note editor. Returns false if it was not open.
    pub fn close_note_editor(&mut self) -> bool {
        if self.editing_note.take().is_none() {
            return false;
        }
        self.events.push(BoardEvent::NoteEditorClosed);
        true
    }

    /// Detail overlay content for an element card.
    pub fn element_info(&self, id: CardId) -> Option<(String, Vec<InfoLine>)> {
        let record = self.cards.get(id)?.record()?;
        Some(self.catalog.info(record))
    }

    /// Selection readout: the open box's size, else the selected count.
    pub fn status_text(&self) -> String {
        if let Some(text) = self.router.status_text() {
            return text;
        }
        match self.cards.iter().filter(|card| card.selected).count() {
            0 => String::new(),
            count => format!("{count} element(s) selected"),
        }
    }

    /// Open selection boxes in world coordinates.
    pub fn selection_rects(&self) -> Vec<Rect> {
        self.router.selection_rects()
    }

    pub fn peers(&self) -> &HashMap<String, PeerPresence> {
        &self.peers
    }

    /// Colors of the peers that have `id` selected.
    pub fn peer_colors(&self, id: CardId) -> Vec<&str> {
        self.peers
            .values()
            .filter(|presence| presence.selected.contains(&id))
            .map(|presence| presence.color.as_str())
            .collect()
    }

    /// Encode the board as a save code.
    pub fn save_code(&self) -> String {
        let notes = self
            .cards
            .notes()
            .map(|note| SavedNote {
                content: note.note_content().unwrap_or_default().to_string(),
                cell: note.cell(),
            })
            .collect();
        let positions = self.cards.elements().map(|card| card.cell()).collect();
        codec::encode(&SaveBlob::new(notes, positions))
    }

    /// Load a save code entered by the user and announce the new state.
    pub fn load_code(&mut self, code: &str) -> Result<(), CodecError> {
        self.restore_code(code)?;
        let code = self.save_code();
        self.events.push(BoardEvent::BoardReloaded { code });
        Ok(())
    }

    /// Load a save code without announcing it. The board is untouched if
    /// the code does not decode.
    pub fn restore_code(&mut self, code: &str) -> Result<(), CodecError> {
        let blob = codec::decode_with(code, &self.decode_context).inspect_err(|err| {
            log::warn!("rejected save code: {err}");
        })?;
        self.apply_blob(blob);
        Ok(())
    }

    fn apply_blob(&mut self, blob: SaveBlob) {
        // Gestures in flight refer to cards about to move or vanish. Only the
        // capture release survives; the dropped cards are replaced below.
        let cancelled = self.route(|router, ctx| router.cancel_all(ctx));
        if cancelled.contains(&GestureEffect::Capture(CaptureChange::Released)) {
            self.pending_capture = Some(CaptureChange::Released);
        }

        let was_snapped: HashSet<CardId> = self
            .cards
            .elements()
            .filter(|card| card.is_snapped())
            .map(|card| card.id)
            .collect();
        self.cards.clear_grid();

        let old_notes: Vec<CardId> = self.cards.note_ids().to_vec();
        for id in old_notes {
            self.cards.remove_note(id);
        }
        self.close_note_editor();

        for note in &blob.notes {
            let id = self.cards.add_note(note.content.as_str());
            self.cards.reposition(id, note.cell);
        }

        let elements: Vec<CardId> = self.cards.element_ids().to_vec();
        for (index, id) in elements.into_iter().enumerate() {
            let hidden = self.cards.get(id).is_some_and(|card| card.hidden);
            match blob.positions.get(index) {
                Some(&cell) if hidden => self.cards.set_position(id, cell.origin()),
                Some(&cell) => {
                    self.cards.reposition(id, cell);
                }
                None if was_snapped.contains(&id) => {
                    self.cards.snap(id);
                }
                None => {}
            }
            self.cards.bring_to_front(id);
        }
        self.forget_missing_cards();
        log::info!(
            "loaded board: {} notes, {} positions",
            blob.notes.len(),
            blob.positions.len()
        );
    }

    /// Drop peer highlights of cards that no longer exist.
    fn forget_missing_cards(&mut self) {
        let cards = &self.cards;
        for presence in self.peers.values_mut() {
            presence.selected.retain(|id| cards.get(*id).is_some());
        }
    }
}

impl BoardMutationSink for Board {
    fn move_card(&mut self, identifier: &str, cell: CellKey) -> bool {
        let Some(id) = self.cards.find_by_identifier(identifier) else {
            return false;
        };
        self.cards.reposition(id, cell);
        self.cards.bring_to_front(id);
        true
    }

    fn show_peer_selection(&mut self, peer: &PeerInfo, selected: &[String]) -> Vec<String> {
        let mut unknown = Vec::new();
        let mut ids = Vec::with_capacity(selected.len());
        for identifier in selected {
            match self.cards.find_by_identifier(identifier) {
                Some(id) => ids.push(id),
                None => unknown.push(identifier.clone()),
            }
        }
        let presence = self.peers.entry(peer.id.clone()).or_default();
        presence.color = peer.color.clone();
        presence.selected = ids;
        unknown
    }

    fn register_peer(&mut self, peer_id: &str) {
        if !self.peers.contains_key(peer_id) {
            log::debug!("registered peer {peer_id}");
            self.peers.insert(peer_id.to_string(), PeerPresence::default());
        }
    }

    fn spawn_note(&mut self, cell: CellKey) {
        let id = self.cards.add_note("");
        self.cards.reposition(id, cell);
    }

    fn rewrite_note(&mut self, at: Point, old: &str, new: &str) -> bool {
        let Some(id) = self.cards.find_note(at, old) else {
            return false;
        };
        self.cards.set_note_content(id, new);
        true
    }

    fn discard_note(&mut self, at: Point, content: &str) -> bool {
        let Some(id) = self.cards.find_note(at, content) else {
            return false;
        };
        if self.editing_note == Some(id) {
            self.close_note_editor();
        }
        self.cards.remove_note(id);
        self.forget_missing_cards();
        true
    }

    fn replace_state(&mut self, code: &str) -> Result<(), CodecError> {
        self.restore_code(code)
    }

    fn save_code(&self) -> String {
        Board::save_code(self)
    }

    fn selection_identifiers(&self) -> Vec<String> {
        self.cards.selected_identifiers()
    }
}
