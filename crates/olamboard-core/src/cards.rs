//! Cards and the store that owns their positions, stacking order and
//! grid occupancy.

use crate::catalog::ElementRecord;
use crate::grid::{CELL_SIZE, CellKey, GridIndex};
use kurbo::{Point, Rect};
use std::collections::HashMap;
use uuid::Uuid;

/// Durable in-process card identifier.
pub type CardId = Uuid;

/// Side length of a card in world units.
pub const CARD_SIZE: f64 = CELL_SIZE;

/// Positions closer than this are considered equal when matching notes.
const POSITION_EPSILON: f64 = 1e-6;

/// What a card shows.
#[derive(Debug, Clone, PartialEq)]
pub enum CardKind {
    /// An item from the catalog. Its data never changes.
    Element(ElementRecord),
    /// A free-text sticky note.
    Note { content: String },
}

/// A positioned, selectable, draggable board entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    /// Top-left corner in world coordinates.
    pub position: Point,
    pub selected: bool,
    /// Visually lifted while a drag is in progress.
    pub dragged: bool,
    /// Cell the card is counted in, if it is recorded in the grid index.
    occupied: Option<CellKey>,
    pub hidden: bool,
    /// Held by a drag session (as anchor or companion).
    pub engaged: bool,
    /// Peer identifier captured when the last drag began.
    pub last_identifier: Option<String>,
    pub kind: CardKind,
}

impl Card {
    fn with_kind(kind: CardKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            position: Point::ZERO,
            selected: false,
            dragged: false,
            occupied: None,
            hidden: false,
            engaged: false,
            last_identifier: None,
            kind,
        }
    }

    pub fn element(record: ElementRecord) -> Self {
        Self::with_kind(CardKind::Element(record))
    }

    pub fn note(content: impl Into<String>) -> Self {
        Self::with_kind(CardKind::Note {
            content: content.into(),
        })
    }

    pub fn is_note(&self) -> bool {
        matches!(self.kind, CardKind::Note { .. })
    }

    pub fn record(&self) -> Option<&ElementRecord> {
        match &self.kind {
            CardKind::Element(record) => Some(record),
            CardKind::Note { .. } => None,
        }
    }

    pub fn note_content(&self) -> Option<&str> {
        match &self.kind {
            CardKind::Note { content } => Some(content),
            CardKind::Element(_) => None,
        }
    }

    /// Whether the card is recorded in the grid index.
    pub fn is_snapped(&self) -> bool {
        self.occupied.is_some()
    }

    /// Cell the grid index counts this card in. It can differ from
    /// [`cell`](Self::cell) while a drag is carrying the card.
    pub fn occupied_cell(&self) -> Option<CellKey> {
        self.occupied
    }

    /// Nearest grid cell to the card's position.
    pub fn cell(&self) -> CellKey {
        CellKey::nearest(self.position)
    }

    /// Identifier shared with peers.
    ///
    /// Elements use their symbol. Notes have no shared identity, so they are
    /// named by cell and content; the name changes whenever either does.
    pub fn identifier(&self) -> String {
        match &self.kind {
            CardKind::Element(record) => record.symbol.clone(),
            CardKind::Note { content } => format!("--{}-{}", self.cell(), content),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (CARD_SIZE, CARD_SIZE))
    }

    /// Whether a world point lands on this card.
    pub fn hit_test(&self, point: Point) -> bool {
        let b = self.bounds();
        point.x >= b.x0 && point.x < b.x1 && point.y >= b.y0 && point.y < b.y1
    }
}

/// All cards on the board.
///
/// Elements keep the catalog order, which is also the save-code order.
/// Notes follow in creation order. `z_order` is back to front.
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: HashMap<CardId, Card>,
    elements: Vec<CardId>,
    notes: Vec<CardId>,
    z_order: Vec<CardId>,
    grid: GridIndex,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element card (unplaced and unsnapped).
    pub fn add_element(&mut self, record: ElementRecord) -> CardId {
        let mut card = Card::element(record);
        card.hidden = card.record().is_some_and(|r| r.hidden);
        let id = card.id;
        self.elements.push(id);
        self.z_order.push(id);
        self.cards.insert(id, card);
        id
    }

    /// Add a note card (unplaced and unsnapped).
    pub fn add_note(&mut self, content: impl Into<String>) -> CardId {
        let card = Card::note(content);
        let id = card.id;
        self.notes.push(id);
        self.z_order.push(id);
        self.cards.insert(id, card);
        id
    }

    /// Remove a note, releasing its cell. Elements cannot be removed.
    pub fn remove_note(&mut self, id: CardId) -> Option<Card> {
        if !self.cards.get(&id)?.is_note() {
            return None;
        }
        self.unposition(id);
        self.notes.retain(|&n| n != id);
        self.z_order.retain(|&n| n != id);
        self.cards.remove(&id)
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn get_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Element ids in catalog order.
    pub fn element_ids(&self) -> &[CardId] {
        &self.elements
    }

    /// Note ids in creation order.
    pub fn note_ids(&self) -> &[CardId] {
        &self.notes
    }

    /// All ids, elements first.
    pub fn ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.elements.iter().chain(self.notes.iter()).copied()
    }

    /// All cards, elements first.
    pub fn iter(&self) -> impl Iterator<Item = &Card> + '_ {
        self.ids().filter_map(|id| self.cards.get(&id))
    }

    pub fn notes(&self) -> impl Iterator<Item = &Card> + '_ {
        self.notes.iter().filter_map(|id| self.cards.get(id))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Card> + '_ {
        self.elements.iter().filter_map(|id| self.cards.get(id))
    }

    /// Cards back to front.
    pub fn z_ordered(&self) -> impl Iterator<Item = &Card> + '_ {
        self.z_order.iter().filter_map(|id| self.cards.get(id))
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// Topmost visible card under a world point.
    pub fn card_at(&self, point: Point) -> Option<CardId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.cards.get(id))
            .find(|card| !card.hidden && card.hit_test(point))
            .map(|card| card.id)
    }

    /// Move a card to the top of the stacking order.
    pub fn bring_to_front(&mut self, id: CardId) {
        if let Some(pos) = self.z_order.iter().position(|&c| c == id) {
            self.z_order.remove(pos);
            self.z_order.push(id);
        }
    }

    /// Set a card's free position without touching occupancy.
    pub fn set_position(&mut self, id: CardId, position: Point) {
        if let Some(card) = self.cards.get_mut(&id) {
            card.position = position;
        }
    }

    /// Round a card to its nearest cell and record it there.
    /// Returns true if the cell is now stacked.
    pub fn snap(&mut self, id: CardId) -> bool {
        let Some(card) = self.cards.get_mut(&id) else {
            return false;
        };
        if let Some(old) = card.occupied.take() {
            self.grid.vacate(old);
        }
        let cell = card.cell();
        card.position = cell.origin();
        card.occupied = Some(cell);
        self.grid.occupy(cell)
    }

    /// Release a card's cell, if it holds one.
    pub fn unposition(&mut self, id: CardId) {
        if let Some(card) = self.cards.get_mut(&id) {
            if let Some(old) = card.occupied.take() {
                self.grid.vacate(old);
            }
        }
    }

    /// Place a card in `cell`, moving its occupancy there.
    pub fn reposition(&mut self, id: CardId, cell: CellKey) -> bool {
        self.unposition(id);
        self.set_position(id, cell.origin());
        self.snap(id)
    }

    /// Whether the card shares its cell with another snapped card.
    pub fn is_stacked(&self, id: CardId) -> bool {
        self.cards
            .get(&id)
            .and_then(|card| card.occupied)
            .is_some_and(|cell| self.grid.is_stacked(cell))
    }

    /// Forget all occupancy and mark every card unsnapped.
    pub fn clear_grid(&mut self) {
        self.grid.clear();
        for card in self.cards.values_mut() {
            card.occupied = None;
        }
    }

    pub fn selected_ids(&self) -> Vec<CardId> {
        self.iter().filter(|c| c.selected).map(|c| c.id).collect()
    }

    /// Peer identifiers of the selected cards.
    pub fn selected_identifiers(&self) -> Vec<String> {
        self.iter()
            .filter(|c| c.selected)
            .map(Card::identifier)
            .collect()
    }

    pub fn set_selected(&mut self, id: CardId, selected: bool) {
        if let Some(card) = self.cards.get_mut(&id) {
            card.selected = selected;
        }
    }

    /// Deselect everything. Returns the number of cards that changed.
    pub fn clear_selection(&mut self) -> usize {
        let mut changed = 0;
        for card in self.cards.values_mut().filter(|c| c.selected) {
            card.selected = false;
            changed += 1;
        }
        changed
    }

    /// Find a card by its peer identifier. Elements win over notes.
    pub fn find_by_identifier(&self, identifier: &str) -> Option<CardId> {
        self.iter()
            .find(|card| card.identifier() == identifier)
            .map(|card| card.id)
    }

    /// Find a note by exact world position and content.
    pub fn find_note(&self, at: Point, content: &str) -> Option<CardId> {
        self.notes()
            .find(|note| {
                (note.position.x - at.x).abs() < POSITION_EPSILON
                    && (note.position.y - at.y).abs() < POSITION_EPSILON
                    && note.note_content() == Some(content)
            })
            .map(|note| note.id)
    }

    /// Replace a note's text. Returns the previous text.
    pub fn set_note_content(&mut self, id: CardId, text: impl Into<String>) -> Option<String> {
        match &mut self.cards.get_mut(&id)?.kind {
            CardKind::Note { content } => Some(std::mem::replace(content, text.into())),
            CardKind::Element(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(symbols: &[&str]) -> (CardStore, Vec<CardId>) {
        let mut store = CardStore::new();
        let ids = symbols
            .iter()
            .map(|s| store.add_element(ElementRecord::new(*s, *s)))
            .collect();
        (store, ids)
    }

    #[test]
    fn test_snap_rounds_and_occupies() {
        let (mut store, ids) = store_with(&["H"]);
        store.set_position(ids[0], Point::new(160.0, 290.0));
        assert!(!store.snap(ids[0]));
        let card = store.get(ids[0]).unwrap();
        assert_eq!(card.position, Point::new(150.0, 300.0));
        assert!(card.is_snapped());
        assert_eq!(store.grid().count(CellKey::new(1, 2)), 1);
    }

    #[test]
    fn test_stacking_is_shared_by_all_occupants() {
        let (mut store, ids) = store_with(&["H", "He", "Li"]);
        store.reposition(ids[0], CellKey::new(0, 0));
        assert!(store.reposition(ids[1], CellKey::new(0, 0)));
        store.reposition(ids[2], CellKey::new(1, 0));
        assert!(store.is_stacked(ids[0]));
        assert!(store.is_stacked(ids[1]));
        assert!(!store.is_stacked(ids[2]));

        store.reposition(ids[1], CellKey::new(2, 0));
        assert!(!store.is_stacked(ids[0]));
        assert_eq!(store.grid().count(CellKey::new(0, 0)), 1);
    }

    #[test]
    fn test_reposition_twice_keeps_single_count() {
        let (mut store, ids) = store_with(&["H"]);
        store.reposition(ids[0], CellKey::new(3, 3));
        store.reposition(ids[0], CellKey::new(3, 3));
        assert_eq!(store.grid().count(CellKey::new(3, 3)), 1);
        assert_eq!(store.grid().total(), 1);
    }

    #[test]
    fn test_card_at_prefers_topmost() {
        let (mut store, ids) = store_with(&["H", "He"]);
        store.reposition(ids[0], CellKey::new(0, 0));
        store.reposition(ids[1], CellKey::new(0, 0));
        let point = Point::new(10.0, 10.0);
        assert_eq!(store.card_at(point), Some(ids[1]));
        store.bring_to_front(ids[0]);
        assert_eq!(store.card_at(point), Some(ids[0]));
        assert_eq!(store.card_at(Point::new(-10.0, 10.0)), None);
    }

    #[test]
    fn test_hidden_cards_are_not_hit() {
        let mut store = CardStore::new();
        let mut record = ElementRecord::new("Xx", "Hidden");
        record.hidden = true;
        let id = store.add_element(record);
        assert!(store.get(id).unwrap().hidden);
        assert_eq!(store.card_at(Point::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_note_identifier_tracks_cell_and_content() {
        let mut store = CardStore::new();
        let id = store.add_note("hello");
        store.reposition(id, CellKey::new(2, 2));
        assert_eq!(store.get(id).unwrap().identifier(), "--2.2-hello");

        store.set_note_content(id, "bye");
        store.reposition(id, CellKey::new(-1, 4));
        assert_eq!(store.get(id).unwrap().identifier(), "---1.4-bye");
    }

    #[test]
    fn test_remove_note_releases_cell() {
        let mut store = CardStore::new();
        let id = store.add_note("x");
        store.reposition(id, CellKey::new(1, 1));
        assert!(store.remove_note(id).is_some());
        assert_eq!(store.grid().count(CellKey::new(1, 1)), 0);
        assert!(store.note_ids().is_empty());
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_elements_cannot_be_removed() {
        let (mut store, ids) = store_with(&["H"]);
        assert!(store.remove_note(ids[0]).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_note_by_position_and_content() {
        let mut store = CardStore::new();
        let a = store.add_note("same");
        let b = store.add_note("other");
        store.reposition(a, CellKey::new(1, 0));
        store.reposition(b, CellKey::new(1, 0));
        assert_eq!(store.find_note(Point::new(150.0, 0.0), "other"), Some(b));
        assert_eq!(store.find_note(Point::new(150.0, 0.0), "missing"), None);
    }

    #[test]
    fn test_selection_helpers() {
        let (mut store, ids) = store_with(&["H", "He", "Li"]);
        store.set_selected(ids[0], true);
        store.set_selected(ids[2], true);
        assert_eq!(store.selected_ids(), vec![ids[0], ids[2]]);
        assert_eq!(store.selected_identifiers(), vec!["H", "Li"]);
        assert_eq!(store.clear_selection(), 2);
        assert!(store.selected_ids().is_empty());
    }
}
