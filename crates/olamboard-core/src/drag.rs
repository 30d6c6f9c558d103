//! Click/drag state machine shared by element and note cards.
//!
//! A session starts `Pending` when a contact lands on a card. It becomes
//! `Dragging` once the contact travels further than [`DRAG_DISTANCE`] from
//! where it started; releasing before that is a click. Offsets are stored in
//! grid units so a zoom in the middle of a drag keeps the card under the
//! contact.

use crate::camera::Camera;
use crate::cards::{CardId, CardStore};
use crate::events::MovedCard;
use crate::grid::CELL_SIZE;
use kurbo::{Point, Vec2};
use std::cmp::Ordering;

/// Screen distance a contact must exceed before a press becomes a drag.
pub const DRAG_DISTANCE: f64 = 4.0;

/// Compare the length of `delta` against `threshold` without a square root.
pub fn compare_distance(delta: Vec2, threshold: f64) -> Ordering {
    delta
        .hypot2()
        .partial_cmp(&(threshold * threshold))
        .unwrap_or(Ordering::Less)
}

/// Phase of a drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// Contact is down but has not moved far enough.
    Pending,
    /// Cards follow the contact.
    Dragging,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Released without dragging.
    Clicked(CardId),
    /// Cards were dragged and dropped.
    Dropped(Vec<MovedCard>),
}

#[derive(Debug, Clone)]
struct Companion {
    id: CardId,
    offset: Vec2,
}

/// A card (and any co-selected cards) held by one contact.
#[derive(Debug, Clone)]
pub struct DragSession {
    anchor: CardId,
    offset: Vec2,
    origin: Point,
    companions: Vec<Companion>,
    phase: DragPhase,
}

fn grid_offset(camera: &Camera, card_position: Point, screen: Point) -> Vec2 {
    (camera.to_world(screen) - card_position) / CELL_SIZE
}

impl DragSession {
    /// Start a session on `anchor`. Returns `None` if the card is missing or
    /// already held by another session.
    ///
    /// If the anchor is selected, every other free selected card joins the
    /// session and moves rigidly with it.
    pub fn begin(
        cards: &mut CardStore,
        camera: &Camera,
        anchor: CardId,
        screen: Point,
    ) -> Option<Self> {
        let card = cards.get(anchor)?;
        if card.engaged {
            log::debug!("ignoring second contact on busy card {}", card.identifier());
            return None;
        }
        let offset = grid_offset(camera, card.position, screen);
        let companions: Vec<Companion> = if card.selected {
            cards
                .iter()
                .filter(|c| c.selected && c.id != anchor && !c.engaged)
                .map(|c| Companion {
                    id: c.id,
                    offset: grid_offset(camera, c.position, screen),
                })
                .collect()
        } else {
            Vec::new()
        };

        let session = Self {
            anchor,
            offset,
            origin: screen,
            companions,
            phase: DragPhase::Pending,
        };
        for (id, _) in session.members() {
            if let Some(card) = cards.get_mut(id) {
                card.engaged = true;
            }
            cards.bring_to_front(id);
        }
        Some(session)
    }

    pub fn anchor(&self) -> CardId {
        self.anchor
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Ids of every card held by this session, anchor first.
    pub fn card_ids(&self) -> Vec<CardId> {
        self.members().map(|(id, _)| id).collect()
    }

    fn members(&self) -> impl Iterator<Item = (CardId, Vec2)> + '_ {
        std::iter::once((self.anchor, self.offset))
            .chain(self.companions.iter().map(|c| (c.id, c.offset)))
    }

    /// Feed a contact position. Returns true while the cards are following it.
    pub fn update(&mut self, cards: &mut CardStore, camera: &Camera, screen: Point) -> bool {
        if self.phase == DragPhase::Pending {
            if compare_distance(self.origin - screen, DRAG_DISTANCE) != Ordering::Greater {
                return false;
            }
            self.phase = DragPhase::Dragging;
            self.lift(cards);
        }
        let world = camera.to_world(screen);
        for (id, offset) in self.members() {
            cards.set_position(id, world - offset * CELL_SIZE);
        }
        true
    }

    /// Release the contact at `screen`.
    pub fn finish(
        mut self,
        cards: &mut CardStore,
        camera: &Camera,
        screen: Point,
        snap: bool,
    ) -> DragOutcome {
        self.update(cards, camera, screen);
        match self.phase {
            DragPhase::Pending => {
                self.disengage(cards);
                DragOutcome::Clicked(self.anchor)
            }
            DragPhase::Dragging => DragOutcome::Dropped(self.drop_all(cards, snap)),
        }
    }

    /// End the session without a click. Cards already moving are dropped
    /// where they are so no card is left out of the grid index.
    pub fn cancel(self, cards: &mut CardStore, snap: bool) -> Option<Vec<MovedCard>> {
        match self.phase {
            DragPhase::Pending => {
                self.disengage(cards);
                None
            }
            DragPhase::Dragging => Some(self.drop_all(cards, snap)),
        }
    }

    fn lift(&self, cards: &mut CardStore) {
        for (id, _) in self.members() {
            if let Some(card) = cards.get_mut(id) {
                card.last_identifier = Some(card.identifier());
                card.dragged = true;
            }
            cards.unposition(id);
        }
    }

    fn disengage(&self, cards: &mut CardStore) {
        for (id, _) in self.members() {
            if let Some(card) = cards.get_mut(id) {
                card.engaged = false;
            }
        }
    }

    fn drop_all(&self, cards: &mut CardStore, snap: bool) -> Vec<MovedCard> {
        let mut moved = Vec::with_capacity(self.companions.len() + 1);
        for (id, _) in self.members() {
            let Some(card) = cards.get_mut(id) else {
                // Removed while held (e.g. a peer deleted the note).
                continue;
            };
            card.dragged = false;
            card.engaged = false;
            if snap {
                cards.snap(id);
            } else {
                // A peer may have placed the card while it was held.
                cards.unposition(id);
            }
            if let Some(card) = cards.get(id) {
                moved.push(MovedCard {
                    identifier: card
                        .last_identifier
                        .clone()
                        .unwrap_or_else(|| card.identifier()),
                    cell: card.cell(),
                });
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ElementRecord;
    use crate::grid::CellKey;

    fn board(symbols: &[&str]) -> (CardStore, Vec<CardId>) {
        let mut cards = CardStore::new();
        let ids: Vec<CardId> = symbols
            .iter()
            .map(|s| cards.add_element(ElementRecord::new(*s, *s)))
            .collect();
        for (i, id) in ids.iter().enumerate() {
            cards.reposition(*id, CellKey::new(i as i64, 0));
        }
        (cards, ids)
    }

    #[test]
    fn test_compare_distance() {
        assert_eq!(compare_distance(Vec2::new(3.0, 0.0), 4.0), Ordering::Less);
        assert_eq!(compare_distance(Vec2::new(0.0, -4.0), 4.0), Ordering::Equal);
        assert_eq!(compare_distance(Vec2::new(3.0, 3.0), 4.0), Ordering::Greater);
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let (mut cards, ids) = board(&["H"]);
        let camera = Camera::new();
        let start = Point::new(20.0, 20.0);
        let mut session = DragSession::begin(&mut cards, &camera, ids[0], start).unwrap();

        assert!(!session.update(&mut cards, &camera, Point::new(22.0, 22.0)));
        let outcome = session.finish(&mut cards, &camera, Point::new(23.0, 20.0), true);

        assert_eq!(outcome, DragOutcome::Clicked(ids[0]));
        let card = cards.get(ids[0]).unwrap();
        assert_eq!(card.position, Point::ZERO);
        assert!(card.is_snapped() && !card.engaged && !card.dragged);
        assert_eq!(cards.grid().count(CellKey::new(0, 0)), 1);
    }

    #[test]
    fn test_exactly_threshold_is_still_a_click() {
        let (mut cards, ids) = board(&["H"]);
        let camera = Camera::new();
        let session = DragSession::begin(&mut cards, &camera, ids[0], Point::ZERO).unwrap();
        let outcome = session.finish(&mut cards, &camera, Point::new(4.0, 0.0), true);
        assert_eq!(outcome, DragOutcome::Clicked(ids[0]));
    }

    #[test]
    fn test_drag_past_threshold_never_clicks() {
        let (mut cards, ids) = board(&["H"]);
        let camera = Camera::new();
        let mut session =
            DragSession::begin(&mut cards, &camera, ids[0], Point::new(10.0, 10.0)).unwrap();

        assert!(session.update(&mut cards, &camera, Point::new(200.0, 10.0)));
        assert!(cards.get(ids[0]).unwrap().dragged);
        assert_eq!(cards.grid().total(), 0);

        // Coming back near the start does not turn it back into a click.
        let outcome = session.finish(&mut cards, &camera, Point::new(11.0, 10.0), true);
        match outcome {
            DragOutcome::Dropped(moved) => {
                assert_eq!(moved, vec![MovedCard { identifier: "H".into(), cell: CellKey::new(0, 0) }]);
            }
            other => panic!("expected drop, got {other:?}"),
        }
        assert_eq!(cards.grid().count(CellKey::new(0, 0)), 1);
    }

    #[test]
    fn test_drop_snaps_to_nearest_cell() {
        let (mut cards, ids) = board(&["H", "He"]);
        let camera = Camera::new();
        let session = DragSession::begin(&mut cards, &camera, ids[0], Point::new(10.0, 10.0)).unwrap();
        session.finish(&mut cards, &camera, Point::new(170.0, 20.0), true);

        let card = cards.get(ids[0]).unwrap();
        assert_eq!(card.position, Point::new(150.0, 0.0));
        assert!(cards.is_stacked(ids[0]));
        assert!(cards.is_stacked(ids[1]));
        assert_eq!(cards.grid().count(CellKey::new(0, 0)), 0);
        assert_eq!(cards.grid().count(CellKey::new(1, 0)), 2);
    }

    #[test]
    fn test_drop_without_snapping_keeps_pixel_position() {
        let (mut cards, ids) = board(&["H"]);
        let camera = Camera::new();
        let session = DragSession::begin(&mut cards, &camera, ids[0], Point::new(10.0, 10.0)).unwrap();
        session.finish(&mut cards, &camera, Point::new(47.0, 33.0), false);

        let card = cards.get(ids[0]).unwrap();
        assert_eq!(card.position, Point::new(37.0, 23.0));
        assert!(!card.is_snapped());
        assert_eq!(cards.grid().total(), 0);
    }

    #[test]
    fn test_offset_survives_zoom_mid_drag() {
        let (mut cards, ids) = board(&["H"]);
        let mut camera = Camera::new();
        let mut session =
            DragSession::begin(&mut cards, &camera, ids[0], Point::new(30.0, 60.0)).unwrap();
        session.update(&mut cards, &camera, Point::new(100.0, 60.0));

        camera.zoom_at(Point::new(100.0, 60.0), 2.0);
        session.update(&mut cards, &camera, Point::new(100.0, 60.0));

        // The grabbed point of the card stays under the contact.
        let card = cards.get(ids[0]).unwrap();
        let grabbed = card.position + Vec2::new(30.0, 60.0);
        let under = camera.to_world(Point::new(100.0, 60.0));
        assert!((grabbed.x - under.x).abs() < 1e-9);
        assert!((grabbed.y - under.y).abs() < 1e-9);
    }

    #[test]
    fn test_selected_cards_move_together() {
        let (mut cards, ids) = board(&["H", "He", "Li", "Be", "B"]);
        cards.set_selected(ids[1], true);
        cards.set_selected(ids[3], true);
        let camera = Camera::new();

        let start = Point::new(160.0, 10.0);
        let session = DragSession::begin(&mut cards, &camera, ids[1], start).unwrap();
        assert_eq!(session.card_ids(), vec![ids[1], ids[3]]);
        let end = start + Vec2::new(3.0 * CELL_SIZE, CELL_SIZE);
        let outcome = session.finish(&mut cards, &camera, end, true);

        let DragOutcome::Dropped(moved) = outcome else {
            panic!("expected a drop");
        };
        assert_eq!(moved.len(), 2);
        assert_eq!(cards.get(ids[1]).unwrap().cell(), CellKey::new(4, 1));
        assert_eq!(cards.get(ids[3]).unwrap().cell(), CellKey::new(6, 1));
        for (i, id) in [0usize, 2, 4].iter().map(|&i| (i, ids[i])) {
            assert_eq!(cards.get(id).unwrap().cell(), CellKey::new(i as i64, 0));
        }
    }

    #[test]
    fn test_unselected_anchor_moves_alone() {
        let (mut cards, ids) = board(&["H", "He"]);
        cards.set_selected(ids[1], true);
        let camera = Camera::new();
        let session = DragSession::begin(&mut cards, &camera, ids[0], Point::ZERO).unwrap();
        assert_eq!(session.card_ids(), vec![ids[0]]);
    }

    #[test]
    fn test_busy_card_rejects_second_session() {
        let (mut cards, ids) = board(&["H"]);
        let camera = Camera::new();
        let first = DragSession::begin(&mut cards, &camera, ids[0], Point::ZERO).unwrap();
        assert!(DragSession::begin(&mut cards, &camera, ids[0], Point::ZERO).is_none());

        first.finish(&mut cards, &camera, Point::ZERO, true);
        assert!(DragSession::begin(&mut cards, &camera, ids[0], Point::ZERO).is_some());
    }

    #[test]
    fn test_cancel_mid_drag_reoccupies() {
        let (mut cards, ids) = board(&["H"]);
        let camera = Camera::new();
        let mut session = DragSession::begin(&mut cards, &camera, ids[0], Point::ZERO).unwrap();
        session.update(&mut cards, &camera, Point::new(300.0, 0.0));
        assert_eq!(cards.grid().total(), 0);

        let moved = session.cancel(&mut cards, true).unwrap();
        assert_eq!(moved[0].cell, CellKey::new(2, 0));
        assert_eq!(cards.grid().count(CellKey::new(2, 0)), 1);
        assert!(!cards.get(ids[0]).unwrap().engaged);
    }

    #[test]
    fn test_moved_note_reports_pre_drag_identifier() {
        let mut cards = CardStore::new();
        let note = cards.add_note("hi");
        cards.reposition(note, CellKey::new(1, 1));
        let camera = Camera::new();
        let session =
            DragSession::begin(&mut cards, &camera, note, Point::new(160.0, 160.0)).unwrap();
        let DragOutcome::Dropped(moved) =
            session.finish(&mut cards, &camera, Point::new(460.0, 160.0), true)
        else {
            panic!("expected a drop");
        };
        assert_eq!(moved[0].identifier, "--1.1-hi");
        assert_eq!(moved[0].cell, CellKey::new(3, 1));
    }
}
