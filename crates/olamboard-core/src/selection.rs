//! Rubber-band selection box.

use crate::camera::Camera;
use crate::cards::{CardId, CardStore};
use crate::drag::{DRAG_DISTANCE, compare_distance};
use crate::grid::CELL_SIZE;
use kurbo::{Point, Rect};
use std::cmp::Ordering;

/// What releasing a selection box did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The click target's selection was flipped.
    Toggled(CardId),
    /// A click on empty space cleared the selection.
    Cleared,
    /// A dragged box changed this many cards.
    Applied(usize),
}

/// A selection box held by one contact.
///
/// The anchor is kept in world coordinates so panning or zooming while the
/// box is open does not move its fixed corner.
#[derive(Debug, Clone)]
pub struct SelectionBox {
    anchor: Point,
    current: Point,
    click_target: Option<CardId>,
    set_to: bool,
    dragging: bool,
    last_screen: Point,
}

impl SelectionBox {
    /// Open a box at `screen`. `click_target` is the card pressed, if any;
    /// `set_to` is the selection state the box applies.
    pub fn new(camera: &Camera, screen: Point, click_target: Option<CardId>, set_to: bool) -> Self {
        let anchor = camera.to_world(screen);
        Self {
            anchor,
            current: anchor,
            click_target,
            set_to,
            dragging: false,
            last_screen: screen,
        }
    }

    /// Open a box on a card, applying the opposite of its current selection.
    pub fn on_card(camera: &Camera, screen: Point, cards: &CardStore, card: CardId) -> Self {
        let selected = cards.get(card).is_some_and(|c| c.selected);
        Self::new(camera, screen, Some(card), !selected)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn click_target(&self) -> Option<CardId> {
        self.click_target
    }

    pub fn set_to(&self) -> bool {
        self.set_to
    }

    /// Last screen position reported for this contact.
    pub fn last_screen(&self) -> Point {
        self.last_screen
    }

    /// Feed a contact position. Returns true once the box is being dragged.
    pub fn update(&mut self, camera: &Camera, screen: Point) -> bool {
        self.last_screen = screen;
        let world = camera.to_world(screen);
        if !self.dragging {
            if compare_distance(self.anchor - world, DRAG_DISTANCE) != Ordering::Greater {
                return false;
            }
            self.dragging = true;
        }
        self.current = world;
        true
    }

    /// The box in world coordinates.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.anchor, self.current)
    }

    /// The box grown outward to whole cells.
    pub fn cell_rect(&self) -> Rect {
        let r = self.rect();
        Rect::new(
            (r.x0 / CELL_SIZE).floor() * CELL_SIZE,
            (r.y0 / CELL_SIZE).floor() * CELL_SIZE,
            (r.x1 / CELL_SIZE).ceil() * CELL_SIZE,
            (r.y1 / CELL_SIZE).ceil() * CELL_SIZE,
        )
    }

    /// Size readout in cells, e.g. `"3 by 2"`. `None` until dragging.
    pub fn status_text(&self) -> Option<String> {
        if !self.dragging {
            return None;
        }
        let cells = self.cell_rect();
        let width = ((cells.x1 - cells.x0) / CELL_SIZE).round() as i64;
        let height = ((cells.y1 - cells.y0) / CELL_SIZE).round() as i64;
        Some(format!("{width} by {height}"))
    }

    /// Release the box and apply it.
    pub fn finish(self, cards: &mut CardStore) -> SelectionOutcome {
        if !self.dragging {
            return match self.click_target {
                Some(id) => {
                    let selected = cards.get(id).is_some_and(|c| c.selected);
                    cards.set_selected(id, !selected);
                    SelectionOutcome::Toggled(id)
                }
                None => {
                    cards.clear_selection();
                    SelectionOutcome::Cleared
                }
            };
        }

        let bounds = self.cell_rect();
        let set_to = self.set_to;
        let targets: Vec<CardId> = cards
            .iter()
            .filter(|card| {
                !card.hidden
                    && card.selected != set_to
                    && card.position.x >= bounds.x0
                    && card.position.y >= bounds.y0
                    && card.position.x < bounds.x1
                    && card.position.y < bounds.y1
            })
            .map(|card| card.id)
            .collect();
        for id in &targets {
            cards.set_selected(*id, set_to);
        }
        log::debug!("selection box {} {} cards", if set_to { "selected" } else { "deselected" }, targets.len());
        SelectionOutcome::Applied(targets.len())
    }
}
