//! Routes pointer contacts to drags, selection boxes, pans and pinches.
//!
//! Each contact gets exactly one handler, chosen when it lands. The router
//! never mutates selection or notes on its own beyond what a finished
//! handler implies; higher-level consequences are reported as
//! [`GestureEffect`]s for the board to act on.

use crate::camera::{Camera, PanAnchor, PinchAnchor};
use crate::cards::{CardId, CardStore};
use crate::config::BoardOptions;
use crate::drag::{DRAG_DISTANCE, DragOutcome, DragSession, compare_distance};
use crate::events::MovedCard;
use crate::grid::CellKey;
use crate::input::{CaptureChange, CaptureCounter, ContactId, Modifiers};
use crate::selection::{SelectionBox, SelectionOutcome};
use kurbo::{Point, Rect, Vec2};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Mutable board state a gesture works on.
pub struct GestureContext<'a> {
    pub camera: &'a mut Camera,
    pub cards: &'a mut CardStore,
    pub options: &'a BoardOptions,
}

/// Something a gesture did that the board has to follow up on.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    Capture(CaptureChange),
    /// A card was pressed and released without dragging.
    CardClicked(CardId),
    CardsMoved(Vec<MovedCard>),
    /// The local selection changed.
    SelectionChanged,
    /// An empty-space click asked for a note in this cell.
    NoteRequested(CellKey),
}

/// Kind of handler bound to a contact, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Select,
    Pan,
    Pinch,
    Inert,
}

#[derive(Debug, Clone)]
struct PanGesture {
    anchor: PanAnchor,
    modifiers: Modifiers,
    moving: bool,
    last: Point,
    last_delta: Vec2,
}

impl PanGesture {
    fn new(camera: &Camera, screen: Point, modifiers: Modifiers) -> Self {
        Self {
            anchor: camera.pan_anchor(screen),
            modifiers,
            moving: false,
            last: screen,
            last_delta: Vec2::ZERO,
        }
    }

    fn update(&mut self, camera: &mut Camera, screen: Point) {
        if !self.moving {
            if compare_distance(self.anchor.screen - screen, DRAG_DISTANCE) != Ordering::Greater {
                return;
            }
            self.moving = true;
        }
        let delta = screen - self.last;
        if delta != Vec2::ZERO {
            self.last_delta = delta;
        }
        self.last = screen;
        camera.pan_from(&self.anchor, screen);
    }
}

#[derive(Debug, Clone)]
struct Pinch {
    anchor: PinchAnchor,
    contacts: [ContactId; 2],
    points: [Point; 2],
}

#[derive(Debug, Clone)]
enum Handler {
    Drag(DragSession),
    Select(SelectionBox),
    Pan(PanGesture),
    /// One half of the active pinch.
    Pinch,
    /// Left over from a pinch whose partner lifted; ignored until released.
    Inert,
}

impl Handler {
    fn kind(&self) -> GestureKind {
        match self {
            Handler::Drag(_) => GestureKind::Drag,
            Handler::Select(_) => GestureKind::Select,
            Handler::Pan(_) => GestureKind::Pan,
            Handler::Pinch => GestureKind::Pinch,
            Handler::Inert => GestureKind::Inert,
        }
    }

    fn last_screen(&self) -> Option<Point> {
        match self {
            Handler::Select(selection) => Some(selection.last_screen()),
            Handler::Pan(pan) => Some(pan.last),
            _ => None,
        }
    }
}

/// Per-contact gesture dispatcher.
#[derive(Debug, Default)]
pub struct GestureRouter {
    handlers: HashMap<ContactId, Handler>,
    /// Unpaired touch pan or free selection box a second touch may pair with.
    scroller: Option<ContactId>,
    pinch: Option<Pinch>,
    capture: CaptureCounter,
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of contacts with a live handler.
    pub fn active_contacts(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    pub fn kind_of(&self, contact: ContactId) -> Option<GestureKind> {
        self.handlers.get(&contact).map(Handler::kind)
    }

    /// Open selection boxes in world coordinates, snapped outward to cells.
    pub fn selection_rects(&self) -> Vec<Rect> {
        self.selection_boxes().map(SelectionBox::cell_rect).collect()
    }

    /// Size readout of the first dragged selection box, if any.
    pub fn status_text(&self) -> Option<String> {
        self.selection_boxes().find_map(SelectionBox::status_text)
    }

    fn selection_boxes(&self) -> impl Iterator<Item = &SelectionBox> + '_ {
        self.handlers.values().filter_map(|handler| match handler {
            Handler::Select(selection) if selection.is_dragging() => Some(selection),
            _ => None,
        })
    }

    /// A contact landed at `screen`.
    pub fn press(
        &mut self,
        ctx: &mut GestureContext<'_>,
        contact: ContactId,
        screen: Point,
        modifiers: Modifiers,
    ) -> Vec<GestureEffect> {
        if self.handlers.contains_key(&contact) {
            log::debug!("{contact:?} pressed twice, ignoring");
            return Vec::new();
        }
        if contact.is_touch() && self.pinch.is_some() {
            log::debug!("ignoring extra touch during pinch");
            return Vec::new();
        }

        let Some(handler) = self.choose_handler(ctx, contact, screen, modifiers) else {
            return Vec::new();
        };
        self.handlers.insert(contact, handler);

        let mut effects = Vec::new();
        if let Some(change) = self.capture.acquire() {
            effects.push(GestureEffect::Capture(change));
        }
        effects
    }

    fn choose_handler(
        &mut self,
        ctx: &mut GestureContext<'_>,
        contact: ContactId,
        screen: Point,
        modifiers: Modifiers,
    ) -> Option<Handler> {
        let select_mode = ctx.options.select_mode(contact, modifiers);
        let world = ctx.camera.to_world(screen);

        if let Some(card) = ctx.cards.card_at(world) {
            if select_mode {
                return Some(Handler::Select(SelectionBox::on_card(
                    ctx.camera, screen, ctx.cards, card,
                )));
            }
            if ctx.options.drag {
                // A busy card swallows the contact.
                return DragSession::begin(ctx.cards, ctx.camera, card, screen).map(Handler::Drag);
            }
        }

        if contact.is_touch() {
            if let Some(partner) = self.scroller {
                return self.pair(ctx.camera, partner, contact, screen);
            }
        }

        let handler = if select_mode {
            Handler::Select(SelectionBox::new(ctx.camera, screen, None, true))
        } else {
            ctx.camera.stop();
            Handler::Pan(PanGesture::new(ctx.camera, screen, modifiers))
        };
        if contact.is_touch() {
            self.scroller = Some(contact);
        }
        Some(handler)
    }

    /// Turn the scroller and a new touch into a pinch.
    fn pair(
        &mut self,
        camera: &mut Camera,
        partner: ContactId,
        contact: ContactId,
        screen: Point,
    ) -> Option<Handler> {
        let partner_handler = self.handlers.get_mut(&partner)?;
        let partner_point = partner_handler.last_screen()?;
        if let Handler::Select(_) = partner_handler {
            log::debug!("pinch cancels selection box on {partner:?}");
        }
        *partner_handler = Handler::Pinch;
        camera.stop();
        self.pinch = Some(Pinch {
            anchor: camera.pinch_anchor(screen, partner_point),
            contacts: [contact, partner],
            points: [screen, partner_point],
        });
        Some(Handler::Pinch)
    }

    /// A contact moved.
    pub fn move_to(&mut self, ctx: &mut GestureContext<'_>, contact: ContactId, screen: Point) {
        let Some(handler) = self.handlers.get_mut(&contact) else {
            return;
        };
        match handler {
            Handler::Drag(session) => {
                session.update(ctx.cards, ctx.camera, screen);
            }
            Handler::Select(selection) => {
                selection.update(ctx.camera, screen);
            }
            Handler::Pan(pan) => pan.update(ctx.camera, screen),
            Handler::Pinch => {
                if let Some(pinch) = &mut self.pinch {
                    if let Some(slot) = pinch.contacts.iter().position(|&c| c == contact) {
                        pinch.points[slot] = screen;
                    }
                    ctx.camera.pinch_to(&pinch.anchor, pinch.points[0], pinch.points[1]);
                }
            }
            Handler::Inert => {}
        }
    }

    /// A contact lifted at `screen`.
    pub fn release(
        &mut self,
        ctx: &mut GestureContext<'_>,
        contact: ContactId,
        screen: Point,
    ) -> Vec<GestureEffect> {
        self.move_to(ctx, contact, screen);
        let Some(handler) = self.handlers.remove(&contact) else {
            return Vec::new();
        };
        if self.scroller == Some(contact) {
            self.scroller = None;
        }

        let mut effects = Vec::new();
        match handler {
            Handler::Drag(session) => {
                match session.finish(ctx.cards, ctx.camera, screen, ctx.options.snap) {
                    DragOutcome::Clicked(id) => effects.push(GestureEffect::CardClicked(id)),
                    DragOutcome::Dropped(moved) if !moved.is_empty() => {
                        effects.push(GestureEffect::CardsMoved(moved));
                    }
                    DragOutcome::Dropped(_) => {}
                }
            }
            Handler::Select(selection) => match selection.finish(ctx.cards) {
                SelectionOutcome::Applied(0) => {}
                _ => effects.push(GestureEffect::SelectionChanged),
            },
            Handler::Pan(pan) => Self::finish_pan(ctx, contact, pan, &mut effects),
            Handler::Pinch => self.unpair(contact),
            Handler::Inert => {}
        }

        if let Some(change) = self.capture.release() {
            effects.push(GestureEffect::Capture(change));
        }
        effects
    }

    fn finish_pan(
        ctx: &mut GestureContext<'_>,
        contact: ContactId,
        pan: PanGesture,
        effects: &mut Vec<GestureEffect>,
    ) {
        if pan.moving {
            // The offset is in world units; dividing by scale keeps the fling
            // moving at the finger's last on-screen speed at any zoom.
            if contact.is_touch() && pan.last_delta != Vec2::ZERO {
                ctx.camera.set_velocity(-pan.last_delta / ctx.camera.scale);
            }
            return;
        }

        let cell = CellKey::containing(ctx.camera.to_world(pan.anchor.screen));
        match contact {
            ContactId::Mouse => {
                if ctx.options.notes && pan.modifiers.command() {
                    effects.push(GestureEffect::NoteRequested(cell));
                }
            }
            ContactId::Touch(_) => {
                if ctx.options.select_mode(contact, pan.modifiers) {
                    if ctx.cards.clear_selection() > 0 {
                        effects.push(GestureEffect::SelectionChanged);
                    }
                } else if ctx.options.notes {
                    effects.push(GestureEffect::NoteRequested(cell));
                }
            }
        }
    }

    /// End the pinch `contact` belonged to. The partner stays bound but inert.
    fn unpair(&mut self, contact: ContactId) {
        let Some(pinch) = self.pinch.take() else {
            return;
        };
        for partner in pinch.contacts.into_iter().filter(|&c| c != contact) {
            if let Some(handler) = self.handlers.get_mut(&partner) {
                *handler = Handler::Inert;
            }
            if self.scroller == Some(partner) {
                self.scroller = None;
            }
        }
    }

    /// Abort one contact's gesture. Drags in progress are dropped where they
    /// are; nothing else is applied.
    pub fn cancel(&mut self, ctx: &mut GestureContext<'_>, contact: ContactId) -> Vec<GestureEffect> {
        let Some(handler) = self.handlers.remove(&contact) else {
            return Vec::new();
        };
        if self.scroller == Some(contact) {
            self.scroller = None;
        }

        let mut effects = Vec::new();
        match handler {
            Handler::Drag(session) => {
                if let Some(moved) = session.cancel(ctx.cards, ctx.options.snap) {
                    if !moved.is_empty() {
                        effects.push(GestureEffect::CardsMoved(moved));
                    }
                }
            }
            Handler::Pinch => self.unpair(contact),
            Handler::Select(_) | Handler::Pan(_) | Handler::Inert => {}
        }

        if let Some(change) = self.capture.release() {
            effects.push(GestureEffect::Capture(change));
        }
        effects
    }

    /// Abort every live gesture.
    pub fn cancel_all(&mut self, ctx: &mut GestureContext<'_>) -> Vec<GestureEffect> {
        let contacts: Vec<ContactId> = self.handlers.keys().copied().collect();
        contacts
            .into_iter()
            .flat_map(|contact| self.cancel(ctx, contact))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ElementRecord;

    struct Fixture {
        camera: Camera,
        cards: CardStore,
        options: BoardOptions,
        router: GestureRouter,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                camera: Camera::new(),
                cards: CardStore::new(),
                options: BoardOptions::default(),
                router: GestureRouter::new(),
            }
        }

        fn element(&mut self, symbol: &str, cell: CellKey) -> CardId {
            let id = self.cards.add_element(ElementRecord::new(symbol, symbol));
            self.cards.reposition(id, cell);
            id
        }

        fn press(&mut self, contact: ContactId, x: f64, y: f64, modifiers: Modifiers) -> Vec<GestureEffect> {
            let mut ctx = GestureContext {
                camera: &mut self.camera,
                cards: &mut self.cards,
                options: &self.options,
            };
            self.router.press(&mut ctx, contact, Point::new(x, y), modifiers)
        }

        fn move_to(&mut self, contact: ContactId, x: f64, y: f64) {
            let mut ctx = GestureContext {
                camera: &mut self.camera,
                cards: &mut self.cards,
                options: &self.options,
            };
            self.router.move_to(&mut ctx, contact, Point::new(x, y));
        }

        fn release(&mut self, contact: ContactId, x: f64, y: f64) -> Vec<GestureEffect> {
            let mut ctx = GestureContext {
                camera: &mut self.camera,
                cards: &mut self.cards,
                options: &self.options,
            };
            self.router.release(&mut ctx, contact, Point::new(x, y))
        }

        fn cancel_all(&mut self) -> Vec<GestureEffect> {
            let mut ctx = GestureContext {
                camera: &mut self.camera,
                cards: &mut self.cards,
                options: &self.options,
            };
            self.router.cancel_all(&mut ctx)
        }
    }

    const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };
    const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false, meta: false };
    const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };

    #[test]
    fn test_press_on_card_starts_drag() {
        let mut f = Fixture::new();
        let h = f.element("H", CellKey::new(0, 0));
        let effects = f.press(ContactId::Mouse, 10.0, 10.0, NONE);
        assert_eq!(effects, vec![GestureEffect::Capture(CaptureChange::Acquired)]);
        assert_eq!(f.router.kind_of(ContactId::Mouse), Some(GestureKind::Drag));

        let effects = f.release(ContactId::Mouse, 11.0, 10.0);
        assert_eq!(
            effects,
            vec![
                GestureEffect::CardClicked(h),
                GestureEffect::Capture(CaptureChange::Released)
            ]
        );
        assert!(f.router.is_idle());
    }

    #[test]
    fn test_drag_reports_move() {
        let mut f = Fixture::new();
        f.element("H", CellKey::new(0, 0));
        f.press(ContactId::Mouse, 10.0, 10.0, NONE);
        f.move_to(ContactId::Mouse, 100.0, 10.0);
        f.move_to(ContactId::Mouse, 310.0, 10.0);
        let effects = f.release(ContactId::Mouse, 310.0, 10.0);
        assert_eq!(
            effects[0],
            GestureEffect::CardsMoved(vec![MovedCard {
                identifier: "H".to_string(),
                cell: CellKey::new(2, 0)
            }])
        );
    }

    #[test]
    fn test_shift_press_on_card_opens_selection_box() {
        let mut f = Fixture::new();
        let h = f.element("H", CellKey::new(0, 0));
        f.press(ContactId::Mouse, 10.0, 10.0, SHIFT);
        assert_eq!(f.router.kind_of(ContactId::Mouse), Some(GestureKind::Select));
        let effects = f.release(ContactId::Mouse, 10.0, 10.0);
        assert_eq!(effects[0], GestureEffect::SelectionChanged);
        assert!(f.cards.get(h).unwrap().selected);
    }

    #[test]
    fn test_shift_drag_on_empty_space_selects_cells() {
        let mut f = Fixture::new();
        let a = f.element("H", CellKey::new(1, 1));
        let b = f.element("He", CellKey::new(3, 1));
        f.press(ContactId::Mouse, 140.0, 140.0, SHIFT);
        f.move_to(ContactId::Mouse, 320.0, 200.0);
        assert_eq!(f.router.status_text().as_deref(), Some("3 by 2"));
        f.release(ContactId::Mouse, 320.0, 200.0);
        assert!(f.cards.get(a).unwrap().selected);
        assert!(!f.cards.get(b).unwrap().selected);
    }

    #[test]
    fn test_drag_disabled_falls_through_to_pan() {
        let mut f = Fixture::new();
        f.options.drag = false;
        f.element("H", CellKey::new(0, 0));
        f.press(ContactId::Mouse, 10.0, 10.0, NONE);
        assert_eq!(f.router.kind_of(ContactId::Mouse), Some(GestureKind::Pan));
        f.move_to(ContactId::Mouse, 60.0, 10.0);
        assert_eq!(f.camera.offset, Vec2::new(-50.0, 0.0));
    }

    #[test]
    fn test_busy_card_ignores_second_touch() {
        let mut f = Fixture::new();
        f.element("H", CellKey::new(0, 0));
        f.press(ContactId::Touch(1), 10.0, 10.0, NONE);
        let effects = f.press(ContactId::Touch(2), 20.0, 20.0, NONE);
        assert!(effects.is_empty());
        assert_eq!(f.router.active_contacts(), 1);
    }

    #[test]
    fn test_mouse_ctrl_click_requests_note() {
        let mut f = Fixture::new();
        f.camera.offset = Vec2::new(100.0, 0.0);
        f.press(ContactId::Mouse, 230.0, 310.0, CTRL);
        let effects = f.release(ContactId::Mouse, 230.0, 310.0);
        assert_eq!(effects[0], GestureEffect::NoteRequested(CellKey::new(2, 2)));
    }

    #[test]
    fn test_plain_mouse_click_does_nothing() {
        let mut f = Fixture::new();
        f.press(ContactId::Mouse, 230.0, 310.0, NONE);
        let effects = f.release(ContactId::Mouse, 230.0, 310.0);
        assert_eq!(effects, vec![GestureEffect::Capture(CaptureChange::Released)]);
    }

    #[test]
    fn test_touch_tap_requests_note_unless_notes_disabled() {
        let mut f = Fixture::new();
        f.press(ContactId::Touch(1), 10.0, 10.0, NONE);
        let effects = f.release(ContactId::Touch(1), 10.0, 10.0);
        assert_eq!(effects[0], GestureEffect::NoteRequested(CellKey::new(0, 0)));

        f.options.notes = false;
        f.press(ContactId::Touch(1), 10.0, 10.0, NONE);
        let effects = f.release(ContactId::Touch(1), 10.0, 10.0);
        assert_eq!(effects, vec![GestureEffect::Capture(CaptureChange::Released)]);
    }

    #[test]
    fn test_touch_select_mode_tap_clears_selection() {
        let mut f = Fixture::new();
        f.options.multiple_touch = true;
        let h = f.element("H", CellKey::new(3, 3));
        f.cards.set_selected(h, true);
        f.press(ContactId::Touch(1), 10.0, 10.0, NONE);
        assert_eq!(f.router.kind_of(ContactId::Touch(1)), Some(GestureKind::Select));
        let effects = f.release(ContactId::Touch(1), 10.0, 10.0);
        assert_eq!(effects[0], GestureEffect::SelectionChanged);
        assert!(!f.cards.get(h).unwrap().selected);
    }

    #[test]
    fn test_touch_pan_release_starts_inertia() {
        let mut f = Fixture::new();
        f.camera.scale = 2.0;
        f.press(ContactId::Touch(1), 100.0, 100.0, NONE);
        f.move_to(ContactId::Touch(1), 120.0, 100.0);
        f.move_to(ContactId::Touch(1), 140.0, 100.0);
        f.release(ContactId::Touch(1), 140.0, 100.0);
        assert!(f.camera.has_velocity);
        assert_eq!(f.camera.velocity, Vec2::new(-10.0, 0.0));

        // First frame carries the content 0.9 of the last 20px step on screen.
        let before = f.camera.to_screen(Point::ZERO);
        assert!(f.camera.tick());
        let after = f.camera.to_screen(Point::ZERO);
        assert!((after.x - before.x - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_mouse_pan_has_no_inertia() {
        let mut f = Fixture::new();
        f.press(ContactId::Mouse, 100.0, 100.0, NONE);
        f.move_to(ContactId::Mouse, 140.0, 100.0);
        f.release(ContactId::Mouse, 140.0, 100.0);
        assert!(!f.camera.has_velocity);
    }

    #[test]
    fn test_pinch_keeps_world_midpoint_fixed() {
        let mut f = Fixture::new();
        f.camera.offset = Vec2::new(30.0, -40.0);
        f.camera.scale = 0.5;
        f.press(ContactId::Touch(1), 100.0, 200.0, NONE);
        f.press(ContactId::Touch(2), 300.0, 200.0, NONE);
        assert!(f.router.is_pinching());
        let world_mid = f.camera.to_world(Point::new(200.0, 200.0));

        f.move_to(ContactId::Touch(1), 0.0, 200.0);
        f.move_to(ContactId::Touch(2), 400.0, 200.0);
        assert!((f.camera.scale - 1.0).abs() < 1e-9);
        let after = f.camera.to_world(Point::new(200.0, 200.0));
        assert!((after.x - world_mid.x).abs() < 1e-9);
        assert!((after.y - world_mid.y).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_cancels_free_selection_box() {
        let mut f = Fixture::new();
        f.options.multiple_touch = true;
        let h = f.element("H", CellKey::new(1, 1));
        f.press(ContactId::Touch(1), 0.0, 0.0, NONE);
        f.move_to(ContactId::Touch(1), 200.0, 200.0);
        f.press(ContactId::Touch(2), 400.0, 400.0, NONE);
        assert_eq!(f.router.kind_of(ContactId::Touch(1)), Some(GestureKind::Pinch));
        assert!(f.router.status_text().is_none());

        f.release(ContactId::Touch(1), 200.0, 200.0);
        assert!(!f.cards.get(h).unwrap().selected);
    }

    #[test]
    fn test_pinch_survivor_is_inert_and_third_touch_ignored() {
        let mut f = Fixture::new();
        f.press(ContactId::Touch(1), 100.0, 100.0, NONE);
        f.press(ContactId::Touch(2), 200.0, 100.0, NONE);
        assert!(f.press(ContactId::Touch(3), 50.0, 50.0, NONE).is_empty());
        assert_eq!(f.router.kind_of(ContactId::Touch(3)), None);

        f.release(ContactId::Touch(2), 200.0, 100.0);
        assert!(!f.router.is_pinching());
        assert_eq!(f.router.kind_of(ContactId::Touch(1)), Some(GestureKind::Inert));

        let before = f.camera.clone();
        f.move_to(ContactId::Touch(1), 400.0, 400.0);
        assert_eq!(f.camera, before);
        let effects = f.release(ContactId::Touch(1), 400.0, 400.0);
        assert_eq!(effects, vec![GestureEffect::Capture(CaptureChange::Released)]);
    }

    #[test]
    fn test_cancel_all_drops_dragged_card() {
        let mut f = Fixture::new();
        let h = f.element("H", CellKey::new(0, 0));
        f.press(ContactId::Touch(1), 10.0, 10.0, NONE);
        f.move_to(ContactId::Touch(1), 160.0, 10.0);
        let effects = f.cancel_all();
        assert_eq!(
            effects,
            vec![
                GestureEffect::CardsMoved(vec![MovedCard {
                    identifier: "H".to_string(),
                    cell: CellKey::new(1, 0)
                }]),
                GestureEffect::Capture(CaptureChange::Released),
            ]
        );
        assert!(f.cards.get(h).unwrap().is_snapped());
        assert_eq!(f.cards.grid().total(), 1);
        assert!(!f.router.is_capturing());
    }
}
