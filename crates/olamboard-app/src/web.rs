//! WebAssembly bindings for the board page.
//!
//! The page owns the DOM. It forwards pointer, wheel and key input here,
//! relays peer messages, and redraws from [`WebBoard::view_json`].

use crate::session::BoardSession;
use kurbo::{Point, Vec2};
use olamboard_core::storage::{PlatformStorage, create_default_storage};
use olamboard_core::{
    BoardEvent, BootParams, CaptureChange, ContactId, Key, LayoutRng, Modifiers, PointerEvent,
    WheelInput,
};
use serde_json::json;
use wasm_bindgen::prelude::*;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Negative ids are the mouse; anything else is a touch identifier.
fn contact(id: i32) -> ContactId {
    if id < 0 {
        ContactId::Mouse
    } else {
        ContactId::Touch(i64::from(id))
    }
}

/// 0: no change, 1: attach document listeners, 2: detach them.
fn capture_code(change: Option<CaptureChange>) -> u8 {
    match change {
        None => 0,
        Some(CaptureChange::Acquired) => 1,
        Some(CaptureChange::Released) => 2,
    }
}

/// Set up logging and panic reporting.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger already set: {err}").into());
    }
    log::info!("Starting OlamBoard (WASM)");
}

fn page_query() -> String {
    web_sys::window()
        .and_then(|window| window.location().search().ok())
        .unwrap_or_default()
}

#[wasm_bindgen]
pub struct WebBoard {
    session: BoardSession<PlatformStorage>,
}

#[wasm_bindgen]
impl WebBoard {
    /// Boot a board from the two catalog documents. `query` defaults to the
    /// page's own query string.
    #[wasm_bindgen(constructor)]
    pub fn new(
        elements_json: &str,
        metadata_json: &str,
        query: Option<String>,
        viewport_height: f64,
    ) -> Result<WebBoard, JsValue> {
        let params = BootParams::parse(&query.unwrap_or_else(page_query));
        let catalog = crate::parse_catalog(elements_json, metadata_json).map_err(to_js)?;
        let storage = create_default_storage().map_err(to_js)?;
        let mut session =
            BoardSession::boot(catalog, params, storage, &mut LayoutRng::from_entropy())
                .map_err(to_js)?;
        session.board_mut().fit_viewport(viewport_height);
        Ok(Self { session })
    }

    pub fn pointer_down(
        &mut self,
        id: i32,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> u8 {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        self.pointer(PointerEvent::Down {
            contact: contact(id),
            position: Point::new(x, y),
            modifiers,
        })
    }

    pub fn pointer_move(&mut self, id: i32, x: f64, y: f64) {
        self.pointer(PointerEvent::Move {
            contact: contact(id),
            position: Point::new(x, y),
        });
    }

    pub fn pointer_up(&mut self, id: i32, x: f64, y: f64) -> u8 {
        self.pointer(PointerEvent::Up {
            contact: contact(id),
            position: Point::new(x, y),
        })
    }

    pub fn pointer_cancel(&mut self, id: i32) -> u8 {
        self.pointer(PointerEvent::Cancel { contact: contact(id) })
    }

    fn pointer(&mut self, event: PointerEvent) -> u8 {
        capture_code(self.session.board_mut().handle_pointer_event(event))
    }

    pub fn wheel(&mut self, x: f64, y: f64, dx: f64, dy: f64, shift: bool, ctrl: bool, meta: bool) {
        self.session.board_mut().wheel(&WheelInput {
            position: Point::new(x, y),
            delta: Vec2::new(dx, dy),
            modifiers: Modifiers { shift, ctrl, alt: false, meta },
        });
    }

    /// Handle a DOM `keyCode`. Returns true if the page should not process it.
    pub fn key_down(&mut self, key_code: u32) -> bool {
        self.session.board_mut().handle_key(Key::from_key_code(key_code))
    }

    /// Advance one animation frame. Returns true if the view moved.
    pub fn frame(&mut self) -> bool {
        self.session.frame()
    }

    /// Flush board events: peers get the shared ones, the page gets UI
    /// requests as a JSON array.
    pub fn pump(&mut self) -> String {
        let events = self.session.pump();
        let board = self.session.board();
        let requests: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                BoardEvent::ElementInfoRequested(id) => {
                    let (title, lines) = board.element_info(*id)?;
                    let lines: Vec<_> = lines.into_iter().map(|l| [l.label, l.value]).collect();
                    Some(json!({"kind": "element-info", "title": title, "lines": lines}))
                }
                BoardEvent::NoteEditorOpened(_) => Some(json!({
                    "kind": "note-editor",
                    "text": board.note_editor_text().unwrap_or_default(),
                })),
                BoardEvent::NoteEditorClosed => Some(json!({"kind": "note-editor-closed"})),
                _ => None,
            })
            .collect();
        serde_json::Value::Array(requests).to_string()
    }

    /// Camera, cards and selection boxes for drawing.
    pub fn view_json(&self) -> String {
        let board = self.session.board();
        let camera = board.camera();
        let cards: Vec<_> = board
            .cards()
            .z_ordered()
            .map(|card| {
                json!({
                    "identifier": card.identifier(),
                    "symbol": card.record().map(|r| r.symbol.as_str()),
                    "note": card.note_content(),
                    "x": card.position.x,
                    "y": card.position.y,
                    "selected": card.selected,
                    "dragged": card.dragged,
                    "hidden": card.hidden,
                    "stacked": board.cards().is_stacked(card.id),
                    "peers": board.peer_colors(card.id),
                })
            })
            .collect();
        let boxes: Vec<_> = board
            .selection_rects()
            .iter()
            .map(|r| [r.x0, r.y0, r.x1, r.y1])
            .collect();
        json!({
            "offset": [camera.offset.x, camera.offset.y],
            "scale": camera.scale,
            "showGrid": board.options().show_grid,
            "status": board.status_text(),
            "cards": cards,
            "boxes": boxes,
        })
        .to_string()
    }

    pub fn status_text(&self) -> String {
        self.session.board().status_text()
    }

    pub fn save_code(&self) -> String {
        self.session.board().save_code()
    }

    pub fn save_now(&mut self) -> Result<String, JsValue> {
        self.session.save_now().map_err(to_js)
    }

    /// Load a pasted code. Returns a capture code like the pointer handlers,
    /// since the load ends any gesture in progress.
    pub fn load_code(&mut self, code: &str) -> Result<u8, JsValue> {
        self.session.load_code(code).map_err(to_js)?;
        Ok(capture_code(self.session.take_capture_change()))
    }

    pub fn enable_autosave(&mut self) {
        self.session.enable_autosave();
    }

    pub fn edit_note(&mut self, text: &str) -> bool {
        self.session.board_mut().edit_note(text)
    }

    pub fn remove_note(&mut self) -> bool {
        self.session.board_mut().remove_note()
    }

    pub fn remove_selected_notes(&mut self) -> u32 {
        self.session.board_mut().remove_selected_notes() as u32
    }

    pub fn close_note_editor(&mut self) -> bool {
        self.session.board_mut().close_note_editor()
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.session.board_mut().toggle_grid()
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.session.board_mut().toggle_snap()
    }

    pub fn toggle_notes(&mut self) -> bool {
        self.session.board_mut().toggle_notes()
    }

    pub fn toggle_multiple_touch(&mut self) -> bool {
        self.session.board_mut().toggle_multiple_touch()
    }

    /// Apply a message from the relay and return a capture code. Errors are
    /// reported but the board keeps whatever part of the message applied.
    pub fn handle_peer_message(&mut self, json: &str) -> Result<u8, JsValue> {
        self.session.handle_peer_message(json).map_err(to_js)?;
        Ok(capture_code(self.session.take_capture_change()))
    }

    /// Messages to send to the relay.
    pub fn take_outgoing(&mut self) -> js_sys::Array {
        self.session
            .take_outgoing()
            .into_iter()
            .map(|message| JsValue::from_str(&message))
            .collect()
    }
}
