//! Input types shared by mouse, touch and keyboard handling.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// A physical contact: the single mouse pointer or one touch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactId {
    Mouse,
    Touch(i64),
}

impl ContactId {
    pub fn is_touch(self) -> bool {
        matches!(self, ContactId::Touch(_))
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A wheel/trackpad scroll event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelInput {
    pub position: Point,
    pub delta: Vec2,
    pub modifiers: Modifiers,
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        contact: ContactId,
        position: Point,
        modifiers: Modifiers,
    },
    Move {
        contact: ContactId,
        position: Point,
    },
    Up {
        contact: ContactId,
        position: Point,
    },
    Cancel {
        contact: ContactId,
    },
    Wheel(WheelInput),
}

/// Keys the board reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Backspace,
    Delete,
    Other,
}

impl Key {
    /// Map a DOM `keyCode`.
    pub fn from_key_code(code: u32) -> Self {
        match code {
            27 => Key::Escape,
            8 => Key::Backspace,
            46 => Key::Delete,
            _ => Key::Other,
        }
    }
}

/// Change in document-level pointer capture reported to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureChange {
    /// First contact began: attach document-level move/end listeners.
    Acquired,
    /// Last contact ended: detach them.
    Released,
}

/// Counts live contacts so global listeners are attached exactly once and
/// released when the last contact ends.
#[derive(Debug, Clone, Default)]
pub struct CaptureCounter {
    active: usize,
}

impl CaptureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contact. Returns `Acquired` for the first one.
    pub fn acquire(&mut self) -> Option<CaptureChange> {
        self.active += 1;
        (self.active == 1).then_some(CaptureChange::Acquired)
    }

    /// Unregister a contact. Returns `Released` when none remain.
    pub fn release(&mut self) -> Option<CaptureChange> {
        if self.active == 0 {
            return None;
        }
        self.active -= 1;
        (self.active == 0).then_some(CaptureChange::Released)
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn is_capturing(&self) -> bool {
        self.active > 0
    }
}
