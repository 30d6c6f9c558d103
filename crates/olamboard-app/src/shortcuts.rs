//! Keyboard and pointer shortcut registry and documentation.

/// A shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Click").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Drag", false, false, "Move a card (and the selection with it)"),
            Shortcut::new("Drag", false, true, "Select cards in a box"),
            Shortcut::new("Click", false, true, "Toggle a card's selection"),
            Shortcut::new("Click", true, false, "Add a note"),
            Shortcut::new("Wheel", true, false, "Zoom"),
            Shortcut::new("Wheel", false, true, "Scroll sideways"),
            Shortcut::new("Delete", false, false, "Delete selected notes"),
            Shortcut::new("Backspace", false, false, "Delete selected notes"),
            Shortcut::new("Escape", false, false, "Close the open panel"),
        ]
    }

    /// Render all shortcuts as a table.
    pub fn render() -> String {
        let mut out = String::from("=== Shortcuts ===\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }
}
