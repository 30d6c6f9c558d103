//! Board options and boot parameters.

use crate::input::{ContactId, Modifiers};
use serde::{Deserialize, Serialize};

/// Data source used when none is given.
pub const DEFAULT_SOURCE: &str = "./olam";
/// Prefix shared by every key the board writes to local storage.
pub const STORAGE_PREFIX: &str = "[olamreee] savecode";

/// User-toggleable interaction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOptions {
    pub show_grid: bool,
    /// Cards can be dragged.
    pub drag: bool,
    /// Dropped cards snap to the grid.
    pub snap: bool,
    /// Selection boxes are available.
    pub multiple: bool,
    /// Touch contacts open selection boxes instead of dragging.
    pub multiple_touch: bool,
    /// Empty-space clicks may create notes.
    pub notes: bool,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            drag: true,
            snap: true,
            multiple: true,
            multiple_touch: false,
            notes: true,
        }
    }
}

impl BoardOptions {
    /// Whether a press by `contact` should open a selection box.
    pub fn select_mode(&self, contact: ContactId, modifiers: Modifiers) -> bool {
        self.multiple
            && match contact {
                ContactId::Mouse => modifiers.shift,
                ContactId::Touch(_) => self.multiple_touch,
            }
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.show_grid
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.snap = !self.snap;
        self.snap
    }

    pub fn toggle_notes(&mut self) -> bool {
        self.notes = !self.notes;
        self.notes
    }

    pub fn toggle_multiple_touch(&mut self) -> bool {
        self.multiple_touch = !self.multiple_touch;
        self.multiple_touch
    }
}

/// Parameters read from the page query string at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootParams {
    /// Path prefix of the element list and metadata documents.
    pub source: Option<String>,
    /// Custom storage slot name.
    pub key: Option<String>,
    /// Save code to load instead of the stored one.
    pub code: Option<String>,
    /// Collaboration room; presence enables multiplayer.
    pub room: Option<String>,
    /// Property shown on the cards initially.
    pub show: Option<String>,
    /// Encoded element overrides.
    pub overrides: Option<String>,
    /// Show hidden elements.
    pub show_all: bool,
    pub hide_show_bar: bool,
}

impl BootParams {
    /// Parse a query string such as `?room=abc&showAll`.
    ///
    /// Entries without `=` are flags. Values are taken verbatim.
    pub fn parse(query: &str) -> Self {
        let query = query.trim_start_matches(['?', '#']);
        let mut params = Self::default();
        for entry in query.split('&').filter(|e| !e.is_empty()) {
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (entry, None),
            };
            let text = value.filter(|v| !v.is_empty()).map(str::to_string);
            match key {
                "source" => params.source = text,
                "key" => params.key = text,
                "code" => params.code = text,
                "room" => params.room = text,
                "show" => params.show = text,
                "override" => params.overrides = text,
                "showAll" => params.show_all = true,
                "hideShowBar" => params.hide_show_bar = true,
                other => log::debug!("ignoring unknown boot parameter {other}"),
            }
        }
        params
    }

    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(DEFAULT_SOURCE)
    }

    /// Whether the default data set is loaded (enables legacy code fixes).
    pub fn is_default_source(&self) -> bool {
        self.source() == DEFAULT_SOURCE
    }

    /// Local storage key the save code lives under.
    pub fn storage_key(&self) -> String {
        match &self.key {
            Some(key) => format!("{STORAGE_PREFIX}.custom.{key}"),
            None => format!("{STORAGE_PREFIX}{}", self.source()),
        }
    }

    pub fn multiplayer(&self) -> bool {
        self.room.is_some()
    }

    /// Element list document path.
    pub fn elements_url(&self) -> String {
        format!("{}.json", self.source())
    }

    /// Metadata document path.
    pub fn metadata_url(&self) -> String {
        format!("{}-metadata.json", self.source())
    }

    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            options: BoardOptions::default(),
            source: self.source().to_string(),
            show_all: self.show_all,
        }
    }

    /// Rebuild a shareable query string.
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        let values = [
            ("source", &self.source),
            ("key", &self.key),
            ("code", &self.code),
            ("room", &self.room),
            ("show", &self.show),
            ("override", &self.overrides),
        ];
        for (name, value) in values {
            if let Some(value) = value {
                parts.push(format!("{name}={value}"));
            }
        }
        if self.show_all {
            parts.push("showAll".to_string());
        }
        if self.hide_show_bar {
            parts.push("hideShowBar".to_string());
        }
        format!("?{}", parts.join("&"))
    }
}

/// Everything a board needs besides the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub options: BoardOptions,
    pub source: String,
    pub show_all: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            options: BoardOptions::default(),
            source: DEFAULT_SOURCE.to_string(),
            show_all: false,
        }
    }
}

impl BoardConfig {
    pub fn is_default_source(&self) -> bool {
        self.source == DEFAULT_SOURCE
    }
}
