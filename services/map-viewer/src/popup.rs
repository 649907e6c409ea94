//! Feature-info popup state.

use serde::Serialize;

use crate::view::Pixel;

/// Header shown above the popup content.
pub const POPUP_HEADER: &str = "GetFeatureInfo";

/// Offset of the popup from the clicked pixel, both axes.
pub const DEFAULT_POPUP_OFFSET_PX: f64 = 12.0;

/// Keyboard input the viewer reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

impl Key {
    /// Map a DOM-style key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Popup position and raw HTML content.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PopupState {
    pub open: bool,
    pub x: f64,
    pub y: f64,
    pub html: String,
}

impl PopupState {
    /// Open at `anchor` shifted by `offset_px` on both axes.
    pub fn show(&mut self, anchor: Pixel, offset_px: f64, html: impl Into<String>) {
        let at = anchor.offset(offset_px, offset_px);
        self.open = true;
        self.x = at.x;
        self.y = at.y;
        self.html = html.into();
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Escape closes the popup. Returns true if a key closed it.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        if *key == Key::Escape && self.open {
            self.close();
            true
        } else {
            false
        }
    }
}
