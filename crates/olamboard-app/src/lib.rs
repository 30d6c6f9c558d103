//! OlamBoard Application
//!
//! Shells around the board engine: save-code tooling for the native
//! binary and WebAssembly bindings for the page.

pub mod cli;
pub mod session;
mod shortcuts;

pub use session::{BoardSession, SessionError, parse_catalog};
pub use shortcuts::{Shortcut, ShortcutRegistry};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebBoard;
