//! UI-side state for the karaoke editor: message handling, the engine bridge
//! and render models for the overlay and timeline widgets.

pub mod app;
pub mod bridge;
pub mod widgets;

pub use app::{AppState, Message, StyleEdit};
pub use bridge::{BridgeError, EngineBridge, spawn_engine_bridge, spawn_threaded_bridge};
