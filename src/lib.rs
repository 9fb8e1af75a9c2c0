//! Slidebrew - pub/sub driven slideshow
//!
//! Re-exports all modules for use by the binary target.

// Core engine (controller, timers, events, loader, persistence)
pub mod core;

// App modules
pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod render;
pub mod server;
pub mod status;

// Re-export commonly used types from core
pub use core::event_bus::{EventBus, EventEmitter};
pub use core::{ImageEntry, PlaybackController, SlideEvent};

pub use app::App;
pub use command::{Command, Inlet};
