//! Core engine - controller, timers, events, loading, persistence
//!
//! These modules form the slideshow engine, independent of the inlet and renderer.

pub mod controller;
pub mod event_bus;
pub mod events;
pub mod image_entry;
pub mod loader;
pub mod mapping;
pub mod store;
pub mod timer;
pub mod workers;

// Re-exports for convenience
pub use controller::{ControllerSettings, Phase, PlaybackController, Snapshot};
pub use event_bus::{EventBus, EventEmitter};
pub use events::SlideEvent;
pub use image_entry::{ImageEntry, Placement, Viewport};
pub use loader::{ImageLoader, LoadOutcome};
pub use store::{JsonFileStore, ListStore, MemoryStore};
pub use workers::Workers;
