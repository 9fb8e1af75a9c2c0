//! Events emitted by the playback controller.

use super::image_entry::{ImageEntry, Placement};

#[derive(Clone, Debug, PartialEq)]
pub enum SlideEvent {
    /// Crossfade to `index`, fading out whatever `previous_index` showed
    Display {
        index: usize,
        previous_index: usize,
        entry: ImageEntry,
        placement: Option<Placement>,
    },
    /// Viewport changed, move the image on screen without a transition
    Layout { index: usize, placement: Placement },
    /// List is empty, remove everything from screen
    DisplayNothing,
    /// Image list changed (urls in display order)
    ListChanged(Vec<String>),
    PlaybackChanged { playing: bool },
    SpeedChanged { speed: i64, interval_ms: u64 },
}
