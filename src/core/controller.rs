//! Slideshow playback controller: image list, cursor and timers.
//!
//! **Architecture**: the controller owns the image list and playback state and
//! nothing else. It never touches the screen: every visible change goes out as
//! a [`SlideEvent`] through the event emitter, and the list is written through
//! a [`ListStore`] after every list mutation.
//!
//! # Cursor Model
//!
//! `step_count` accumulates +1/-1 per advance/reverse and is never wrapped.
//! The active index is derived: `abs(step_count) % len`. Reversing past zero
//! therefore walks the list forward again, exactly like advancing.
//!
//! # Phases
//!
//! - **Idle**: no images (play/pause is ignored)
//! - **Paused**: images, no recurring timer
//! - **Playing**: images, recurring timer advances every `interval_ms`
//!
//! # Timers
//!
//! Deadline based, see [`crate::core::timer`]. The application loop calls
//! `tick(now)` no later than `next_deadline()`.

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::event_bus::EventEmitter;
use super::events::SlideEvent;
use super::image_entry::{ImageEntry, Viewport, looks_like_url};
use super::mapping::{SPEED_HIGH, SPEED_LOW, speed_to_interval_ms};
use super::store::ListStore;
use super::timer::{Debouncer, IntervalTimer};

/// Default playback interval (5 s)
pub const DEFAULT_INTERVAL_MS: u64 = 5000;

/// Default speed control position
pub const DEFAULT_SPEED: i64 = 800;

/// Delay between the last speed input and the catch-up advance
pub const SPEED_DEBOUNCE_MS: u64 = 250;

/// Startup configuration for the controller
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub interval_ms: u64,
    pub speed: i64,
    pub viewport: Viewport,
    pub debounce_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            speed: DEFAULT_SPEED,
            viewport: Viewport::default(),
            debounce_ms: SPEED_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Paused,
    Playing,
}

/// Read-only copy of the playback state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub playing: bool,
    pub interval_ms: u64,
    pub speed: i64,
    pub active_index: Option<usize>,
    pub previous_index: usize,
    pub step_count: i64,
    pub image_count: usize,
    pub viewport: Viewport,
}

pub struct PlaybackController {
    images: Vec<ImageEntry>,
    step_count: i64,
    previous_index: usize,
    playing: bool,
    speed: i64,
    interval_ms: u64,
    viewport: Viewport,
    /// Url of the entry last sent to the renderer
    shown: Option<String>,
    list_dirty: bool,
    play_timer: IntervalTimer,
    speed_debounce: Debouncer,
    store: Box<dyn ListStore>,
    events: EventEmitter,
}

impl PlaybackController {
    /// Create the controller and rehydrate the list from `store`.
    pub fn new(settings: ControllerSettings, store: Box<dyn ListStore>, events: EventEmitter) -> Self {
        let images = store.load();
        let controller = Self {
            images,
            step_count: 0,
            previous_index: 0,
            playing: false,
            speed: settings.speed.clamp(SPEED_LOW, SPEED_HIGH),
            interval_ms: settings.interval_ms,
            viewport: settings.viewport,
            shown: None,
            list_dirty: true,
            play_timer: IntervalTimer::new(settings.interval_ms),
            speed_debounce: Debouncer::new(settings.debounce_ms),
            store,
            events,
        };
        info!(
            "Controller ready: {} image(s), interval {}ms",
            controller.images.len(),
            controller.interval_ms
        );
        if !controller.images.is_empty() {
            controller.emit_list();
        }
        controller
    }

    // === Accessors ===

    pub fn images(&self) -> &[ImageEntry] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// `abs(step_count) % len`, None while the list is empty
    pub fn active_index(&self) -> Option<usize> {
        if self.images.is_empty() {
            return None;
        }
        Some((self.step_count.unsigned_abs() % self.images.len() as u64) as usize)
    }

    pub fn active_entry(&self) -> Option<&ImageEntry> {
        self.active_index().map(|i| &self.images[i])
    }

    pub fn previous_index(&self) -> usize {
        self.previous_index
    }

    pub fn step_count(&self) -> i64 {
        self.step_count
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn speed(&self) -> i64 {
        self.speed
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn shown_url(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn phase(&self) -> Phase {
        if self.images.is_empty() {
            Phase::Idle
        } else if self.playing {
            Phase::Playing
        } else {
            Phase::Paused
        }
    }

    pub fn is_timer_active(&self) -> bool {
        self.play_timer.is_active()
    }

    pub fn is_debounce_pending(&self) -> bool {
        self.speed_debounce.is_pending()
    }

    /// True once after every list mutation (and after startup)
    pub fn take_list_dirty(&mut self) -> bool {
        std::mem::take(&mut self.list_dirty)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            playing: self.playing,
            interval_ms: self.interval_ms,
            speed: self.speed,
            active_index: self.active_index(),
            previous_index: self.previous_index,
            step_count: self.step_count,
            image_count: self.images.len(),
            viewport: self.viewport,
        }
    }

    // === List ===

    /// Some stored url starts with `url`
    pub fn is_duplicate(&self, url: &str) -> bool {
        self.images.iter().any(|e| e.url.starts_with(url))
    }

    /// Cheap pre-check before spending a load on `url`
    pub fn accepts_url(&self, url: &str) -> bool {
        looks_like_url(url) && !self.is_duplicate(url)
    }

    /// Append a loaded image. Returns false if the url or size is rejected.
    pub fn add_image(&mut self, url: &str, width: u32, height: u32) -> bool {
        if !looks_like_url(url) {
            debug!("Rejected malformed url: {}", url);
            return false;
        }
        if self.is_duplicate(url) {
            debug!("Rejected duplicate url: {}", url);
            return false;
        }
        if width == 0 || height == 0 {
            debug!("Rejected {}: zero size {}x{}", url, width, height);
            return false;
        }

        let entry = ImageEntry::new(url, width, height);
        info!("Added image #{}: {} ({}x{})", self.images.len(), url, width, height);
        self.images.push(entry);
        self.list_changed();

        // Show the active entry unless it is already on screen
        let active_url = self.active_entry().map(|e| e.url.clone());
        if active_url.is_some() && self.shown != active_url {
            self.display_active();
        }
        true
    }

    /// Drop every image and stop playback.
    pub fn clear(&mut self) {
        info!("Clearing {} image(s)", self.images.len());
        self.images.clear();
        self.speed_debounce.cancel();
        self.set_playing(false);
        self.list_changed();
        self.shown = None;
        self.events.emit(SlideEvent::DisplayNothing);
    }

    // === Playback ===

    /// Move the cursor one step (backwards if `reverse`) and display the result.
    pub fn advance(&mut self, reverse: bool) {
        match self.images.len() {
            0 => {
                trace!("advance: no image to display");
                self.shown = None;
                self.events.emit(SlideEvent::DisplayNothing);
            }
            1 => {
                // Only redraw when the single entry is not what is on screen
                if self.shown.as_deref() != Some(self.images[0].url.as_str()) {
                    debug!("advance: displaying the single image");
                    self.display_active();
                }
            }
            _ => {
                self.previous_index = self.active_index().unwrap_or(0);
                self.step_count += if reverse { -1 } else { 1 };
                self.display_active();
                debug!(
                    "advance: index {} -> {} (step {})",
                    self.previous_index,
                    self.active_index().unwrap_or(0),
                    self.step_count
                );
            }
        }
    }

    /// Flip play/pause. Starting playback advances immediately.
    /// Returns the new playing state.
    pub fn toggle_play_pause(&mut self, now: Instant) -> bool {
        if !self.playing && self.images.is_empty() {
            debug!("play ignored: no images");
            return false;
        }
        let playing = !self.playing;
        self.set_playing(playing);
        if playing {
            self.play_timer.start(now);
            self.advance(false);
        }
        playing
    }

    /// Set the speed control (clamped to 0..=1000) and derive the interval.
    /// A debounced advance follows so the new pace shows right away.
    pub fn set_speed(&mut self, raw: i64, now: Instant) {
        self.speed = raw.clamp(SPEED_LOW, SPEED_HIGH);
        self.interval_ms = speed_to_interval_ms(self.speed);
        self.play_timer.set_period(self.interval_ms, now);
        self.speed_debounce.schedule(now);

        info!("Speed {} -> interval {}ms", self.speed, self.interval_ms);
        self.events.emit(SlideEvent::SpeedChanged {
            speed: self.speed,
            interval_ms: self.interval_ms,
        });
    }

    /// New viewport size. Re-lays out the active entry only.
    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        if viewport.is_empty() {
            debug!("resize ignored: {}x{}", width, height);
            return;
        }
        self.viewport = viewport;

        let Some(index) = self.active_index() else {
            return;
        };
        let placement = self.images[index].layout(viewport);
        if let Some(placement) = placement {
            trace!("resize: image {} laid out at {:?}", index, placement);
            if self.shown.as_deref() == Some(self.images[index].url.as_str()) {
                self.events.emit(SlideEvent::Layout { index, placement });
            }
        }
    }

    /// Fire due timers. Returns true if anything advanced.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut advanced = false;
        if self.play_timer.tick(now) {
            trace!("play timer fired");
            self.advance(false);
            advanced = true;
        }
        if self.speed_debounce.tick(now) {
            trace!("speed debounce fired");
            self.advance(false);
            advanced = true;
        }
        advanced
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.play_timer.deadline(), self.speed_debounce.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // === Internals ===

    fn set_playing(&mut self, playing: bool) {
        if self.playing == playing {
            return;
        }
        self.playing = playing;
        if !playing {
            self.play_timer.stop();
        }
        info!("Status: {}", if playing { "Playing" } else { "Paused" });
        self.events.emit(SlideEvent::PlaybackChanged { playing });
    }

    fn display_active(&mut self) {
        let Some(index) = self.active_index() else {
            return;
        };
        let viewport = self.viewport;
        let entry = &mut self.images[index];
        let placement = entry.layout(viewport);
        let entry = entry.clone();

        self.shown = Some(entry.url.clone());
        self.events.emit(SlideEvent::Display {
            index,
            previous_index: self.previous_index,
            entry,
            placement,
        });
    }

    fn list_changed(&mut self) {
        self.list_dirty = true;
        if let Err(e) = self.store.save(&self.images) {
            warn!("Failed to save slideshow: {:#}", e);
        }
        self.emit_list();
    }

    fn emit_list(&self) {
        let urls = self.images.iter().map(|e| e.url.clone()).collect();
        self.events.emit(SlideEvent::ListChanged(urls));
    }
}
