//! Render boundary.
//!
//! The controller only says *what* should be on screen; a [`Renderer`] owns the
//! crossfade and the lifetime of what is drawn. [`LogRenderer`] is the headless
//! renderer used by the binary: it tracks the visible layer stack the way a
//! crossfading surface would and logs every transition.

use log::{debug, info};

use crate::core::{ImageEntry, Placement, SlideEvent};

/// Crossfade duration (ms) handed to renderers
pub const CROSSFADE_MS: u64 = 2000;

pub trait Renderer {
    /// Fade `entry` in on top of what is shown, then drop the old layer.
    fn show(&mut self, index: usize, entry: &ImageEntry, placement: Option<Placement>);
    /// Move the current layer without a transition.
    fn relayout(&mut self, index: usize, placement: Placement);
    /// Remove everything.
    fn clear(&mut self);

    /// Route a controller event to the matching call. Other events are ignored.
    fn handle(&mut self, event: &SlideEvent) {
        match event {
            SlideEvent::Display { index, entry, placement, .. } => self.show(*index, entry, *placement),
            SlideEvent::Layout { index, placement } => self.relayout(*index, *placement),
            SlideEvent::DisplayNothing => self.clear(),
            _ => {}
        }
    }
}

/// A drawn layer
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub index: usize,
    pub url: String,
    pub placement: Option<Placement>,
}

/// Headless renderer: keeps the current layer and logs transitions.
#[derive(Debug, Default)]
pub struct LogRenderer {
    current: Option<Layer>,
    transitions: usize,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Layer> {
        self.current.as_ref()
    }

    /// Number of crossfades performed
    pub fn transitions(&self) -> usize {
        self.transitions
    }
}

impl Renderer for LogRenderer {
    fn show(&mut self, index: usize, entry: &ImageEntry, placement: Option<Placement>) {
        let from = self.current.as_ref().map(|l| l.index);
        match placement {
            Some(p) => info!(
                "Display image #{} {} at ({}, {}) {}x{} (from {:?}, {}ms fade)",
                index, entry.url, p.x, p.y, p.width, p.height, from, CROSSFADE_MS
            ),
            None => info!("Display image #{} {} (from {:?})", index, entry.url, from),
        }
        self.current = Some(Layer {
            index,
            url: entry.url.clone(),
            placement,
        });
        self.transitions += 1;
    }

    fn relayout(&mut self, index: usize, placement: Placement) {
        if let Some(layer) = self.current.as_mut().filter(|l| l.index == index) {
            debug!("Relayout image #{} to {:?}", index, placement);
            layer.placement = Some(placement);
        }
    }

    fn clear(&mut self) {
        if self.current.take().is_some() {
            info!("Display cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> ImageEntry {
        ImageEntry::new(url, 10, 10)
    }

    #[test]
    fn test_show_replaces_layer() {
        let mut r = LogRenderer::new();
        r.show(0, &entry("http://a.com/0.png"), None);
        r.show(1, &entry("http://a.com/1.png"), None);
        assert_eq!(r.current().unwrap().index, 1);
        assert_eq!(r.transitions(), 2);
    }

    #[test]
    fn test_handle_routes_events() {
        let mut r = LogRenderer::new();
        let placement = Placement { x: 0, y: -10, width: 100, height: 120 };
        r.handle(&SlideEvent::Display {
            index: 2,
            previous_index: 1,
            entry: entry("http://a.com/2.png"),
            placement: None,
        });
        r.handle(&SlideEvent::Layout { index: 2, placement });
        assert_eq!(r.current().unwrap().placement, Some(placement));

        r.handle(&SlideEvent::PlaybackChanged { playing: true });
        assert!(r.current().is_some());
        r.handle(&SlideEvent::DisplayNothing);
        assert!(r.current().is_none());
    }

    #[test]
    fn test_relayout_other_index_ignored() {
        let mut r = LogRenderer::new();
        r.show(0, &entry("http://a.com/0.png"), None);
        r.relayout(3, Placement { x: 1, y: 1, width: 1, height: 1 });
        assert_eq!(r.current().unwrap().placement, None);
    }
}
