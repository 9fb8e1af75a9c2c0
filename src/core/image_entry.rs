//! Image descriptors and viewport placement.
//!
//! `ImageEntry` is the unit stored in the slideshow list and persisted as-is.
//! Field names on disk keep the historical layout
//! (`width`/`height` native, `_width`/`_height` display).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimal URL syntax check: host-ish text with a 2-4 letter suffix, optional image path.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[-a-zA-Z0-9@:%_+.~#?&/=]{2,256}\.[a-z]{2,4}\b(/[-a-zA-Z0-9@:%_+.~#?&/=]*.[png|jpg|jpeg|gif])?",
    )
    .expect("url regex is valid")
});

/// Returns true if `url` passes the minimal syntax check.
pub fn looks_like_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

/// One slide: source url, native size and the size it was last laid out at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Native width
    pub width: u32,
    /// Native height
    pub height: u32,
    /// Display width (0 until laid out)
    #[serde(rename = "_width", default)]
    pub display_width: u32,
    /// Display height (0 until laid out)
    #[serde(rename = "_height", default)]
    pub display_height: u32,
    pub url: String,
}

impl ImageEntry {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            display_width: 0,
            display_height: 0,
            url: url.into(),
        }
    }

    /// Lay the entry out in the viewport and remember the display size.
    pub fn layout(&mut self, viewport: Viewport) -> Option<Placement> {
        let placement = fit(self.width, self.height, viewport)?;
        self.display_width = placement.width;
        self.display_height = placement.height;
        Some(placement)
    }
}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Where an image lands in the viewport (offsets may be negative: the image covers the viewport)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Fit an image into the viewport preserving aspect ratio.
///
/// Wider viewport than image: match widths and center vertically.
/// Otherwise match heights and center horizontally.
/// Returns None for zero-sized images or viewports.
pub fn fit(native_width: u32, native_height: u32, viewport: Viewport) -> Option<Placement> {
    if native_width == 0 || native_height == 0 || viewport.is_empty() {
        return None;
    }

    let vw = viewport.width as f64;
    let vh = viewport.height as f64;
    let viewport_ratio = vw / vh;
    let image_ratio = native_width as f64 / native_height as f64;

    if viewport_ratio >= image_ratio {
        let height = (vw / image_ratio).floor();
        Some(Placement {
            x: 0,
            y: ((vh - height) / 2.0).round() as i64,
            width: viewport.width,
            height: height as u32,
        })
    } else {
        let width = (vh * image_ratio).floor();
        Some(Placement {
            x: ((vw - width) / 2.0).round() as i64,
            y: 0,
            width: width as u32,
            height: viewport.height,
        })
    }
}
