//! Status board: image list and playback status as text.
//!
//! Lines are rebuilt only when the list actually changed, then logged.

use log::info;

use crate::core::SlideEvent;

#[derive(Debug)]
pub struct StatusBoard {
    lines: Vec<String>,
    status: String,
    list_updated: bool,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            status: "Status: Paused".to_string(),
            list_updated: false,
        }
    }

    /// Rendered list lines (`image #i: url`)
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn update(&mut self, event: &SlideEvent) {
        match event {
            SlideEvent::ListChanged(urls) => {
                let lines: Vec<String> = urls
                    .iter()
                    .enumerate()
                    .map(|(i, url)| format!("image #{}: {}", i, url))
                    .collect();
                if lines != self.lines {
                    self.lines = lines;
                    self.list_updated = true;
                }
            }
            SlideEvent::PlaybackChanged { playing } => {
                self.status = if *playing { "Status: Playing" } else { "Status: Paused" }.to_string();
                info!("{}", self.status);
            }
            _ => {}
        }
    }

    /// Log the list if it changed since the last flush. Returns true if it did.
    pub fn flush(&mut self) -> bool {
        if !self.list_updated {
            return false;
        }
        self.list_updated = false;
        if self.lines.is_empty() {
            info!("Slideshow is empty");
        }
        for line in &self.lines {
            info!("{}", line);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_lines_and_flush() {
        let mut board = StatusBoard::new();
        assert!(!board.flush());

        board.update(&SlideEvent::ListChanged(vec!["http://a.com/1.png".into(), "http://b.com/2.png".into()]));
        assert_eq!(board.lines()[1], "image #1: http://b.com/2.png");
        assert!(board.flush());
        assert!(!board.flush());

        // Same list again is not an update
        board.update(&SlideEvent::ListChanged(vec!["http://a.com/1.png".into(), "http://b.com/2.png".into()]));
        assert!(!board.flush());
    }

    #[test]
    fn test_playback_status() {
        let mut board = StatusBoard::new();
        assert_eq!(board.status(), "Status: Paused");
        board.update(&SlideEvent::PlaybackChanged { playing: true });
        assert_eq!(board.status(), "Status: Playing");
    }
}
