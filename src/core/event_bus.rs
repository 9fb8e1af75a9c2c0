//! Event queue between the controller and the application loop.
//!
//! Architecture:
//! - The controller holds an [`EventEmitter`] and pushes events as state changes
//! - The loop calls poll() after each step and routes events to the renderer
//!   and the status board in emission order
//!
//! The queue is bounded: when full, the oldest half is evicted.

use log::warn;
use std::sync::{Arc, Mutex};

use super::events::SlideEvent;

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Bounded event queue, drained by the application loop.
#[derive(Clone)]
pub struct EventBus {
    queue: Arc<Mutex<Vec<SlideEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn emit(&self, event: SlideEvent) {
        push_bounded(&self.queue, event);
    }

    /// Drain all queued events.
    pub fn poll(&self) -> Vec<SlideEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Emitter handle for the controller.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Lightweight emitter handle, cheap to clone.
#[derive(Clone)]
pub struct EventEmitter {
    queue: Arc<Mutex<Vec<SlideEvent>>>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    pub fn emit(&self, event: SlideEvent) {
        push_bounded(&self.queue, event);
    }
}

fn push_bounded(queue: &Mutex<Vec<SlideEvent>>, event: SlideEvent) {
    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= MAX_QUEUE_SIZE {
        let evict_count = queue.len() / 2;
        warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
        queue.drain(0..evict_count);
    }
    queue.push(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_queues_for_poll() {
        let bus = EventBus::new();
        let emitter = bus.emitter();
        emitter.emit(SlideEvent::DisplayNothing);
        emitter.emit(SlideEvent::PlaybackChanged { playing: false });

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SlideEvent::DisplayNothing);
        assert!(bus.poll().is_empty());
    }

    #[test]
    fn test_queue_eviction_keeps_newest() {
        let bus = EventBus::new();
        for _ in 0..MAX_QUEUE_SIZE {
            bus.emit(SlideEvent::DisplayNothing);
        }
        bus.emit(SlideEvent::PlaybackChanged { playing: true });

        let events = bus.poll();
        assert_eq!(events.len(), MAX_QUEUE_SIZE / 2 + 1);
        assert_eq!(events.last(), Some(&SlideEvent::PlaybackChanged { playing: true }));
    }
}
