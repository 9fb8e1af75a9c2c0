//! Application loop.
//!
//! Owns the controller and is the only place it is mutated. Each iteration
//! waits for whichever comes first: an inlet command, a load result, or the
//! controller's next timer deadline. Then it fires due timers, forwards
//! controller events to the renderer and the status board, and refreshes the
//! snapshot the inlet server reads.

use crossbeam_channel::{Receiver, select};
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::command::Command;
use crate::core::{EventBus, ImageLoader, LoadOutcome, PlaybackController};
use crate::render::Renderer;
use crate::server::SharedState;
use crate::status::StatusBoard;

/// Longest wait when no timer is pending
const IDLE_WAIT: Duration = Duration::from_secs(1);

pub struct App<R: Renderer> {
    controller: PlaybackController,
    bus: EventBus,
    loader: ImageLoader,
    commands: Receiver<Command>,
    renderer: R,
    status: StatusBoard,
    shared: Arc<SharedState>,
}

impl<R: Renderer> App<R> {
    pub fn new(
        controller: PlaybackController,
        bus: EventBus,
        loader: ImageLoader,
        commands: Receiver<Command>,
        renderer: R,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            controller,
            bus,
            loader,
            commands,
            renderer,
            status: StatusBoard::new(),
            shared,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// First render after startup: one forward step over the rehydrated list.
    pub fn start(&mut self) {
        self.controller.advance(false);
        self.after_change();
    }

    /// Run until the command channel closes.
    pub fn run(&mut self) {
        self.start();
        info!("Slideshow running");
        while self.step(IDLE_WAIT) {}
        info!("Command channel closed, stopping");
    }

    /// One loop iteration, waiting at most `max_wait`.
    /// Returns false once the command channel is closed.
    pub fn step(&mut self, max_wait: Duration) -> bool {
        let now = Instant::now();
        let wait = self
            .controller
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(max_wait)
            .min(max_wait);

        let commands = self.commands.clone();
        let results = self.loader.results().clone();
        let mut open = true;
        select! {
            recv(commands) -> msg => match msg {
                Ok(cmd) => self.dispatch(cmd, Instant::now()),
                Err(_) => open = false,
            },
            recv(results) -> msg => {
                if let Ok(outcome) = msg {
                    self.on_loaded(outcome);
                }
            },
            default(wait) => {},
        }

        self.controller.tick(Instant::now());
        self.after_change();
        open
    }

    /// Single entry point for every command.
    pub fn dispatch(&mut self, cmd: Command, now: Instant) {
        debug!("Dispatch {:?}", cmd);
        match cmd {
            Command::AddImage(url) => {
                if self.controller.accepts_url(&url) {
                    self.loader.request(&url);
                } else {
                    debug!("Ignoring url {}", url);
                }
            }
            Command::Next => self.controller.advance(false),
            Command::Prev => self.controller.advance(true),
            Command::TogglePlayPause => {
                self.controller.toggle_play_pause(now);
            }
            Command::SetSpeed(value) => self.controller.set_speed(value, now),
            Command::Clear => self.controller.clear(),
            Command::Resize { width, height } => self.controller.resize(width, height),
        }
    }

    /// Commit a finished load if it is still the current request.
    pub fn on_loaded(&mut self, outcome: LoadOutcome) {
        if let Some((url, width, height)) = self.loader.accept(outcome) {
            self.controller.add_image(&url, width, height);
        }
    }

    fn after_change(&mut self) {
        for event in self.bus.poll() {
            self.renderer.handle(&event);
            self.status.update(&event);
        }
        self.status.flush();

        self.shared.set_snapshot(self.controller.snapshot());
        if self.controller.take_list_dirty() {
            self.shared.set_images(self.controller.images());
        }
    }
}
