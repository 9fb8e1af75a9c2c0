//! Messaging inlet server.
//!
//! # Purpose
//!
//! Receives inlet messages from the messaging bridge (or any HTTP client),
//! turns them into typed [`Command`](crate::command::Command)s and hands them
//! to the application loop. Also serves read-only state for monitoring.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐   crossbeam channel   ┌──────────────────────┐
//! │   Inlet Server Thread   │  ───── Command ────▶  │   Application Loop   │
//! │   (rouille HTTP)        │                       │   (controller owner) │
//! │                         │                       │                      │
//! │  POST /inlet/next       │  ──▶ Command::Next    │  controller.advance  │
//! │  POST /inlet/speed      │  ──▶ SetSpeed(n)      │  controller.set_speed│
//! └─────────────────────────┘                       └──────────────────────┘
//!          │                                                 │
//!          │  Arc<SharedState>                               │
//!          │◀──────────── read snapshots ────────────────────│
//!          │                                   updated after every change
//! ```
//!
//! # Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | POST   | `/inlet/{name}`   | Deliver a payload to a named inlet   |
//! | POST   | `/api/message`    | Pub/sub envelope (`{"message": ..}`) |
//! | POST   | `/api/clear`      | Clear the slideshow                  |
//! | POST   | `/api/viewport`   | Viewport resize (`{width, height}`)  |
//! | GET    | `/api/inlets`     | Inlet names and types                |
//! | GET    | `/api/status`     | Playback snapshot                    |
//! | GET    | `/api/images`     | Image list                           |
//! | GET    | `/api/health`     | Health check                         |

mod api;

pub use api::{InletServer, SharedState};
