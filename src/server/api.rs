//! Inlet server implementation using rouille.
//!
//! # Key types
//!
//! - [`InletServer`] - HTTP server runner, spawns background thread
//! - [`SharedState`] - snapshots written by the application loop, read by handlers
//!
//! # Thread safety
//!
//! - `SharedState` uses `RwLock` per field - loop writes, handlers read
//! - Commands go out through a `crossbeam_channel::Sender`, never block
//! - CORS headers on every response so browser remotes can post directly

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, unbounded};
use rouille::{Request, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::{Arc, RwLock};
use std::thread;

use crate::command::{self, Command, Inlet};
use crate::core::{ImageEntry, Snapshot};

/// Largest inlet body accepted (bytes)
const MAX_BODY: u64 = 64 * 1024;

/// State readable by request handlers (updated by the application loop)
pub struct SharedState {
    pub instance: String,
    /// Messaging server the bridge should connect to
    pub server: String,
    pub snapshot: RwLock<Snapshot>,
    pub images: RwLock<Vec<ImageEntry>>,
}

impl SharedState {
    pub fn new(instance: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            instance: instance.into(),
            server: String::new(),
            snapshot: RwLock::new(snapshot),
            images: RwLock::new(Vec::new()),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }

    pub fn set_images(&self, images: &[ImageEntry]) {
        *self.images.write().unwrap_or_else(|e| e.into_inner()) = images.to_vec();
    }
}

/// Request body for viewport changes
#[derive(Debug, Deserialize)]
struct ViewportRequest {
    width: u32,
    height: u32,
}

/// Generic API response
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok() -> Self {
        Self { success: true, message: None, error: None }
    }

    fn ok_msg(msg: &str) -> Self {
        Self { success: true, message: Some(msg.to_string()), error: None }
    }

    fn err(msg: &str) -> Self {
        Self { success: false, message: None, error: Some(msg.to_string()) }
    }
}

#[derive(Serialize)]
struct StatusResponse<'a> {
    instance: &'a str,
    server: &'a str,
    #[serde(flatten)]
    snapshot: Snapshot,
}

/// HTTP inlet server
pub struct InletServer;

impl InletServer {
    /// Bind `host:port` and serve on a background thread.
    /// Returns the receiver the application loop drains.
    pub fn start(host: &str, port: u16, state: Arc<SharedState>) -> Result<Receiver<Command>> {
        let (tx, rx) = unbounded();
        let addr = format!("{}:{}", host, port);

        let server = rouille::Server::new(addr.as_str(), move |request| {
            Self::handle_request(request, &state, &tx)
        })
        .map_err(|e| anyhow!("Failed to bind inlet server on {}: {}", addr, e))?;

        log::info!("Inlet server listening on http://{}", server.server_addr());
        thread::Builder::new()
            .name("slidebrew-inlet".into())
            .spawn(move || server.run())?;

        Ok(rx)
    }

    pub(crate) fn handle_request(request: &Request, state: &Arc<SharedState>, tx: &Sender<Command>) -> Response {
        if request.method() == "OPTIONS" {
            return Response::empty_204()
                .with_additional_header("Access-Control-Allow-Origin", "*")
                .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
        }

        // Named inlets carry the name in the path
        let path = request.url();
        if request.method() == "POST" {
            if let Some(name) = path.strip_prefix("/inlet/") {
                return Self::handle_inlet(request, name, tx)
                    .with_additional_header("Access-Control-Allow-Origin", "*");
            }
        }

        let response = rouille::router!(request,
            (GET) ["/api/status"] => {
                Self::get_status(state)
            },
            (GET) ["/api/images"] => {
                let images = state.images.read().unwrap_or_else(|e| e.into_inner()).clone();
                Response::json(&images)
            },
            (GET) ["/api/inlets"] => {
                Response::json(&command::manifest())
            },
            (GET) ["/api/health"] => {
                Response::json(&ApiResponse::ok_msg("slidebrew inlet server"))
            },

            (POST) ["/api/message"] => {
                Self::handle_envelope(request, tx)
            },
            (POST) ["/api/clear"] => {
                Self::send_command(tx, Command::Clear)
            },
            (POST) ["/api/viewport"] => {
                match Self::read_json::<ViewportRequest>(request) {
                    Ok(v) => Self::send_command(tx, Command::Resize { width: v.width, height: v.height }),
                    Err(response) => response,
                }
            },

            _ => {
                Response::json(&ApiResponse::err("Not found")).with_status_code(404)
            }
        );

        response.with_additional_header("Access-Control-Allow-Origin", "*")
    }

    fn get_status(state: &Arc<SharedState>) -> Response {
        let snapshot = state.snapshot.read().unwrap_or_else(|e| e.into_inner()).clone();
        Response::json(&StatusResponse {
            instance: &state.instance,
            server: &state.server,
            snapshot,
        })
    }

    fn handle_inlet(request: &Request, name: &str, tx: &Sender<Command>) -> Response {
        let Some(inlet) = Inlet::from_name(name) else {
            return Response::json(&ApiResponse::err(&format!("Unknown inlet '{}'", name))).with_status_code(404);
        };

        let mut body = String::new();
        if let Some(data) = request.data() {
            if let Err(e) = data.take(MAX_BODY).read_to_string(&mut body) {
                return Self::bad_request(&format!("Unreadable body: {}", e));
            }
        }

        match Command::from_inlet(inlet, &command::parse_body(&body)) {
            Ok(cmd) => Self::send_command(tx, cmd),
            Err(e) => Self::bad_request(&e.to_string()),
        }
    }

    /// JSON body, parsed whatever the Content-Type (bridges often omit it).
    fn read_json<T: DeserializeOwned>(request: &Request) -> Result<T, Response> {
        let Some(data) = request.data() else {
            return Err(Self::bad_request("Missing body"));
        };
        serde_json::from_reader(data.take(MAX_BODY)).map_err(|e| Self::bad_request(&format!("Invalid JSON: {}", e)))
    }

    fn handle_envelope(request: &Request, tx: &Sender<Command>) -> Response {
        let envelope: serde_json::Value = match Self::read_json(request) {
            Ok(v) => v,
            Err(response) => return response,
        };
        match Command::from_envelope(&envelope) {
            Ok(cmd) => Self::send_command(tx, cmd),
            Err(e) => Self::bad_request(&e.to_string()),
        }
    }

    fn send_command(tx: &Sender<Command>, cmd: Command) -> Response {
        log::debug!("Inlet command: {:?}", cmd);
        match tx.send(cmd) {
            Ok(_) => Response::json(&ApiResponse::ok()),
            Err(e) => Response::json(&ApiResponse::err(&format!("Failed to send command: {}", e)))
                .with_status_code(500),
        }
    }

    fn bad_request(msg: &str) -> Response {
        log::debug!("Rejected inlet message: {}", msg);
        Response::json(&ApiResponse::err(msg)).with_status_code(400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Phase, Viewport};

    fn state() -> Arc<SharedState> {
        Arc::new(state_with_server("localhost"))
    }

    fn state_with_server(server: &str) -> SharedState {
        SharedState::new(
            "sbSlideshow",
            Snapshot {
                phase: Phase::Idle,
                playing: false,
                interval_ms: 5000,
                speed: 800,
                active_index: None,
                previous_index: 0,
                step_count: 0,
                image_count: 0,
                viewport: Viewport::default(),
            },
        )
        .with_server(server)
    }

    fn post(url: &str, body: &str) -> Request {
        Request::fake_http(
            "POST",
            url,
            vec![("Content-Type".to_owned(), "application/json".to_owned())],
            body.as_bytes().to_vec(),
        )
    }

    fn body_of(response: Response) -> serde_json::Value {
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_named_inlets() {
        let (tx, rx) = unbounded();
        let state = state();

        let r = InletServer::handle_request(&post("/inlet/next", "true"), &state, &tx);
        assert_eq!(r.status_code, 200);
        let r = InletServer::handle_request(&post("/inlet/img_urls", "http://a.com/cat.png"), &state, &tx);
        assert_eq!(r.status_code, 200);
        let r = InletServer::handle_request(&post("/inlet/speed", "300"), &state, &tx);
        assert_eq!(r.status_code, 200);

        assert_eq!(rx.try_recv(), Ok(Command::Next));
        assert_eq!(rx.try_recv(), Ok(Command::AddImage("http://a.com/cat.png".into())));
        assert_eq!(rx.try_recv(), Ok(Command::SetSpeed(300)));
    }

    #[test]
    fn test_unknown_inlet_and_bad_payload() {
        let (tx, rx) = unbounded();
        let state = state();

        let r = InletServer::handle_request(&post("/inlet/volume", "1"), &state, &tx);
        assert_eq!(r.status_code, 404);
        let r = InletServer::handle_request(&post("/inlet/speed", "fast"), &state, &tx);
        assert_eq!(r.status_code, 400);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_envelope_and_control_routes() {
        let (tx, rx) = unbounded();
        let state = state();

        let env = r#"{"message": {"name": "play_pause", "type": "boolean", "value": "true"}}"#;
        assert_eq!(InletServer::handle_request(&post("/api/message", env), &state, &tx).status_code, 200);
        assert_eq!(InletServer::handle_request(&post("/api/clear", ""), &state, &tx).status_code, 200);
        let vp = r#"{"width": 800, "height": 600}"#;
        assert_eq!(InletServer::handle_request(&post("/api/viewport", vp), &state, &tx).status_code, 200);

        assert_eq!(rx.try_recv(), Ok(Command::TogglePlayPause));
        assert_eq!(rx.try_recv(), Ok(Command::Clear));
        assert_eq!(rx.try_recv(), Ok(Command::Resize { width: 800, height: 600 }));
    }

    #[test]
    fn test_status_and_images() {
        let (tx, _rx) = unbounded();
        let state = state();
        state.set_images(&[ImageEntry::new("http://a.com/1.png", 4, 3)]);

        let get = |url: &str| Request::fake_http("GET", url, vec![], vec![]);

        let status = body_of(InletServer::handle_request(&get("/api/status"), &state, &tx));
        assert_eq!(status["instance"], "sbSlideshow");
        assert_eq!(status["server"], "localhost");
        assert_eq!(status["phase"], "Idle");
        assert_eq!(status["interval_ms"], 5000);

        let images = body_of(InletServer::handle_request(&get("/api/images"), &state, &tx));
        assert_eq!(images[0]["url"], "http://a.com/1.png");

        let inlets = body_of(InletServer::handle_request(&get("/api/inlets"), &state, &tx));
        assert_eq!(inlets.as_array().map(|a| a.len()), Some(5));

        let missing = InletServer::handle_request(&get("/nope"), &state, &tx);
        assert_eq!(missing.status_code, 404);
    }

    #[test]
    fn test_envelope_without_content_type() {
        let (tx, rx) = unbounded();
        let state = state();

        let env = r#"{"message": {"name": "speed", "type": "range", "value": 250}}"#;
        let bare = Request::fake_http("POST", "/api/message", vec![], env.as_bytes().to_vec());
        assert_eq!(InletServer::handle_request(&bare, &state, &tx).status_code, 200);
        assert_eq!(rx.try_recv(), Ok(Command::SetSpeed(250)));

        let broken = Request::fake_http("POST", "/api/message", vec![], b"{nope".to_vec());
        assert_eq!(InletServer::handle_request(&broken, &state, &tx).status_code, 400);

        let vp = Request::fake_http("POST", "/api/viewport", vec![], br#"{"width": 640, "height": 480}"#.to_vec());
        assert_eq!(InletServer::handle_request(&vp, &state, &tx).status_code, 200);
        assert_eq!(rx.try_recv(), Ok(Command::Resize { width: 640, height: 480 }));
    }

    #[test]
    fn test_remote_server_does_not_block_startup() {
        let state = Arc::new(state_with_server("10.255.255.1"));
        let rx = InletServer::start("127.0.0.1", 0, Arc::clone(&state));
        assert!(rx.is_ok());
        assert_eq!(state.server, "10.255.255.1");
    }
}
