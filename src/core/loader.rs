//! Asynchronous image load confirmation.
//!
//! A url only joins the slideshow after it was fetched and its header decoded
//! to non-zero dimensions. Requests go through a single staging slot: every
//! `request()` opens a new epoch and anything requested earlier is dropped,
//! either before a worker starts it or when its result arrives.
//!
//! # Sources
//!
//! - `http://`, `https://` - blocking reqwest client on a worker thread
//! - `file://` and plain paths - read from disk, only when local files are allowed
//!
//! Only the head of a source is read: image headers sit in the first few
//! KiB, so at most [`HEADER_READ_LIMIT`] bytes are buffered per request.

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::workers::Workers;

/// Per-request network timeout
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Bytes read from a source to find the image header
pub const HEADER_READ_LIMIT: u64 = 512 * 1024;

/// Sources declaring more than this are rejected before reading
pub const MAX_SOURCE_BYTES: u64 = 64 * 1024 * 1024;

/// Result of one load request
#[derive(Debug)]
pub struct LoadOutcome {
    pub epoch: u64,
    pub url: String,
    pub result: Result<(u32, u32)>,
}

pub struct ImageLoader {
    workers: Workers,
    epoch: Arc<AtomicU64>,
    client: Option<reqwest::blocking::Client>,
    allow_local: bool,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl ImageLoader {
    /// `allow_local` enables `file://` urls and bare paths.
    pub fn new(num_threads: usize, allow_local: bool) -> Self {
        let epoch = Arc::new(AtomicU64::new(0));
        let workers = Workers::new(num_threads, Arc::clone(&epoch));
        let client = match reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("slidebrew/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("HTTP client unavailable, only local images will load: {}", e);
                None
            }
        };
        let (tx, rx) = unbounded();
        Self {
            workers,
            epoch,
            client,
            allow_local,
            tx,
            rx,
        }
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Channel the outcomes arrive on
    pub fn results(&self) -> &Receiver<LoadOutcome> {
        &self.rx
    }

    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// True if `outcome` belongs to the latest request
    pub fn is_current(&self, outcome: &LoadOutcome) -> bool {
        outcome.epoch == self.current_epoch()
    }

    /// Queue a load for `url`, superseding any request still in flight.
    /// Returns the epoch of the new request.
    pub fn request(&self, url: &str) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let url = url.to_string();
        let client = self.client.clone();
        let allow_local = self.allow_local;
        let tx = self.tx.clone();
        debug!("Loading {} (epoch {})", url, epoch);

        self.workers.execute_with_epoch(epoch, move || {
            let result = probe(client.as_ref(), &url, allow_local);
            let _ = tx.send(LoadOutcome { epoch, url, result });
        });
        epoch
    }

    /// Take the next outcome if it is current. Stale ones are logged and dropped.
    pub fn accept(&self, outcome: LoadOutcome) -> Option<(String, u32, u32)> {
        if !self.is_current(&outcome) {
            debug!("Discarding stale load of {} (epoch {})", outcome.url, outcome.epoch);
            return None;
        }
        match outcome.result {
            Ok((w, h)) if w > 0 && h > 0 => {
                info!("Loaded {} ({}x{})", outcome.url, w, h);
                Some((outcome.url, w, h))
            }
            Ok((w, h)) => {
                warn!("Image {} has no pixels ({}x{})", outcome.url, w, h);
                None
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", outcome.url, e);
                None
            }
        }
    }
}

/// Fetch the head of the source and decode the dimensions from the header.
pub fn probe(client: Option<&reqwest::blocking::Client>, url: &str, allow_local: bool) -> Result<(u32, u32)> {
    let bytes = fetch_head(client, url, allow_local)?;
    dimensions(&bytes).with_context(|| format!("Not a decodable image: {}", url))
}

fn fetch_head(client: Option<&reqwest::blocking::Client>, url: &str, allow_local: bool) -> Result<Vec<u8>> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let Some(client) = client else {
            bail!("No HTTP client for {}", url);
        };
        let response = client
            .get(url)
            .send()
            .with_context(|| format!("Request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad status: {}", url))?;
        check_size(response.content_length(), url)?;
        return read_head(response, url);
    }

    if !allow_local {
        bail!("Local files are disabled: {}", url);
    }
    let path = url.strip_prefix("file://").unwrap_or(url);
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    check_size(file.metadata().ok().map(|m| m.len()), path)?;
    read_head(file, path)
}

fn check_size(declared: Option<u64>, source: &str) -> Result<()> {
    match declared {
        Some(len) if len > MAX_SOURCE_BYTES => {
            bail!("Source too large: {} ({} bytes, limit {})", source, len, MAX_SOURCE_BYTES)
        }
        _ => Ok(()),
    }
}

/// Read at most [`HEADER_READ_LIMIT`] bytes.
fn read_head(reader: impl Read, source: &str) -> Result<Vec<u8>> {
    let mut head = Vec::new();
    reader
        .take(HEADER_READ_LIMIT)
        .read_to_end(&mut head)
        .with_context(|| format!("Read failed: {}", source))?;
    Ok(head)
}

/// Image dimensions from encoded bytes (format guessed from content)
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to guess image format")?;
    let dims = reader.into_dimensions().context("Failed to read image header")?;
    Ok(dims)
}
