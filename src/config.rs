//! Paths and settings.
//!
//! Directory priority:
//! 1. CLI `--config-dir`
//! 2. `SLIDEBREW_CONFIG_DIR` environment variable
//! 3. Local folder IF any slidebrew files exist there
//! 4. Platform directory from dirs-next
//!
//! Platform paths:
//! - Linux: ~/.config/slidebrew/{name}, ~/.local/share/slidebrew/{name}
//! - macOS: ~/Library/Application Support/slidebrew/{name}
//! - Windows: %APPDATA%\slidebrew\{name}

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::core::controller::{ControllerSettings, DEFAULT_INTERVAL_MS, DEFAULT_SPEED, SPEED_DEBOUNCE_MS};
use crate::core::Viewport;

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "slidebrew.json";
/// Default log file name inside the data directory
pub const LOG_FILE: &str = "slidebrew.log";

const APP_DIR: &str = "slidebrew";
const ENV_CONFIG_DIR: &str = "SLIDEBREW_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone)]
pub struct PathConfig {
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args -> ENV var -> None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(ENV_CONFIG_DIR).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Directory holding persisted slideshows
pub fn storage_dir(config: &PathConfig) -> PathBuf {
    get_data_dir(config).join("storage")
}

/// Create configuration and data directories if missing.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = get_config_dir(config);
    let data_dir = get_data_dir(config);

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    if data_dir != config_dir {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE, "storage"].iter().any(|f| dir.join(f).exists())
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir())
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir())
}

fn resolve_dir(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_files(&current_dir) {
            return current_dir;
        }
    }
    platform.map(|d| d.join(APP_DIR)).unwrap_or_else(|| PathBuf::from("."))
}

/// Persistent defaults, overridden by the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Instance name; also keys the persisted slideshow
    pub name: Option<String>,
    /// Instance id appended to the default name
    pub id: Option<String>,
    /// Messaging server address. Reported to bridges, never bound.
    pub server: String,
    /// Host the inlet server listens on
    pub bind: String,
    pub port: u16,
    /// Playback interval in seconds
    pub speed_secs: f64,
    pub debug: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Loader threads (0 = auto)
    pub loader_threads: usize,
    /// Accept `file://` urls and local paths
    pub allow_local_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: None,
            id: None,
            server: "localhost".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 9876,
            speed_secs: DEFAULT_INTERVAL_MS as f64 / 1000.0,
            debug: false,
            viewport_width: Viewport::default().width,
            viewport_height: Viewport::default().height,
            loader_threads: 0,
            allow_local_files: false,
        }
    }
}

impl Settings {
    /// Load from `path`. Missing or broken files fall back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::read(path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Command line values win over stored ones.
    pub fn apply_args(&mut self, args: &Args) {
        if args.name.is_some() {
            self.name = args.name.clone();
        }
        if args.id.is_some() {
            self.id = args.id.clone();
        }
        if let Some(server) = &args.server {
            self.server = server.clone();
        }
        if let Some(bind) = &args.bind {
            self.bind = bind.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(speed) = args.speed {
            self.speed_secs = speed;
        }
        if args.debug {
            self.debug = true;
        }
        if let Some(vp) = &args.viewport {
            self.viewport_width = vp[0];
            self.viewport_height = vp[1];
        }
        if let Some(threads) = args.loader_threads {
            self.loader_threads = threads;
        }
        if args.allow_local_files {
            self.allow_local_files = true;
        }
    }

    /// `name`, or `sbSlideshow` / `sbSlideshow <id>`
    pub fn instance_name(&self) -> String {
        if let Some(name) = self.name.as_ref().filter(|n| !n.trim().is_empty()) {
            return name.clone();
        }
        match self.id.as_ref().filter(|i| !i.trim().is_empty()) {
            Some(id) => format!("sbSlideshow {}", id),
            None => "sbSlideshow".to_string(),
        }
    }

    /// Interval in ms; non-numeric or non-positive values fall back to 5 s
    pub fn interval_ms(&self) -> u64 {
        if self.speed_secs.is_finite() && self.speed_secs > 0.0 {
            (self.speed_secs * 1000.0).round() as u64
        } else {
            DEFAULT_INTERVAL_MS
        }
    }

    pub fn loader_threads(&self) -> usize {
        if self.loader_threads > 0 {
            self.loader_threads
        } else {
            num_cpus::get().clamp(1, 4)
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            interval_ms: self.interval_ms(),
            speed: DEFAULT_SPEED,
            viewport: Viewport::new(self.viewport_width, self.viewport_height),
            debounce_ms: SPEED_DEBOUNCE_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file("x.log", &config), PathBuf::from("/custom/x.log"));
        assert_eq!(storage_dir(&config), PathBuf::from("/custom/storage"));
    }

    #[test]
    fn test_instance_name() {
        let mut s = Settings::default();
        assert_eq!(s.instance_name(), "sbSlideshow");
        s.id = Some("3".into());
        assert_eq!(s.instance_name(), "sbSlideshow 3");
        s.name = Some("lobby".into());
        assert_eq!(s.instance_name(), "lobby");
    }

    #[test]
    fn test_interval_fallback() {
        let mut s = Settings::default();
        assert_eq!(s.interval_ms(), 5000);
        s.speed_secs = 2.5;
        assert_eq!(s.interval_ms(), 2500);
        s.speed_secs = f64::NAN;
        assert_eq!(s.interval_ms(), 5000);
        s.speed_secs = -1.0;
        assert_eq!(s.interval_ms(), 5000);
    }

    #[test]
    fn test_args_override_settings() {
        let mut s = Settings {
            port: 1234,
            server: "0.0.0.0".into(),
            ..Settings::default()
        };
        let args = Args::parse_from(["slidebrew", "--name", "wall", "--speed", "10", "--viewport", "800", "600"]);
        s.apply_args(&args);
        assert_eq!(s.instance_name(), "wall");
        assert_eq!(s.interval_ms(), 10_000);
        assert_eq!(s.port, 1234);
        assert_eq!(s.server, "0.0.0.0");
        assert_eq!((s.viewport_width, s.viewport_height), (800, 600));
    }

    #[test]
    fn test_remote_server_keeps_local_bind() {
        let mut s = Settings::default();
        let args = Args::parse_from(["slidebrew", "--server", "10.255.255.1"]);
        s.apply_args(&args);
        assert_eq!(s.server, "10.255.255.1");
        assert_eq!(s.bind, "127.0.0.1");
        assert!(!s.allow_local_files);

        let args = Args::parse_from(["slidebrew", "--bind", "0.0.0.0", "--allow-local-files"]);
        s.apply_args(&args);
        assert_eq!(s.bind, "0.0.0.0");
        assert_eq!(s.server, "10.255.255.1");
        assert!(s.allow_local_files);
    }

    #[test]
    fn test_settings_file_round_trip_and_partial() {
        let dir = std::env::temp_dir().join("slidebrew_settings_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(SETTINGS_FILE);

        let s = Settings {
            name: Some("foyer".into()),
            port: 7000,
            ..Settings::default()
        };
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path), s);

        std::fs::write(&path, r#"{"port": 7100}"#).unwrap();
        let partial = Settings::load(&path);
        assert_eq!(partial.port, 7100);
        assert_eq!(partial.server, "localhost");

        std::fs::write(&path, "{broken").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
