use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Inlet:  rouille HTTP\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Slideshow driven by pub/sub inlets
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Instance name (also keys the saved slideshow)
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Instance id, appended to the default name ("sbSlideshow <ID>")
    #[arg(long = "id", value_name = "ID")]
    pub id: Option<String>,

    /// Messaging server address, reported to the bridge (default: localhost)
    #[arg(short = 's', long = "server", value_name = "HOST")]
    pub server: Option<String>,

    /// Host the inlet server listens on (default: 127.0.0.1)
    #[arg(short = 'b', long = "bind", value_name = "HOST")]
    pub bind: Option<String>,

    /// Inlet port (default: 9876)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Initial playback interval in seconds (default: 5)
    #[arg(long = "speed", value_name = "SECONDS")]
    pub speed: Option<f64>,

    /// Debug output (same as -vv)
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Viewport size used to lay out images
    #[arg(long = "viewport", value_names = ["WIDTH", "HEIGHT"], num_args = 2)]
    pub viewport: Option<Vec<u32>>,

    /// Image loader threads (default: auto)
    #[arg(long = "loader-threads", value_name = "N")]
    pub loader_threads: Option<usize>,

    /// Accept file:// urls and local paths on the img_urls inlet
    #[arg(long = "allow-local-files")]
    pub allow_local_files: bool,

    /// Keep the slideshow in memory only (nothing read or written)
    #[arg(long = "no-persist")]
    pub no_persist: bool,

    /// Write the effective settings to the config directory and continue
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Enable logging to file (default: slidebrew.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Effective verbosity: `--debug` counts as `-vv`
    pub fn level(&self) -> u8 {
        if self.debug { self.verbosity.max(2) } else { self.verbosity }
    }
}
