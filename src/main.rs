use slidebrew::app::App;
use slidebrew::cli::Args;
use slidebrew::config::{self, Settings};
use slidebrew::core::store::{self, JsonFileStore, ListStore, MemoryStore};
use slidebrew::core::{EventBus, ImageLoader, PlaybackController};
use slidebrew::render::LogRenderer;
use slidebrew::server::{InletServer, SharedState};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::sync::Arc;

fn main() -> Result<()> {
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // Settings are read before the logger so a stored `debug` can raise the level
    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    let mut settings = Settings::load(&settings_path);
    settings.apply_args(&args);

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv / --debug) = debug, 3+ (-vvv) = trace
    let level = if settings.debug { args.level().max(2) } else { args.level() };
    init_logging(&args, &path_config, level)?;

    info!("Slidebrew starting...");
    debug!("Command-line args: {:?}", args);
    info!("Config path: {}", settings_path.display());

    if args.save_settings {
        settings.save(&settings_path)?;
        info!("Settings saved to {}", settings_path.display());
    }

    let name = settings.instance_name();
    let store: Box<dyn ListStore> = if args.no_persist {
        info!("Persistence disabled");
        Box::new(MemoryStore::new())
    } else {
        let dir = config::storage_dir(&path_config);
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let file_store = JsonFileStore::new(&dir, &store::storage_key(&name));
        info!("Slideshow file: {}", file_store.path().display());
        Box::new(file_store)
    };

    let bus = EventBus::new();
    let controller = PlaybackController::new(settings.controller_settings(), store, bus.emitter());
    let shared = Arc::new(SharedState::new(name.clone(), controller.snapshot()).with_server(settings.server.clone()));
    let commands = InletServer::start(&settings.bind, settings.port, Arc::clone(&shared))?;
    info!("Messaging server: {}", settings.server);
    if settings.allow_local_files {
        info!("Local image files enabled");
    }
    let loader = ImageLoader::new(settings.loader_threads(), settings.allow_local_files);

    info!(
        "Instance '{}': {} image(s), interval {}ms, {} loader thread(s)",
        name,
        controller.len(),
        controller.interval_ms(),
        loader.threads()
    );

    let mut app = App::new(controller, bus, loader, commands, LogRenderer::new(), shared);
    app.run();
    Ok(())
}

fn init_logging(args: &Args, path_config: &config::PathConfig, level: u8) -> Result<()> {
    let log_level = match level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("hyper", log::LevelFilter::Info) // Suppress http client spam
            .filter_module("rustls", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match level {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("hyper", log::LevelFilter::Info)
            .filter_module("rustls", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}
