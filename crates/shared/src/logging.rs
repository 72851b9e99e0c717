use log::LevelFilter;

// Logging bootstrap shared by every binary in the workspace

/// Maps a `LOG_LEVEL` style string onto a filter. Unknown values fall back to `Info`.
pub fn level_filter(level: &str) -> LevelFilter {
    match level.trim().to_uppercase().as_str() {
        "OFF" => LevelFilter::Off,
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "INFO" => LevelFilter::Info,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Builds the env_logger builder used by the server. `RUST_LOG` is still honoured
/// for per-module overrides; HTTP plumbing crates are capped at `Warn`.
pub fn logger_builder(level: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level_filter(level));

    for module in ["hyper", "reqwest", "actix_server", "mio"] {
        builder.filter_module(module, LevelFilter::Warn);
    }

    builder
}

/// Installs the global logger. Calling it twice is harmless; the second call is ignored.
pub fn init_logging(level: &str) {
    if logger_builder(level).try_init().is_ok() {
        log::info!("Logging initialized with level: {}", level_filter(level));
    }
}
