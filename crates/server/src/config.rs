use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use coin_board_feed::FeedConfig;
use log::{log, Level};
use serde::Deserialize;

use crate::dashboard::DashboardSettings;

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_CONFIG_FILE: &str = "coin-board.toml";

pub struct ServerConfig {
    pub log_level: String,
    pub http_host: String,
    pub http_port: u16,
    pub feed: FeedConfig,
    pub dashboard: DashboardSettings,
    /// Messages raised while loading, emitted once logging is up.
    startup_log: Vec<(Level, String)>,
}

/// Optional `[feed]` table of the TOML config file.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct FeedSection {
    pub relays: Option<Vec<String>>,
    pub disabled_sources: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    feed: Option<FeedSection>,
}

impl ServerConfig {
    pub fn load() -> Result<Self, String> {
        let mut startup_log = Vec::new();

        let env_file = std::env::var("COIN_BOARD_ENV_FILE").unwrap_or_else(|_| DEFAULT_ENV_FILE.to_string());
        match dotenv::from_filename(&env_file) {
            Ok(path) => startup_log.push((Level::Info, format!("Loaded environment from {}", path.display()))),
            Err(e) => startup_log.push((Level::Warn, format!("Could not load {}: {}", env_file, e))),
        }

        let config_path =
            std::env::var("COIN_BOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let section = load_feed_section(Path::new(&config_path), &mut startup_log)?;

        let mut config = Self::from_vars(|name| std::env::var(name).ok(), section);
        startup_log.append(&mut config.startup_log);
        config.startup_log = startup_log;
        Ok(config)
    }

    /// Builds the config from a variable lookup, so tests need not touch the
    /// process environment.
    pub fn from_vars<F>(var: F, section: Option<FeedSection>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut startup_log = Vec::new();
        let log = &mut startup_log;

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string());
        let http_host = var("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let http_port = parse_or(&var, log, "HTTP_PORT", 8080u16);

        let mut feed = FeedConfig {
            request_timeout: Duration::from_millis(parse_or(&var, log, "FETCH_TIMEOUT_MS", 5000)),
            cache_ttl: Duration::from_secs(parse_or(&var, log, "CACHE_TTL_SECONDS", 60)),
            health_reset_after: Duration::from_secs(parse_or(&var, log, "HEALTH_RESET_SECONDS", 300)),
            source_attempts: parse_or(&var, log, "SOURCE_ATTEMPTS", 2),
            ..FeedConfig::default()
        };
        if let Some(section) = section {
            if let Some(relays) = section.relays {
                feed.relays = relays;
            }
            if let Some(disabled) = section.disabled_sources {
                feed.disabled_sources = disabled;
            }
        }

        let dashboard = DashboardSettings {
            deadline: Duration::from_secs(parse_or(&var, log, "FETCH_DEADLINE_SECONDS", 20)),
            refresh_interval: Duration::from_secs(parse_or(&var, log, "REFRESH_INTERVAL_SECONDS", 60)),
            fallback_refresh_interval: Duration::from_secs(parse_or(
                &var,
                log,
                "FALLBACK_REFRESH_INTERVAL_SECONDS",
                120,
            )),
        };

        ServerConfig {
            log_level,
            http_host,
            http_port,
            feed,
            dashboard,
            startup_log,
        }
    }

    /// Installs the logger, then replays what loading had to say.
    pub fn setup_logging(&self) {
        shared::init_logging(&self.log_level);
        for (level, message) in &self.startup_log {
            log!(*level, "{}", message);
        }
    }
}

fn parse_or<F, T>(var: &F, log: &mut Vec<(Level, String)>, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log.push((
                Level::Warn,
                format!("{} has invalid value '{}', using default ({})", name, raw, default),
            ));
            default
        }),
        None => default,
    }
}

/// Reads the `[feed]` table. A missing file is not an error; a malformed one
/// is noted in `log` and ignored.
pub fn load_feed_section(path: &Path, log: &mut Vec<(Level, String)>) -> Result<Option<FeedSection>, String> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    match toml::from_str::<ConfigFile>(&raw) {
        Ok(file) => {
            log.push((Level::Info, format!("Loaded feed settings from {}", path.display())));
            Ok(file.feed)
        }
        Err(e) => {
            log.push((Level::Warn, format!("Ignoring malformed {}: {}", path.display(), e)));
            Ok(None)
        }
    }
}
