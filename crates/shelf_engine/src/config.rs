use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use shelf_logging::LogDestination;
use thiserror::Error;

use crate::extract::ExtractionMode;
use crate::fetch::FetchSettings;
use crate::render::RenderSettings;
use crate::store::StoreConfig;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_LOG_FILE: &str = "./shelf.log";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Process-wide settings, built once at startup and handed to constructors.
#[derive(Debug, Clone)]
pub struct ShelfConfig {
    pub store: StoreConfig,
    pub fetch: FetchSettings,
    pub render: RenderSettings,
    pub extraction: ExtractionMode,
    /// Delete unreferenced blobs when the app starts.
    pub sweep_orphans_on_start: bool,
    pub log: LogDestination,
    pub log_level: LevelFilter,
}

impl ShelfConfig {
    pub fn default_with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig::new(data_dir),
            fetch: FetchSettings::default(),
            render: RenderSettings::default(),
            extraction: ExtractionMode::default(),
            sweep_orphans_on_start: false,
            log: LogDestination::Terminal,
            log_level: LevelFilter::Info,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, which maps variable names to values.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = get("SHELF_DATA_DIR")
            .or_else(|| get("DATA_DIR"))
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let mut config = Self::default_with_data_dir(data_dir);

        if let Some(value) = get("SHELF_EXTRACTION") {
            config.extraction = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SHELF_EXTRACTION",
                value,
                expected: "`standard` or `strict`",
            })?;
        }

        if let Some(value) = get("SHELF_FETCH_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) if secs > 0 => config.fetch.request_timeout = Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SHELF_FETCH_TIMEOUT_SECS",
                        value,
                        expected: "a positive number of seconds",
                    })
                }
            }
        }

        if let Some(value) = get("SHELF_WKHTMLTOPDF") {
            config.render.binary = Some(PathBuf::from(value));
        }

        if let Some(value) = get("SHELF_SWEEP_ORPHANS") {
            config.sweep_orphans_on_start = parse_flag(&value).ok_or(ConfigError::InvalidValue {
                key: "SHELF_SWEEP_ORPHANS",
                value,
                expected: "a boolean (true/false, 1/0, yes/no)",
            })?;
        }

        let log_file = PathBuf::from(get("SHELF_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()));
        if let Some(value) = get("SHELF_LOG") {
            config.log = match value.to_ascii_lowercase().as_str() {
                "terminal" => LogDestination::Terminal,
                "file" => LogDestination::File(log_file),
                "both" => LogDestination::Both(log_file),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SHELF_LOG",
                        value,
                        expected: "`terminal`, `file` or `both`",
                    })
                }
            };
        }

        if let Some(value) = get("SHELF_LOG_LEVEL") {
            config.log_level = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SHELF_LOG_LEVEL",
                value,
                expected: "a log level (off, error, warn, info, debug, trace)",
            })?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
