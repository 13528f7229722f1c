//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{CliArgs, Command, EngineOverrides, PrepareArgs, RenderArgs, SchemaArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tessera";
const ENV_PREFIX: &str = "TESSERA";
const DEFAULT_CLASS_PREFIX: &str = "page";
const DEFAULT_LISTING_CACHE_CAPACITY: u64 = 64;
const DEFAULT_LISTING_CACHE_TTL_SECS: u64 = 60;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub theme: ThemeSettings,
    pub render: RenderSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ThemeSettings {
    /// On-disk theme; `None` selects the embedded default theme.
    pub directory: Option<PathBuf>,
    pub class_prefix: String,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub normalize_spacing: bool,
    pub blog_enabled: bool,
    pub courses_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub listing_capacity: NonZeroUsize,
    pub listing_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(cli.command.overrides());

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    theme: RawThemeSettings,
    render: RawRenderSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawThemeSettings {
    directory: Option<PathBuf>,
    class_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    normalize_spacing: Option<bool>,
    blog_enabled: Option<bool>,
    courses_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    listing_capacity: Option<u64>,
    listing_ttl_seconds: Option<u64>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &EngineOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.theme_directory.as_ref() {
            self.theme.directory = Some(directory.clone());
        }
        if let Some(prefix) = overrides.class_prefix.as_ref() {
            self.theme.class_prefix = Some(prefix.clone());
        }
        if let Some(value) = overrides.normalize_spacing {
            self.render.normalize_spacing = Some(value);
        }
        if let Some(value) = overrides.blog_enabled {
            self.render.blog_enabled = Some(value);
        }
        if let Some(value) = overrides.courses_enabled {
            self.render.courses_enabled = Some(value);
        }
        if let Some(value) = overrides.cache_enabled {
            self.cache.enabled = Some(value);
        }
        if let Some(value) = overrides.cache_listing_capacity {
            self.cache.listing_capacity = Some(value);
        }
        if let Some(value) = overrides.cache_listing_ttl_seconds {
            self.cache.listing_ttl_seconds = Some(value);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            theme,
            render,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            theme: build_theme_settings(theme)?,
            render: build_render_settings(render),
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_theme_settings(theme: RawThemeSettings) -> Result<ThemeSettings, LoadError> {
    let directory = theme
        .directory
        .filter(|path| !path.as_os_str().is_empty());

    let class_prefix = match theme.class_prefix {
        Some(prefix) => {
            let trimmed = prefix.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(
                    "theme.class_prefix",
                    "prefix must not be empty",
                ));
            }
            if !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(LoadError::invalid(
                    "theme.class_prefix",
                    "prefix may only contain ASCII letters, digits, `-` and `_`",
                ));
            }
            trimmed.to_string()
        }
        None => DEFAULT_CLASS_PREFIX.to_string(),
    };

    Ok(ThemeSettings {
        directory,
        class_prefix,
    })
}

fn build_render_settings(render: RawRenderSettings) -> RenderSettings {
    RenderSettings {
        normalize_spacing: render.normalize_spacing.unwrap_or(true),
        blog_enabled: render.blog_enabled.unwrap_or(true),
        courses_enabled: render.courses_enabled.unwrap_or(true),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = cache
        .listing_capacity
        .unwrap_or(DEFAULT_LISTING_CACHE_CAPACITY);
    let listing_capacity = non_zero_usize(capacity, "cache.listing_capacity")?;

    let ttl_seconds = cache
        .listing_ttl_seconds
        .unwrap_or(DEFAULT_LISTING_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.listing_ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        listing_capacity,
        listing_ttl: Duration::from_secs(ttl_seconds),
    })
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
