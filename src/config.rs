/// Configuration loading - service settings, seed registry, database URL.
///
/// Separates deployment details from code:
/// - `resmon.toml`      - listen port and weather lookup settings (optional)
/// - `reservoirs.toml`  - reservoirs seeded by `init_db`
/// - `.secrets.toml`    - `db_url`, checked before the `DATABASE_URL` env var

use chrono::Duration;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::db::DbConfigError;
use crate::ingest::open_meteo::{DEFAULT_TIMEOUT_SECS, OPEN_METEO_BASE_URL};
use crate::model::SeedReservoir;
use crate::weather::DEFAULT_TTL_SECS;

pub const SETTINGS_PATH: &str = "resmon.toml";
pub const SEED_REGISTRY_PATH: &str = "reservoirs.toml";
pub const SECRETS_PATH: &str = ".secrets.toml";

/// Errors reading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid [weather] cache_ttl_secs: {0} (expected a non-negative number of seconds)")]
    InvalidCacheTtl(i64),
}

// ---------------------------------------------------------------------------
// Service settings
// ---------------------------------------------------------------------------

/// Settings loaded from `resmon.toml`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listen_port: u16,
    pub weather: WeatherSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            weather: WeatherSettings::default(),
        }
    }
}

impl WeatherSettings {
    /// Cache TTL as a duration; negative or out-of-range values are rejected.
    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        Duration::try_seconds(self.cache_ttl_secs)
            .filter(|ttl| *ttl >= Duration::zero())
            .ok_or(ConfigError::InvalidCacheTtl(self.cache_ttl_secs))
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: OPEN_METEO_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

/// Loads settings from `path`; a missing file yields the defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = read(path)?;
    parse_settings(&contents, path)
}

fn parse_settings(contents: &str, path: &Path) -> Result<Settings, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Seed registry
// ---------------------------------------------------------------------------

/// Root structure of `reservoirs.toml`.
#[derive(Debug, Deserialize)]
struct SeedRegistry {
    reservoir: Vec<SeedReservoir>,
}

/// Loads the reservoirs to seed on first initialization.
pub fn load_seed_registry(path: impl AsRef<Path>) -> Result<Vec<SeedReservoir>, ConfigError> {
    let path = path.as_ref();
    let contents = read(path)?;
    let registry: SeedRegistry = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(registry.reservoir)
}

// ---------------------------------------------------------------------------
// Database URL
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Secrets {
    db_url: Option<String>,
}

/// Resolves the database URL: `db_url` in the secrets file wins, then the
/// `DATABASE_URL` environment variable (after loading `.env`).
pub fn resolve_database_url(secrets_path: impl AsRef<Path>) -> Result<String, DbConfigError> {
    dotenv::dotenv().ok();

    let secrets = fs::read_to_string(secrets_path.as_ref()).ok();
    resolve_database_url_from(secrets.as_deref(), env::var("DATABASE_URL").ok())
}

/// Pure form of `resolve_database_url`.
///
/// An unreadable or malformed secrets file, or one without `db_url`, falls
/// through to the environment value. Blank values count as absent.
pub fn resolve_database_url_from(
    secrets_toml: Option<&str>,
    env_value: Option<String>,
) -> Result<String, DbConfigError> {
    let from_secrets = secrets_toml
        .and_then(|contents| toml::from_str::<Secrets>(contents).ok())
        .and_then(|s| s.db_url);

    from_secrets
        .into_iter()
        .chain(env_value)
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .ok_or(DbConfigError::MissingDatabaseUrl)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}
