/// Weather lookup cache.
///
/// Caches current-weather lookups per exact coordinate pair for a fixed TTL
/// so a dashboard refresh does not hit the forecast API once per reservoir
/// per request. Failed lookups are cached as "no data" for the same window.
///
/// The clock is injected so expiry can be driven deterministically.

use std::cell::Cell;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Current conditions at a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: f64,     // °C
    pub condition_code: i32,  // WMO weather interpretation code
}

/// Result of a lookup as seen by the dashboard.
///
/// Serializes as either `{"temperature": .., "condition_code": ..}` or
/// `{"error": "no data"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WeatherLookup {
    Current(CurrentWeather),
    Unavailable { error: String },
}

impl WeatherLookup {
    pub fn no_data() -> Self {
        WeatherLookup::Unavailable { error: "no data".to_string() }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, WeatherLookup::Current(_))
    }
}

/// Errors from the external weather service. Never leave the cache.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Weather API returned HTTP {0}")]
    Status(u16),

    #[error("Malformed weather payload: {0}")]
    Parse(String),
}

/// Source of current-weather observations.
pub trait WeatherSource {
    fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather, WeatherError>;
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Default time-to-live for cached lookups (10 minutes).
pub const DEFAULT_TTL_SECS: i64 = 600;

/// Exact bit pattern of (latitude, longitude).
type CoordKey = (u64, u64);

struct CachedLookup {
    lookup: WeatherLookup,
    fetched_at: DateTime<Utc>,
}

/// Per-coordinate TTL cache in front of a `WeatherSource`.
///
/// Unbounded in key count; entries are only replaced once expired. The
/// reservoir set is small and static, so growth is bounded in practice.
pub struct WeatherCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    entries: HashMap<CoordKey, CachedLookup>,
}

impl<S: WeatherSource> WeatherCache<S, SystemClock> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, SystemClock, ttl)
    }
}

impl<S: WeatherSource, C: Clock> WeatherCache<S, C> {
    pub fn with_clock(source: S, clock: C, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Current weather for a coordinate, served from cache while fresh.
    ///
    /// Never fails: any source error becomes `WeatherLookup::no_data()`.
    pub fn get_weather(&mut self, latitude: f64, longitude: f64) -> WeatherLookup {
        let key = (latitude.to_bits(), longitude.to_bits());
        let now = self.clock.now();

        if let Some(cached) = self.entries.get(&key) {
            if now - cached.fetched_at < self.ttl {
                debug!("Weather cache hit for ({}, {})", latitude, longitude);
                return cached.lookup.clone();
            }
            debug!("Weather cache expired for ({}, {})", latitude, longitude);
        }

        let lookup = match self.source.fetch_current(latitude, longitude) {
            Ok(current) => WeatherLookup::Current(current),
            Err(e) => {
                warn!("Weather lookup failed for ({}, {}): {}", latitude, longitude, e);
                WeatherLookup::no_data()
            }
        };

        self.entries.insert(
            key,
            CachedLookup {
                lookup: lookup.clone(),
                fetched_at: now,
            },
        );
        lookup
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of cached coordinates, fresh or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
