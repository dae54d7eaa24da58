/// Query/aggregation layer behind the dashboard.
///
/// Each function runs against one store session and returns plain,
/// serializable view structs; rendering is left to the client.
///
/// - `load_dashboard` - every reservoir with latest reading, flood-limit
///   status, marker style and weather, plus the global alert list
/// - `load_detail`    - one reservoir's ascending history, report and brief
/// - `submit_reading` - validates and appends one reading; the caller
///   re-fetches whatever view it is showing afterwards

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alert::thresholds::{self, FloodAlert, FloodLimitStatus, MarkerStyle};
use crate::analysis::report::{self, Report};
use crate::model::{NewReading, Reading, Reservoir};
use crate::store::{ReservoirStore, StoreError};
use crate::weather::{Clock, WeatherCache, WeatherLookup, WeatherSource};

/// Shown when the store holds no reservoirs.
pub const EMPTY_STORE_NOTICE: &str = "数据库中暂无水库数据，请先运行 init_db 初始化数据。";

/// Shown when a reservoir has no readings.
pub const NO_HISTORY_NOTICE: &str = "暂无历史数据";

/// Bounds accepted by the reading form.
pub const WATER_LEVEL_RANGE: (f64, f64) = (0.0, 500.0);
pub const STORAGE_RANGE: (f64, f64) = (0.0, 1000.0);

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirEntry {
    pub reservoir: Reservoir,
    pub latest: Option<Reading>,
    pub flood_status: FloodLimitStatus,
    pub marker: MarkerStyle,
    pub weather: WeatherLookup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub reservoir_count: usize,
    pub reservoirs: Vec<ReservoirEntry>,
    pub alerts: Vec<FloodAlert>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirDetail {
    pub reservoir: Reservoir,
    pub history: Vec<Reading>,
    pub report: Option<Report>,
    pub brief: Option<String>,
    pub notice: Option<String>,
}

/// Reading form as submitted by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadingSubmission {
    pub reservoir_id: Option<i32>,
    pub water_level: f64,
    pub storage: f64,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("请先选择水库！")]
    NoReservoirSelected,

    #[error("{field} {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Every reservoir paired with its latest reading, ascending by id.
pub fn list_reservoirs_with_latest<S: ReservoirStore + ?Sized>(
    store: &mut S,
) -> Result<Vec<(Reservoir, Option<Reading>)>, StoreError> {
    let reservoirs = store.list_reservoirs()?;
    let mut paired = Vec::with_capacity(reservoirs.len());

    for reservoir in reservoirs {
        let latest = store.find_latest_by_reservoir(reservoir.id)?;
        paired.push((reservoir, latest));
    }

    Ok(paired)
}

/// All readings of a reservoir, ascending by timestamp.
pub fn history_for<S: ReservoirStore + ?Sized>(
    store: &mut S,
    reservoir_id: i32,
) -> Result<Vec<Reading>, StoreError> {
    store.find_history_by_reservoir(reservoir_id)
}

/// Builds the full dashboard view for one request.
pub fn load_dashboard<S, W, C>(
    store: &mut S,
    weather: &mut WeatherCache<W, C>,
) -> Result<DashboardView, StoreError>
where
    S: ReservoirStore + ?Sized,
    W: WeatherSource,
    C: Clock,
{
    let paired = list_reservoirs_with_latest(store)?;
    let mut reservoirs = Vec::with_capacity(paired.len());
    let mut alerts = Vec::new();

    for (reservoir, latest) in paired {
        let flood_status = thresholds::evaluate(&reservoir, latest.as_ref());
        if let Some(alert) = thresholds::flood_alert(&reservoir, latest.as_ref(), &flood_status) {
            alerts.push(alert);
        }
        let marker = thresholds::marker_style(&reservoir, &flood_status);
        let weather = weather.get_weather(reservoir.latitude, reservoir.longitude);

        reservoirs.push(ReservoirEntry {
            reservoir,
            latest,
            flood_status,
            marker,
            weather,
        });
    }

    debug!("Dashboard: {} reservoirs, {} alerts", reservoirs.len(), alerts.len());

    Ok(DashboardView {
        reservoir_count: reservoirs.len(),
        notice: reservoirs.is_empty().then(|| EMPTY_STORE_NOTICE.to_string()),
        reservoirs,
        alerts,
    })
}

/// History, report and brief for one reservoir. `None` if it does not exist.
pub fn load_detail<S: ReservoirStore + ?Sized>(
    store: &mut S,
    reservoir_id: i32,
) -> Result<Option<ReservoirDetail>, StoreError> {
    let Some(reservoir) = store.find_reservoir(reservoir_id)? else {
        return Ok(None);
    };

    let history = history_for(store, reservoir_id)?;
    let report = report::summarize(&history);
    let brief = report.as_ref().map(|r| report::render_brief(&reservoir.name, r));
    let notice = report.is_none().then(|| NO_HISTORY_NOTICE.to_string());

    Ok(Some(ReservoirDetail {
        reservoir,
        history,
        report,
        brief,
        notice,
    }))
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Validates a form submission and appends it as a new reading stamped now.
///
/// Nothing is written unless every check passes.
pub fn submit_reading<S: ReservoirStore + ?Sized>(
    store: &mut S,
    submission: &ReadingSubmission,
) -> Result<Reading, SubmitError> {
    let reservoir_id = submission.reservoir_id.ok_or(SubmitError::NoReservoirSelected)?;
    check_range("water_level", submission.water_level, WATER_LEVEL_RANGE)?;
    check_range("storage", submission.storage, STORAGE_RANGE)?;

    let stored = store.insert_reading(&NewReading {
        reservoir_id,
        timestamp: None,
        water_level: submission.water_level,
        storage: submission.storage,
    })?;

    info!(
        "Reading {} recorded for reservoir {}: {} m, {} 亿m³",
        stored.id, stored.reservoir_id, stored.water_level, stored.storage
    );
    Ok(stored)
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), SubmitError> {
    // NaN fails both comparisons and is rejected too.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(SubmitError::OutOfRange { field, value, min, max })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
