/// Water-condition report for a single reservoir.
///
/// `summarize` reduces an ascending history to the handful of figures shown
/// in the brief: latest observation, historical extremes, and the direction
/// of the most recent change.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::Reading;

/// Display format for report timestamps.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Direction of the last change in water level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
    /// Fewer than two readings; there is no previous value to compare with.
    Indeterminate,
}

impl Trend {
    fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Rising
        } else if change < 0.0 {
            Trend::Falling
        } else {
            Trend::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Flat => "flat",
            Trend::Indeterminate => "indeterminate",
        }
    }

    /// Label used in the brief.
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Rising => "📈 上涨",
            Trend::Falling => "📉 下落",
            Trend::Flat => "➖ 持平",
            Trend::Indeterminate => "➖ 无法判断",
        }
    }
}

/// Summary figures for a non-empty history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub latest_time: NaiveDateTime,
    pub latest_level: f64,
    pub latest_storage: f64,
    pub max_level: f64,
    pub min_level: f64,
    pub trend: Trend,
    /// Last level minus the previous one. `None` with fewer than two
    /// readings, which is not the same thing as a change of 0.0.
    pub change_value: Option<f64>,
}

impl Report {
    /// Signed change for display: `+2.5`, `-1.0`, `0.0`, or an
    /// insufficient-data marker.
    pub fn change_text(&self) -> String {
        match self.change_value {
            Some(change) if change > 0.0 => format!("+{:.1}", change),
            Some(change) if change < 0.0 => format!("{:.1}", change),
            Some(_) => "0.0".to_string(),
            None => "N/A（数据不足）".to_string(),
        }
    }
}

/// Summarizes a history sorted ascending by timestamp.
///
/// Returns `None` for an empty history so callers cannot mistake "no data"
/// for real figures.
pub fn summarize(history: &[Reading]) -> Option<Report> {
    let latest = history.last()?;

    let (max_level, min_level) = history.iter().fold(
        (f64::NEG_INFINITY, f64::INFINITY),
        |(max, min), r| (max.max(r.water_level), min.min(r.water_level)),
    );

    let change_value = match history {
        [.., previous, last] => Some(last.water_level - previous.water_level),
        _ => None,
    };
    let trend = change_value.map_or(Trend::Indeterminate, Trend::from_change);

    Some(Report {
        latest_time: latest.timestamp,
        latest_level: latest.water_level,
        latest_storage: latest.storage,
        max_level,
        min_level,
        trend,
        change_value,
    })
}

/// Renders the markdown water-condition brief for a reservoir.
pub fn render_brief(reservoir_name: &str, report: &Report) -> String {
    format!(
        "### 【{name}】水情简报\n\
         - **截止时间**: {time}\n\
         - **当前运行水位**: {level:.1} m\n\
         - **历史最高**: {max:.1} m\n\
         - **历史最低**: {min:.1} m\n\
         - **近期水势**: {trend} (较上期变化 {change} m)\n\
         - **当前库容**: {storage:.1} 亿m³\n",
        name = reservoir_name,
        time = report.latest_time.format(REPORT_TIME_FORMAT),
        level = report.latest_level,
        max = report.max_level,
        min = report.min_level,
        trend = report.trend.label(),
        change = report.change_text(),
        storage = report.latest_storage,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
