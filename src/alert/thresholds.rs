/// Flood-limit threshold checking.
///
/// `evaluate` is called once per reservoir per dashboard request. Its result
/// feeds both the global alert list (`flood_alert`) and the map marker
/// styling (`marker_style`), so the two can never disagree.

use serde::Serialize;

use crate::model::{Reading, Reservoir};

/// Outcome of comparing a reservoir's latest reading to its flood limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloodLimitStatus {
    pub is_over_limit: bool,
    /// Meters above the limit, rounded to 2 decimals. `None` unless over limit.
    pub over_by: Option<f64>,
}

impl FloodLimitStatus {
    pub const NORMAL: FloodLimitStatus = FloodLimitStatus { is_over_limit: false, over_by: None };
}

/// A reservoir currently above its flood-limit level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodAlert {
    pub reservoir_id: i32,
    pub reservoir_name: String,
    pub current_level: f64,
    pub over_by: f64,
    pub message: String,
}

/// Map marker presentation for a reservoir.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub icon: &'static str,
    pub tooltip: String,
}

/// Checks whether the latest reading exceeds the reservoir's flood limit.
///
/// Equality with the limit is not a breach. A reservoir without a limit, or
/// without any reading, is always normal.
pub fn evaluate(reservoir: &Reservoir, latest: Option<&Reading>) -> FloodLimitStatus {
    let (Some(limit), Some(reading)) = (reservoir.flood_limit_level, latest) else {
        return FloodLimitStatus::NORMAL;
    };

    if reading.water_level > limit {
        FloodLimitStatus {
            is_over_limit: true,
            over_by: Some(round2(reading.water_level - limit)),
        }
    } else {
        FloodLimitStatus::NORMAL
    }
}

/// Builds the global alert entry for a breaching reservoir.
pub fn flood_alert(
    reservoir: &Reservoir,
    latest: Option<&Reading>,
    status: &FloodLimitStatus,
) -> Option<FloodAlert> {
    let over_by = status.over_by.filter(|_| status.is_over_limit)?;
    let current_level = latest?.water_level;

    Some(FloodAlert {
        reservoir_id: reservoir.id,
        reservoir_name: reservoir.name.clone(),
        current_level,
        over_by,
        message: format!(
            "⚠️ 警报：【{}】当前水位 {} m，超汛限 {} m！",
            reservoir.name,
            display_meters(current_level),
            display_meters(over_by)
        ),
    })
}

pub fn marker_style(reservoir: &Reservoir, status: &FloodLimitStatus) -> MarkerStyle {
    if status.is_over_limit {
        MarkerStyle {
            color: "red",
            icon: "exclamation-triangle",
            tooltip: format!("⚠️ {} - 超汛限！", reservoir.name),
        }
    } else {
        MarkerStyle {
            color: "blue",
            icon: "tint",
            tooltip: reservoir.name.clone(),
        }
    }
}

/// Rounds to 2 decimals, exact halves to even (0.125 -> 0.12).
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Shortest representation, but whole numbers keep one decimal (`160.0`).
fn display_meters(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reservoir(limit: Option<f64>) -> Reservoir {
        Reservoir {
            id: 1,
            name: "三峡水库".to_string(),
            longitude: 111.003,
            latitude: 30.823,
            flood_limit_level: limit,
            design_capacity: Some(393.0),
        }
    }

    fn reading(level: f64) -> Reading {
        Reading {
            id: 1,
            reservoir_id: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            water_level: level,
            storage: 300.0,
        }
    }

    #[test]
    fn test_exactly_at_limit_is_not_over() {
        let status = evaluate(&reservoir(Some(145.0)), Some(&reading(145.0)));
        assert_eq!(status, FloodLimitStatus::NORMAL, "equality at the threshold is not a breach");
    }

    #[test]
    fn test_just_above_limit_is_over() {
        let status = evaluate(&reservoir(Some(145.0)), Some(&reading(145.01)));
        assert!(status.is_over_limit);
        assert_eq!(status.over_by, Some(0.01));
    }

    #[test]
    fn test_over_by_is_rounded_to_two_decimals() {
        let status = evaluate(&reservoir(Some(157.0)), Some(&reading(158.456)));
        assert!(status.is_over_limit);
        assert_eq!(status.over_by, Some(1.46));
    }

    #[test]
    fn test_over_by_half_rounds_to_even() {
        let status = evaluate(&reservoir(Some(145.0)), Some(&reading(145.125)));
        assert_eq!(status.over_by, Some(0.12), "0.125 rounds down to the even digit");

        let status = evaluate(&reservoir(Some(145.0)), Some(&reading(145.375)));
        assert_eq!(status.over_by, Some(0.38), "0.375 rounds up to the even digit");
    }

    #[test]
    fn test_flood_alert_message_keeps_fractional_digits() {
        let r = reservoir(Some(145.0));
        let latest = reading(145.125);
        let status = evaluate(&r, Some(&latest));

        let alert = flood_alert(&r, Some(&latest), &status).expect("breach should produce an alert");
        assert_eq!(alert.message, "⚠️ 警报：【三峡水库】当前水位 145.125 m，超汛限 0.12 m！");
    }

    #[test]
    fn test_below_limit_is_normal() {
        let status = evaluate(&reservoir(Some(275.0)), Some(&reading(270.0)));
        assert_eq!(status, FloodLimitStatus::NORMAL);
    }

    #[test]
    fn test_no_limit_configured_is_normal() {
        let status = evaluate(&reservoir(None), Some(&reading(999.0)));
        assert_eq!(status, FloodLimitStatus::NORMAL);
    }

    #[test]
    fn test_no_reading_is_normal_regardless_of_limit() {
        assert_eq!(evaluate(&reservoir(Some(145.0)), None), FloodLimitStatus::NORMAL);
        assert_eq!(evaluate(&reservoir(Some(-1.0)), None), FloodLimitStatus::NORMAL);
        assert_eq!(evaluate(&reservoir(None), None), FloodLimitStatus::NORMAL);
    }

    #[test]
    fn test_flood_alert_message() {
        let r = reservoir(Some(145.0));
        let latest = reading(160.0);
        let status = evaluate(&r, Some(&latest));

        let alert = flood_alert(&r, Some(&latest), &status).expect("breach should produce an alert");
        assert_eq!(alert.over_by, 15.0);
        assert_eq!(alert.current_level, 160.0);
        assert_eq!(alert.message, "⚠️ 警报：【三峡水库】当前水位 160.0 m，超汛限 15.0 m！");
    }

    #[test]
    fn test_no_alert_when_normal() {
        let r = reservoir(Some(145.0));
        let latest = reading(140.0);
        let status = evaluate(&r, Some(&latest));
        assert!(flood_alert(&r, Some(&latest), &status).is_none());
    }

    #[test]
    fn test_marker_style_follows_status() {
        let r = reservoir(Some(145.0));
        let over = evaluate(&r, Some(&reading(150.0)));
        let normal = evaluate(&r, Some(&reading(140.0)));

        let red = marker_style(&r, &over);
        assert_eq!(red.color, "red");
        assert_eq!(red.icon, "exclamation-triangle");
        assert_eq!(red.tooltip, "⚠️ 三峡水库 - 超汛限！");

        let blue = marker_style(&r, &normal);
        assert_eq!(blue.color, "blue");
        assert_eq!(blue.tooltip, "三峡水库");
    }
}
