/// Test fixtures: representative JSON payloads from the Open-Meteo forecast API.
///
/// Response shape for `current_weather=true`:
///   latitude, longitude, generationtime_ms, utc_offset_seconds, timezone,
///   elevation
///   current_weather
///     .temperature    - °C, number
///     .windspeed      - km/h
///     .winddirection  - degrees
///     .weathercode    - WMO code, integer
///     .is_day         - 0/1
///     .time           - ISO 8601 local time, minute resolution

/// Three Gorges dam site, light rain (WMO 61).
pub(crate) fn fixture_three_gorges_forecast_json() -> &'static str {
    r#"{
      "latitude": 30.8125,
      "longitude": 111.0,
      "generationtime_ms": 0.0629425048828125,
      "utc_offset_seconds": 0,
      "timezone": "GMT",
      "timezone_abbreviation": "GMT",
      "elevation": 78.0,
      "current_weather_units": {
        "time": "iso8601",
        "interval": "seconds",
        "temperature": "°C",
        "windspeed": "km/h",
        "winddirection": "°",
        "is_day": "",
        "weathercode": "wmo code"
      },
      "current_weather": {
        "time": "2024-07-01T08:00",
        "interval": 900,
        "temperature": 27.4,
        "windspeed": 6.8,
        "winddirection": 72,
        "is_day": 1,
        "weathercode": 61
      }
    }"#
}

/// Forecast request made without `current_weather=true`.
pub(crate) fn fixture_forecast_without_current_json() -> &'static str {
    r#"{
      "latitude": 32.625,
      "longitude": 111.5,
      "generationtime_ms": 0.0011920928955078125,
      "utc_offset_seconds": 0,
      "timezone": "GMT",
      "elevation": 160.0
    }"#
}

/// `current_weather` block present but with a null temperature.
pub(crate) fn fixture_forecast_null_temperature_json() -> &'static str {
    r#"{
      "latitude": 34.875,
      "longitude": 112.5,
      "current_weather": {
        "time": "2024-07-01T08:00",
        "temperature": null,
        "windspeed": 3.1,
        "weathercode": 0
      }
    }"#
}
