/// Open-Meteo Forecast API Client
///
/// Retrieves current temperature and WMO weather code for a coordinate.
/// Only the `current_weather` block of the response is used.
///
/// API Documentation: https://open-meteo.com/en/docs
/// Request: GET /v1/forecast?latitude=..&longitude=..&current_weather=true

use std::time::Duration;

use serde::Deserialize;

use crate::weather::{CurrentWeather, WeatherError, WeatherSource};

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeatherBlock,
}

/// `current_weather` object. Other fields (windspeed, time, ...) are ignored.
#[derive(Debug, Deserialize)]
struct CurrentWeatherBlock {
    temperature: f64,
    weathercode: i32,
}

// ============================================================================
// API Client
// ============================================================================

/// Blocking client for the forecast endpoint.
pub struct OpenMeteoClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Builds a client with the given base URL and request timeout.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, WeatherError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn forecast_url(&self, latitude: f64, longitude: f64) -> String {
        build_forecast_url(&self.base_url, latitude, longitude)
    }
}

impl WeatherSource for OpenMeteoClient {
    fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather, WeatherError> {
        let url = self.forecast_url(latitude, longitude);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body = response.text()?;
        parse_forecast_response(&body)
    }
}

/// Forecast request URL for a coordinate.
pub fn build_forecast_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}/v1/forecast?latitude={}&longitude={}&current_weather=true",
        base_url.trim_end_matches('/'),
        latitude,
        longitude
    )
}

/// Parses a forecast response body into current conditions.
///
/// A missing `current_weather` block, or a block lacking `temperature` or
/// `weathercode`, is a parse error: partial data is treated as no data.
pub fn parse_forecast_response(json: &str) -> Result<CurrentWeather, WeatherError> {
    let response: ForecastResponse =
        serde_json::from_str(json).map_err(|e| WeatherError::Parse(e.to_string()))?;

    Ok(CurrentWeather {
        temperature: response.current_weather.temperature,
        condition_code: response.current_weather.weathercode,
    })
}

// ============================================================================
// Tests
// ============================================================================
