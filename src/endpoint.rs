/// HTTP endpoint for the reservoir dashboard
///
/// Serves the data behind the map, sidebar, charts, brief and export as a
/// small JSON/CSV API. Requests are handled one at a time; each request
/// opens its own store session and drops it before the next one.
///
/// Endpoints:
/// - GET  /health                        - Service health check
/// - GET  /reservoirs                    - Dashboard view (latest, alerts, weather)
/// - GET  /reservoirs/{id}               - History, report and brief
/// - GET  /reservoirs/{id}/export.csv    - History as CSV
/// - POST /readings                      - Submit a reading, returns refreshed dashboard

use std::io::{Cursor, Read};

use log::{error, info, warn};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::dashboard::{self, ReadingSubmission, SubmitError};
use crate::db::DbConfigError;
use crate::export;
use crate::store::{ReservoirStore, StoreError};
use crate::weather::{Clock, WeatherCache, WeatherSource};

const AVAILABLE_ENDPOINTS: [&str; 5] = [
    "GET /health",
    "GET /reservoirs",
    "GET /reservoirs/{id}",
    "GET /reservoirs/{id}/export.csv",
    "POST /readings",
];

// ---------------------------------------------------------------------------
// Response Type
// ---------------------------------------------------------------------------

/// Transport-independent response produced by `route`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// `Content-Disposition` value for downloads.
    pub disposition: Option<String>,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec_pretty(value) {
            Ok(body) => ApiResponse {
                status,
                content_type: "application/json",
                body,
                disposition: None,
            },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                ApiResponse {
                    status: 500,
                    content_type: "text/plain; charset=utf-8",
                    body: b"internal serialization error".to_vec(),
                    disposition: None,
                }
            }
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &serde_json::json!({ "error": message.into() }))
    }

    /// Body parsed as JSON, for inspection in tests and tooling.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes one request against an open store session.
pub fn route<S, W, C>(
    store: &mut S,
    weather: &mut WeatherCache<W, C>,
    method: &Method,
    path: &str,
    body: &str,
) -> ApiResponse
where
    S: ReservoirStore + ?Sized,
    W: WeatherSource,
    C: Clock,
{
    let segments: Vec<&str> = path
        .split('?')
        .next()
        .unwrap_or_default()
        .trim_matches('/')
        .split('/')
        .collect();

    match (method, segments.as_slice()) {
        (Method::Get, ["health"]) => handle_health(),
        (Method::Get, ["reservoirs"]) => handle_dashboard(store, weather),
        (Method::Get, ["reservoirs", id]) => match id.parse() {
            Ok(id) => handle_detail(store, id),
            Err(_) => ApiResponse::error(400, format!("Invalid reservoir id: {}", id)),
        },
        (Method::Get, ["reservoirs", id, "export.csv"]) => match id.parse() {
            Ok(id) => handle_export(store, id),
            Err(_) => ApiResponse::error(400, format!("Invalid reservoir id: {}", id)),
        },
        (Method::Post, ["readings"]) => handle_submit(store, weather, body),
        _ => ApiResponse::json(
            404,
            &serde_json::json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        ),
    }
}

/// Handle /health endpoint
fn handle_health() -> ApiResponse {
    ApiResponse::json(
        200,
        &serde_json::json!({
            "status": "ok",
            "service": "resmon_service",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn handle_dashboard<S, W, C>(store: &mut S, weather: &mut WeatherCache<W, C>) -> ApiResponse
where
    S: ReservoirStore + ?Sized,
    W: WeatherSource,
    C: Clock,
{
    match dashboard::load_dashboard(store, weather) {
        Ok(view) => ApiResponse::json(200, &view),
        Err(e) => store_failure(e),
    }
}

fn handle_detail<S: ReservoirStore + ?Sized>(store: &mut S, reservoir_id: i32) -> ApiResponse {
    match dashboard::load_detail(store, reservoir_id) {
        Ok(Some(detail)) => ApiResponse::json(200, &detail),
        Ok(None) => ApiResponse::error(404, format!("Reservoir {} not found", reservoir_id)),
        Err(e) => store_failure(e),
    }
}

fn handle_export<S: ReservoirStore + ?Sized>(store: &mut S, reservoir_id: i32) -> ApiResponse {
    let reservoir = match store.find_reservoir(reservoir_id) {
        Ok(Some(reservoir)) => reservoir,
        Ok(None) => return ApiResponse::error(404, format!("Reservoir {} not found", reservoir_id)),
        Err(e) => return store_failure(e),
    };

    let history = match dashboard::history_for(store, reservoir_id) {
        Ok(history) => history,
        Err(e) => return store_failure(e),
    };
    if history.is_empty() {
        return ApiResponse::error(404, dashboard::NO_HISTORY_NOTICE);
    }

    match export::history_to_csv(&history) {
        Ok(body) => ApiResponse {
            status: 200,
            content_type: "text/csv; charset=utf-8",
            body,
            disposition: Some(content_disposition(reservoir_id, &reservoir.name)),
        },
        Err(e) => {
            error!("CSV export failed for reservoir {}: {}", reservoir_id, e);
            ApiResponse::error(500, e.to_string())
        }
    }
}

fn handle_submit<S, W, C>(store: &mut S, weather: &mut WeatherCache<W, C>, body: &str) -> ApiResponse
where
    S: ReservoirStore + ?Sized,
    W: WeatherSource,
    C: Clock,
{
    let submission: ReadingSubmission = match serde_json::from_str(body) {
        Ok(submission) => submission,
        Err(e) => return ApiResponse::error(400, format!("Invalid reading form: {}", e)),
    };

    let reading = match dashboard::submit_reading(store, &submission) {
        Ok(reading) => reading,
        Err(e @ (SubmitError::NoReservoirSelected | SubmitError::OutOfRange { .. })) => {
            return ApiResponse::error(400, e.to_string());
        }
        Err(SubmitError::Store(e @ StoreError::UnknownReservoir(_))) => {
            return ApiResponse::error(404, e.to_string());
        }
        Err(SubmitError::Store(e)) => return store_failure(e),
    };

    // Explicit refresh of the view the form was submitted from.
    match dashboard::load_dashboard(store, weather) {
        Ok(view) => ApiResponse::json(
            201,
            &serde_json::json!({
                "message": "更新成功！",
                "reading": reading,
                "dashboard": view,
            }),
        ),
        Err(e) => store_failure(e),
    }
}

fn store_failure(e: StoreError) -> ApiResponse {
    error!("Store error: {}", e);
    ApiResponse::error(500, e.to_string())
}

/// Attachment header with an ASCII fallback and the UTF-8 reservoir name.
fn content_disposition(reservoir_id: i32, reservoir_name: &str) -> String {
    format!(
        "attachment; filename=\"reservoir_{}_history.csv\"; filename*=UTF-8''{}",
        reservoir_id,
        urlencoding::encode(&export::export_file_name(reservoir_name))
    )
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port
///
/// `open_session` is called once per request (except /health); the session
/// is dropped, closing its connection, before the response is sent.
pub fn start_endpoint_server<S, F, W, C>(
    port: u16,
    mut open_session: F,
    weather: &mut WeatherCache<W, C>,
) -> Result<(), String>
where
    S: ReservoirStore,
    F: FnMut() -> Result<S, DbConfigError>,
    W: WeatherSource,
    C: Clock,
{
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!("HTTP endpoint listening on http://0.0.0.0:{}", port);
    for endpoint in AVAILABLE_ENDPOINTS {
        info!("   {}", endpoint);
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let path = request.url().to_string();

        let mut body = String::new();
        let response = if let Err(e) = request.as_reader().read_to_string(&mut body) {
            ApiResponse::error(400, format!("Unreadable request body: {}", e))
        } else if path == "/health" {
            handle_health()
        } else {
            match open_session() {
                Ok(mut store) => route(&mut store, weather, &method, &path, &body),
                Err(e) => {
                    error!("Failed to open store session: {}", e);
                    ApiResponse::error(503, "Database unavailable")
                }
            }
        };

        info!("{} {} -> {}", method, path, response.status);
        respond(request, response);
    }

    Ok(())
}

fn respond(request: Request, response: ApiResponse) {
    if let Err(e) = request.respond(to_tiny_response(response)) {
        warn!("Failed to send response: {}", e);
    }
}

/// Convert an `ApiResponse` into a tiny_http response with headers
fn to_tiny_response(response: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let mut tiny = Response::from_data(response.body).with_status_code(StatusCode(response.status));

    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
        tiny = tiny.with_header(header);
    }
    if let Some(disposition) = response.disposition {
        if let Ok(header) = Header::from_bytes(&b"Content-Disposition"[..], disposition.as_bytes()) {
            tiny = tiny.with_header(header);
        }
    }
    tiny
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SeedReading, SeedReservoir};
    use crate::store::memory::MemoryStore;
    use crate::weather::{CurrentWeather, ManualClock, WeatherError};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    struct Offline;

    impl WeatherSource for Offline {
        fn fetch_current(&self, _latitude: f64, _longitude: f64) -> Result<CurrentWeather, WeatherError> {
            Err(WeatherError::Parse("offline".to_string()))
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .seed(
                &[
                    SeedReservoir {
                        name: "三峡水库".to_string(),
                        longitude: 111.003,
                        latitude: 30.823,
                        flood_limit_level: Some(145.0),
                        design_capacity: Some(393.0),
                        initial_reading: Some(SeedReading { water_level: 160.0, storage: 300.0 }),
                    },
                    SeedReservoir {
                        name: "空水库".to_string(),
                        longitude: 112.0,
                        latitude: 31.0,
                        flood_limit_level: None,
                        design_capacity: None,
                        initial_reading: None,
                    },
                ],
                NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            )
            .unwrap();
        store
    }

    fn get(store: &mut MemoryStore, path: &str) -> ApiResponse {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        let mut weather = WeatherCache::with_clock(Offline, &clock, Duration::seconds(600));
        route(store, &mut weather, &Method::Get, path, "")
    }

    fn post(store: &mut MemoryStore, path: &str, body: &str) -> ApiResponse {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        let mut weather = WeatherCache::with_clock(Offline, &clock, Duration::seconds(600));
        route(store, &mut weather, &Method::Post, path, body)
    }

    #[test]
    fn test_health() {
        let response = get(&mut store(), "/health");
        assert_eq!(response.status, 200);
        assert_eq!(response.json_body().unwrap()["status"], "ok");
    }

    #[test]
    fn test_dashboard_route_degrades_weather_to_no_data() {
        let response = get(&mut store(), "/reservoirs");
        assert_eq!(response.status, 200);

        let json = response.json_body().unwrap();
        assert_eq!(json["reservoir_count"], 2);
        assert_eq!(json["alerts"][0]["reservoir_name"], "三峡水库");
        assert_eq!(json["reservoirs"][0]["weather"]["error"], "no data");
        assert!(json["reservoirs"][1]["latest"].is_null());
    }

    #[test]
    fn test_query_string_is_ignored() {
        assert_eq!(get(&mut store(), "/reservoirs?refresh=1").status, 200);
    }

    #[test]
    fn test_detail_routes() {
        let mut store = store();
        let found = get(&mut store, "/reservoirs/1");
        assert_eq!(found.status, 200);
        assert_eq!(found.json_body().unwrap()["report"]["trend"], "indeterminate");

        assert_eq!(get(&mut store, "/reservoirs/99").status, 404);
        assert_eq!(get(&mut store, "/reservoirs/abc").status, 400);
    }

    #[test]
    fn test_export_route() {
        let mut store = store();
        let response = get(&mut store, "/reservoirs/1/export.csv");

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "text/csv; charset=utf-8");
        assert!(response.body.starts_with(export::UTF8_BOM));
        let disposition = response.disposition.expect("download should carry a file name");
        assert!(disposition.starts_with("attachment; filename=\"reservoir_1_history.csv\""));
        assert!(disposition.contains("filename*=UTF-8''%E4%B8%89"));

        assert_eq!(get(&mut store, "/reservoirs/2/export.csv").status, 404, "no history, no export");
    }

    #[test]
    fn test_submit_route() {
        let mut store = store();

        let created = post(&mut store, "/readings", r#"{"reservoir_id": 2, "water_level": 100.0, "storage": 50.0}"#);
        assert_eq!(created.status, 201);
        let json = created.json_body().unwrap();
        assert_eq!(json["reading"]["reservoir_id"], 2);
        assert_eq!(json["dashboard"]["reservoirs"][1]["latest"]["water_level"], 100.0);

        let missing = post(&mut store, "/readings", r#"{"reservoir_id": null, "water_level": 100.0, "storage": 50.0}"#);
        assert_eq!(missing.status, 400);
        assert_eq!(missing.json_body().unwrap()["error"], "请先选择水库！");

        let unknown = post(&mut store, "/readings", r#"{"reservoir_id": 9, "water_level": 100.0, "storage": 50.0}"#);
        assert_eq!(unknown.status, 404);

        assert_eq!(post(&mut store, "/readings", "not json").status, 400);
        assert_eq!(store.reading_count(), 2, "only the valid submission is stored");
    }

    #[test]
    fn test_unknown_route() {
        let response = get(&mut store(), "/stations");
        assert_eq!(response.status, 404);
        assert_eq!(response.json_body().unwrap()["available_endpoints"][0], "GET /health");
    }
}
