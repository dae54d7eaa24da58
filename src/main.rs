//! Reservoir Monitoring Service - Dashboard Endpoint
//!
//! Serves the reservoir dashboard API:
//! 1. Latest reading per reservoir with flood-limit alerts
//! 2. Current weather per reservoir (cached for 10 minutes)
//! 3. Reading history, water-condition brief and CSV export
//! 4. Reading submission
//!
//! Usage:
//!   cargo run --release                  # Listen on the port from resmon.toml (default 8080)
//!   cargo run --release -- --port 9000   # Override the port
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (if .secrets.toml has no db_url)
//!   RUST_LOG     - log level (default: info)

use resmon_service::config::{self, SECRETS_PATH, SETTINGS_PATH};
use resmon_service::db::{self, PgStore};
use resmon_service::endpoint;
use resmon_service::ingest::open_meteo::OpenMeteoClient;
use resmon_service::weather::WeatherCache;
use std::env;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("💧 Reservoir Monitoring Service");
    println!("================================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                match args.get(i + 1).and_then(|p| p.parse().ok()) {
                    Some(port) => port_override = Some(port),
                    None => {
                        eprintln!("Error: --port requires a port number");
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let settings = config::load_settings(SETTINGS_PATH).unwrap_or_else(|e| {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    });
    let port = port_override.unwrap_or(settings.listen_port);

    // Missing database configuration is fatal
    let db_url = config::resolve_database_url(SECRETS_PATH).unwrap_or_else(|e| {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    });

    // Validate once at startup; requests open their own sessions afterwards
    println!("📊 Checking database...");
    match db::connect_and_verify(&db_url) {
        Ok(client) => drop(client),
        Err(e) => {
            eprintln!("\n❌ {}\n", e);
            std::process::exit(1);
        }
    }
    println!("✓ Database ready\n");

    let weather_client = OpenMeteoClient::new(&settings.weather.base_url, settings.weather.timeout_secs)
        .unwrap_or_else(|e| {
            eprintln!("\n❌ Failed to build weather client: {}\n", e);
            std::process::exit(1);
        });
    let ttl = settings.weather.cache_ttl().unwrap_or_else(|e| {
        eprintln!("\n❌ {} in {}\n", e, SETTINGS_PATH);
        std::process::exit(1);
    });
    let mut weather = WeatherCache::new(weather_client, ttl);

    println!("🚀 Starting HTTP endpoint on port {}...", port);
    println!("   Weather cache TTL: {} s", settings.weather.cache_ttl_secs);
    println!("   Press Ctrl+C to stop\n");

    let open_session = || PgStore::open(&db_url);
    if let Err(e) = endpoint::start_endpoint_server(port, open_session, &mut weather) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
