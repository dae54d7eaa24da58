//! Offline history export for one reservoir.
//!
//! Writes the same CSV the dashboard download produces (UTF-8 BOM, fixed
//! header, ascending by time) without going through the HTTP endpoint.
//!
//! Usage:
//!   cargo run --bin export_history -- <reservoir name> [output path]
//!
//! The output path defaults to `<reservoir name>_history.csv`.

use resmon_service::config::{self, SECRETS_PATH};
use resmon_service::db::PgStore;
use resmon_service::export;
use resmon_service::store::ReservoirStore;
use std::env;
use std::fs;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let Some(name) = args.get(1) else {
        eprintln!("Usage: {} <reservoir name> [output path]", args[0]);
        std::process::exit(1);
    };
    let output = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| export::export_file_name(name));

    if let Err(e) = run(name, &output) {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    }
}

fn run(name: &str, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = config::resolve_database_url(SECRETS_PATH)?;
    let mut store = PgStore::open(&db_url)?;

    let reservoir = store
        .find_reservoir_by_name(name)?
        .ok_or_else(|| format!("No reservoir named {}", name))?;

    let history = store.find_history_by_reservoir(reservoir.id)?;
    if history.is_empty() {
        println!("⚠️  {} has no readings; writing header only", reservoir.name);
    }

    let bytes = export::history_to_csv(&history)?;
    fs::write(output, bytes)?;

    println!("✅ Exported {} readings for {} to {}", history.len(), reservoir.name, output);
    Ok(())
}
