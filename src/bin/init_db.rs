//! Database initialization for the reservoir registry.
//!
//! Creates the `reservoirs` and `readings` tables if they are missing, then
//! seeds the reservoirs listed in `reservoirs.toml` together with one initial
//! reading each. Seeding is skipped when the table already holds reservoirs,
//! so running this twice is harmless.
//!
//! Usage:
//!   cargo run --bin init_db

use chrono::Utc;
use resmon_service::config::{self, SECRETS_PATH, SEED_REGISTRY_PATH};
use resmon_service::db::{self, PgStore};
use resmon_service::seed::{self, SeedOutcome};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🗄️  Reservoir Database Initialization");
    println!("====================================\n");

    if let Err(e) = run() {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_url = config::resolve_database_url(SECRETS_PATH)?;

    println!("📊 Connecting to database...");
    let mut client = db::connect(&db_url)?;
    db::ensure_schema(&mut client)?;
    println!("✓ Schema ready (reservoirs, readings)");

    let registry = config::load_seed_registry(SEED_REGISTRY_PATH)?;
    println!("📋 Loaded {} reservoirs from {}", registry.len(), SEED_REGISTRY_PATH);

    let mut store = PgStore::from_client(client);
    match seed::seed_if_empty(&mut store, &registry, Utc::now().naive_utc())? {
        SeedOutcome::AlreadyPopulated { existing } => {
            println!("ℹ️  Database already holds {} reservoirs, seed skipped", existing);
        }
        SeedOutcome::Seeded { reservoirs } => {
            println!("✅ Seeded {} reservoirs with initial readings", reservoirs);
        }
    }

    Ok(())
}
