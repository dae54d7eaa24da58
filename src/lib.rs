/// resmon_service: reservoir water-level monitoring service.
///
/// # Module structure
///
/// ```text
/// resmon_service
/// ├── model       - shared data types (Reservoir, Reading, NewReading, SeedReservoir)
/// ├── config      - settings (resmon.toml), seed registry (reservoirs.toml), database URL
/// ├── db          - PostgreSQL connection/validation and PgStore
/// ├── store       - ReservoirStore repository trait, latest-reading tie-break
/// │   └── memory  - in-process store with the same schema rules
/// ├── seed        - all-or-nothing first-run seeding
/// ├── weather     - per-coordinate TTL cache with injected clock
/// ├── ingest
/// │   ├── open_meteo - Open-Meteo forecast API: URL construction + JSON parsing
/// │   └── fixtures (test only) - representative API response payloads
/// ├── alert
/// │   └── thresholds - flood-limit breach evaluation, alerts, marker styling
/// ├── analysis
/// │   └── report  - history summary (extremes, latest, trend) and text brief
/// ├── export      - CSV export with BOM and fixed header
/// ├── dashboard   - query/aggregation layer: dashboard view, detail, submission
/// └── endpoint    - HTTP API over the dashboard layer
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod endpoint;
pub mod export;
pub mod ingest;
pub mod model;
pub mod seed;
pub mod store;
pub mod weather;
