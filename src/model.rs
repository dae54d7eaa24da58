/// Core data types for the reservoir monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only plain records mirroring the `reservoirs` and
/// `readings` tables.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// A managed water-storage facility.
///
/// `flood_limit_level` is `None` when no threshold is configured; such a
/// reservoir can never be in breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    pub id: i32,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub flood_limit_level: Option<f64>,  // m
    pub design_capacity: Option<f64>,    // 亿m³, informational only
}

/// One timestamped observation of water level and storage.
///
/// Readings are append-only; nothing in the service updates or deletes a
/// single reading (only `delete_cascade` on the owning reservoir).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i32,
    pub reservoir_id: i32,
    pub timestamp: NaiveDateTime,  // UTC wall-clock
    pub water_level: f64,          // m
    pub storage: f64,              // 亿m³
}

/// A reading not yet persisted. `timestamp: None` means "now".
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub reservoir_id: i32,
    pub timestamp: Option<NaiveDateTime>,
    pub water_level: f64,
    pub storage: f64,
}

// ---------------------------------------------------------------------------
// Seed registry types
// ---------------------------------------------------------------------------

/// Reservoir definition loaded from `reservoirs.toml` for initialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedReservoir {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub flood_limit_level: Option<f64>,
    pub design_capacity: Option<f64>,
    pub initial_reading: Option<SeedReading>,
}

/// Initial observation stored alongside a seeded reservoir.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedReading {
    pub water_level: f64,
    pub storage: f64,
}
