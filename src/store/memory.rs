/// In-memory `ReservoirStore`.
///
/// Mirrors the PostgreSQL schema rules (unique names, required parent,
/// cascade delete, all-or-nothing seeding) so the query layer can be tested
/// and exercised without a database.

use chrono::{NaiveDateTime, Utc};

use super::{pick_latest, sort_history, ReservoirStore, StoreError};
use crate::model::{NewReading, Reading, Reservoir, SeedReservoir};

#[derive(Debug, Default)]
pub struct MemoryStore {
    reservoirs: Vec<Reservoir>,
    readings: Vec<Reading>,
    next_reservoir_id: i32,
    next_reading_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            reservoirs: Vec::new(),
            readings: Vec::new(),
            next_reservoir_id: 1,
            next_reading_id: 1,
        }
    }

    /// Total readings across all reservoirs.
    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

    /// Readings whose parent reservoir no longer exists. Always zero unless
    /// cascade delete is broken.
    pub fn orphan_reading_count(&self) -> usize {
        self.readings
            .iter()
            .filter(|r| !self.reservoirs.iter().any(|s| s.id == r.reservoir_id))
            .count()
    }

    fn next_reading_id(&mut self) -> i32 {
        let id = self.next_reading_id.max(1);
        self.next_reading_id = id + 1;
        id
    }

    fn next_reservoir_id(&mut self) -> i32 {
        let id = self.next_reservoir_id.max(1);
        self.next_reservoir_id = id + 1;
        id
    }
}

impl ReservoirStore for MemoryStore {
    fn list_reservoirs(&mut self) -> Result<Vec<Reservoir>, StoreError> {
        let mut reservoirs = self.reservoirs.clone();
        reservoirs.sort_by_key(|r| r.id);
        Ok(reservoirs)
    }

    fn find_reservoir(&mut self, id: i32) -> Result<Option<Reservoir>, StoreError> {
        Ok(self.reservoirs.iter().find(|r| r.id == id).cloned())
    }

    fn find_reservoir_by_name(&mut self, name: &str) -> Result<Option<Reservoir>, StoreError> {
        Ok(self.reservoirs.iter().find(|r| r.name == name).cloned())
    }

    fn find_latest_by_reservoir(&mut self, reservoir_id: i32) -> Result<Option<Reading>, StoreError> {
        let latest = pick_latest(self.readings.iter().filter(|r| r.reservoir_id == reservoir_id));
        Ok(latest.cloned())
    }

    fn find_history_by_reservoir(&mut self, reservoir_id: i32) -> Result<Vec<Reading>, StoreError> {
        let mut history: Vec<Reading> = self
            .readings
            .iter()
            .filter(|r| r.reservoir_id == reservoir_id)
            .cloned()
            .collect();
        sort_history(&mut history);
        Ok(history)
    }

    fn insert_reading(&mut self, reading: &NewReading) -> Result<Reading, StoreError> {
        if !self.reservoirs.iter().any(|r| r.id == reading.reservoir_id) {
            return Err(StoreError::UnknownReservoir(reading.reservoir_id));
        }

        let stored = Reading {
            id: self.next_reading_id(),
            reservoir_id: reading.reservoir_id,
            timestamp: reading.timestamp.unwrap_or_else(|| Utc::now().naive_utc()),
            water_level: reading.water_level,
            storage: reading.storage,
        };
        self.readings.push(stored.clone());
        Ok(stored)
    }

    fn count_reservoirs(&mut self) -> Result<i64, StoreError> {
        Ok(self.reservoirs.len() as i64)
    }

    fn seed(&mut self, reservoirs: &[SeedReservoir], at: NaiveDateTime) -> Result<usize, StoreError> {
        // Validate the whole batch before touching state so a failure
        // leaves nothing behind.
        for (i, seed) in reservoirs.iter().enumerate() {
            let clashes_existing = self.reservoirs.iter().any(|r| r.name == seed.name);
            let clashes_batch = reservoirs[..i].iter().any(|s| s.name == seed.name);
            if clashes_existing || clashes_batch {
                return Err(StoreError::DuplicateName(seed.name.clone()));
            }
        }

        for seed in reservoirs {
            let reservoir = Reservoir {
                id: self.next_reservoir_id(),
                name: seed.name.clone(),
                longitude: seed.longitude,
                latitude: seed.latitude,
                flood_limit_level: seed.flood_limit_level,
                design_capacity: seed.design_capacity,
            };

            if let Some(initial) = &seed.initial_reading {
                let id = self.next_reading_id();
                self.readings.push(Reading {
                    id,
                    reservoir_id: reservoir.id,
                    timestamp: at,
                    water_level: initial.water_level,
                    storage: initial.storage,
                });
            }
            self.reservoirs.push(reservoir);
        }

        Ok(reservoirs.len())
    }

    fn delete_cascade(&mut self, reservoir_id: i32) -> Result<bool, StoreError> {
        let before = self.reservoirs.len();
        self.reservoirs.retain(|r| r.id != reservoir_id);
        if self.reservoirs.len() == before {
            return Ok(false);
        }
        self.readings.retain(|r| r.reservoir_id != reservoir_id);
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
