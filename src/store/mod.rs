/// Repository interface over the reservoir schema.
///
/// Two implementations exist:
/// - `db::PgStore` - PostgreSQL, one client per session
/// - `store::memory::MemoryStore` - in-process, used by tests and tooling
///
/// Every method takes `&mut self` because a `postgres::Client` needs a
/// mutable borrow to run queries.

pub mod memory;

use thiserror::Error;

use crate::model::{NewReading, Reading, Reservoir, SeedReservoir};

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or connection failure in the underlying database.
    #[error("Database query failed: {0}")]
    Database(#[from] postgres::Error),

    /// A reading referenced a reservoir id that does not exist.
    #[error("Reservoir {0} does not exist")]
    UnknownReservoir(i32),

    /// Reservoir names are unique.
    #[error("Reservoir name already exists: {0}")]
    DuplicateName(String),
}

/// Explicit repository functions over `reservoirs` and `readings`.
pub trait ReservoirStore {
    /// All reservoirs, ascending by id.
    fn list_reservoirs(&mut self) -> Result<Vec<Reservoir>, StoreError>;

    fn find_reservoir(&mut self, id: i32) -> Result<Option<Reservoir>, StoreError>;

    fn find_reservoir_by_name(&mut self, name: &str) -> Result<Option<Reservoir>, StoreError>;

    /// Reading with the greatest timestamp; ties go to the highest id.
    fn find_latest_by_reservoir(&mut self, reservoir_id: i32) -> Result<Option<Reading>, StoreError>;

    /// All readings for the reservoir, ascending by `(timestamp, id)`.
    fn find_history_by_reservoir(&mut self, reservoir_id: i32) -> Result<Vec<Reading>, StoreError>;

    /// Appends one reading. Fails with `UnknownReservoir` when the parent is missing.
    fn insert_reading(&mut self, reading: &NewReading) -> Result<Reading, StoreError>;

    fn count_reservoirs(&mut self) -> Result<i64, StoreError>;

    /// Inserts every seed reservoir (and its initial reading, stamped `at`)
    /// as one unit: either all rows are committed or none are.
    fn seed(
        &mut self,
        reservoirs: &[SeedReservoir],
        at: chrono::NaiveDateTime,
    ) -> Result<usize, StoreError>;

    /// Removes the reservoir and all of its readings. Returns `false` when
    /// no such reservoir existed.
    fn delete_cascade(&mut self, reservoir_id: i32) -> Result<bool, StoreError>;
}

/// Picks the latest reading from an unordered slice.
///
/// Greatest timestamp wins; among equal timestamps the highest id wins, so
/// the result never depends on storage order.
pub fn pick_latest<'a, I>(readings: I) -> Option<&'a Reading>
where
    I: IntoIterator<Item = &'a Reading>,
{
    readings
        .into_iter()
        .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
}

/// Sorts readings into history order: ascending `(timestamp, id)`.
pub fn sort_history(readings: &mut [Reading]) {
    readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(id: i32, hour: u32, level: f64) -> Reading {
        Reading {
            id,
            reservoir_id: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            water_level: level,
            storage: 100.0,
        }
    }

    #[test]
    fn test_pick_latest_uses_max_timestamp() {
        let readings = vec![reading(3, 8, 140.0), reading(1, 12, 150.0), reading(2, 10, 145.0)];
        let latest = pick_latest(&readings).expect("non-empty slice has a latest reading");
        assert_eq!(latest.id, 1);
        assert_eq!(latest.water_level, 150.0);
    }

    #[test]
    fn test_pick_latest_tie_breaks_on_highest_id() {
        let readings = vec![reading(7, 12, 150.0), reading(9, 12, 151.0), reading(8, 12, 149.0)];
        let latest = pick_latest(&readings).unwrap();
        assert_eq!(latest.id, 9, "equal timestamps should resolve to the highest id");
    }

    #[test]
    fn test_pick_latest_empty_is_none() {
        let readings: Vec<Reading> = Vec::new();
        assert!(pick_latest(&readings).is_none());
    }

    #[test]
    fn test_sort_history_last_element_matches_pick_latest() {
        let mut readings = vec![reading(9, 12, 151.0), reading(3, 8, 140.0), reading(7, 12, 150.0)];
        let latest_id = pick_latest(&readings).unwrap().id;
        sort_history(&mut readings);

        let ids: Vec<i32> = readings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 7, 9]);
        assert_eq!(readings.last().unwrap().id, latest_id);
    }
}
