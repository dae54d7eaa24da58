/// First-run initialization of the reservoir registry.
///
/// Seeding only happens against an empty store and is all-or-nothing: the
/// store's `seed` runs every insert as one unit, so a failure part-way
/// through leaves no reservoirs or readings behind.

use chrono::NaiveDateTime;
use log::info;

use crate::model::SeedReservoir;
use crate::store::{ReservoirStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Store already held reservoirs; nothing was written.
    AlreadyPopulated { existing: i64 },
    Seeded { reservoirs: usize },
}

/// Seeds `registry` into `store` unless it already holds reservoirs.
///
/// Initial readings are stamped with `at`.
pub fn seed_if_empty<S: ReservoirStore + ?Sized>(
    store: &mut S,
    registry: &[SeedReservoir],
    at: NaiveDateTime,
) -> Result<SeedOutcome, StoreError> {
    let existing = store.count_reservoirs()?;
    if existing > 0 {
        info!("Store already holds {} reservoirs, skipping seed", existing);
        return Ok(SeedOutcome::AlreadyPopulated { existing });
    }

    let reservoirs = store.seed(registry, at)?;
    info!("Seeded {} reservoirs", reservoirs);
    Ok(SeedOutcome::Seeded { reservoirs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SeedReading;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn registry() -> Vec<SeedReservoir> {
        vec![
            SeedReservoir {
                name: "三峡水库".to_string(),
                longitude: 111.003,
                latitude: 30.823,
                flood_limit_level: Some(145.0),
                design_capacity: Some(393.0),
                initial_reading: Some(SeedReading { water_level: 160.0, storage: 300.0 }),
            },
            SeedReservoir {
                name: "丹江口水库".to_string(),
                longitude: 111.513,
                latitude: 32.650,
                flood_limit_level: Some(157.0),
                design_capacity: Some(174.0),
                initial_reading: Some(SeedReading { water_level: 158.5, storage: 140.0 }),
            },
        ]
    }

    #[test]
    fn test_seed_empty_store() {
        let mut store = MemoryStore::new();
        let outcome = seed_if_empty(&mut store, &registry(), at()).unwrap();

        assert_eq!(outcome, SeedOutcome::Seeded { reservoirs: 2 });
        assert_eq!(store.count_reservoirs().unwrap(), 2);
        assert_eq!(store.reading_count(), 2);
    }

    #[test]
    fn test_seed_is_skipped_when_populated() {
        let mut store = MemoryStore::new();
        seed_if_empty(&mut store, &registry(), at()).unwrap();

        let outcome = seed_if_empty(&mut store, &registry(), at()).unwrap();
        assert_eq!(outcome, SeedOutcome::AlreadyPopulated { existing: 2 });
        assert_eq!(store.reading_count(), 2, "second run must not add readings");
    }

    #[test]
    fn test_failed_seed_leaves_store_empty() {
        let mut store = MemoryStore::new();
        let mut bad = registry();
        bad.push(bad[0].clone());

        let result = seed_if_empty(&mut store, &bad, at());
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));
        assert_eq!(store.count_reservoirs().unwrap(), 0);
        assert_eq!(store.reading_count(), 0);
    }
}
