#![allow(missing_docs)]

//! City catalog: storage rows, seeding and tier-filtered random selection.

mod models;
mod seed;
mod store;

use rand::{seq::SliceRandom, Rng};
use tracing::{debug, info, warn};

use crate::error::{GameError, Result};

pub use models::{City, CityRow, GeoPoint, NewCityRow};
pub use seed::{sample_cities, sample_rows};
pub use store::{CityStore, JsonCityStore, MemoryCityStore};

/// Highest tier that still draws from primary cities only.
pub const PRIMARY_ONLY_MAX_TIER: u32 = 5;

/// In-memory view of every navigable city.
#[derive(Debug, Clone, Default)]
pub struct CityCatalog {
    cities: Vec<City>,
}

impl CityCatalog {
    pub fn from_cities(cities: Vec<City>) -> Self {
        Self { cities }
    }

    /// Seed `store` with the built-in cities if it is empty, then load it.
    ///
    /// A failed seed is logged and loading still proceeds; a failed load is returned.
    pub fn open(store: &dyn CityStore) -> Result<Self> {
        match store.insert_if_empty(&sample_rows()) {
            Ok(0) => debug!("City table already populated"),
            Ok(inserted) => info!(inserted, "Inserted sample cities"),
            Err(err) => warn!("Failed to seed city table: {err:#}"),
        }
        Ok(Self::from_cities(Self::load_all(store)?))
    }

    /// Read every city from `store`, skipping rows whose location does not parse.
    pub fn load_all(store: &dyn CityStore) -> Result<Vec<City>> {
        let rows = store.select_all().map_err(GameError::storage)?;
        let mut cities = Vec::with_capacity(rows.len());
        for row in rows {
            match row.to_city() {
                Ok(city) => cities.push(city),
                Err(err) => warn!(id = row.id, city = %row.city, "Skipping city row: {err:#}"),
            }
        }
        info!(total = cities.len(), "Cities loaded");
        Ok(cities)
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Cities flagged as primary.
    pub fn primary(&self) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(|city| city.is_primary)
    }

    /// Pick a city uniformly at random for the given difficulty tier.
    ///
    /// Tiers up to [`PRIMARY_ONLY_MAX_TIER`] only draw primary cities. Repeats
    /// across calls are possible.
    pub fn random_city<R: Rng + ?Sized>(&self, tier: u32, rng: &mut R) -> Option<City> {
        let candidates: Vec<&City> = if tier <= PRIMARY_ONLY_MAX_TIER {
            self.primary().collect()
        } else {
            self.cities.iter().collect()
        };
        candidates.choose(rng).map(|city| (*city).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    use crate::geo::Coordinate;

    /// Read-only table: seeding fails, reads succeed.
    struct ReadOnlyStore(MemoryCityStore);

    impl CityStore for ReadOnlyStore {
        fn select_all(&self) -> Result<Vec<CityRow>> {
            self.0.select_all()
        }

        fn insert_if_empty(&self, _rows: &[NewCityRow]) -> Result<usize> {
            Err(anyhow!("table is read-only"))
        }
    }

    struct UnreadableStore;

    impl CityStore for UnreadableStore {
        fn select_all(&self) -> Result<Vec<CityRow>> {
            Err(anyhow!("table is corrupt"))
        }

        fn insert_if_empty(&self, _rows: &[NewCityRow]) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn failed_seed_still_loads_existing_rows() -> Result<()> {
        let mut rows = sample_rows();
        rows.truncate(4);
        let store = ReadOnlyStore(MemoryCityStore::with_rows(&rows));

        let catalog = CityCatalog::open(&store)?;
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.cities()[3].name, "Paris");

        let empty = CityCatalog::open(&ReadOnlyStore(MemoryCityStore::new()))?;
        assert!(empty.is_empty());
        Ok(())
    }

    #[test]
    fn unreadable_store_is_a_storage_error() {
        let err = CityCatalog::open(&UnreadableStore).unwrap_err();
        assert!(err.is_storage());
        let err = CityCatalog::load_all(&UnreadableStore).unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("table is corrupt"));
    }

    #[test]
    fn open_seeds_empty_store_once() -> Result<()> {
        let store = MemoryCityStore::new();
        let catalog = CityCatalog::open(&store)?;
        assert_eq!(catalog.len(), 25);
        assert_eq!(catalog.primary().count(), 11);

        let reopened = CityCatalog::open(&store)?;
        assert_eq!(reopened.len(), 25);
        assert_eq!(store.select_all()?.len(), 25);
        Ok(())
    }

    #[test]
    fn load_all_skips_malformed_rows() -> Result<()> {
        let mut rows = sample_rows();
        rows.truncate(3);
        rows[1].gps_location = r#"{"type":"Point","coordinates":[12.5]}"#.to_string();
        let store = MemoryCityStore::with_rows(&rows);

        let cities = CityCatalog::load_all(&store)?;
        let names: Vec<_> = cities.iter().map(|city| city.name.as_str()).collect();
        assert_eq!(names, ["New York", "Tokyo"]);
        Ok(())
    }

    #[test]
    fn low_tiers_only_draw_primary_cities() {
        let catalog = CityCatalog::from_cities(sample_cities());
        let mut rng = StdRng::seed_from_u64(7);
        for tier in 1..=PRIMARY_ONLY_MAX_TIER {
            for _ in 0..200 {
                let city = catalog.random_city(tier, &mut rng).expect("city");
                assert!(city.is_primary, "{} drawn at tier {tier}", city.name);
            }
        }
    }

    #[test]
    fn high_tiers_draw_from_every_city() {
        let catalog = CityCatalog::from_cities(sample_cities());
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            if let Some(city) = catalog.random_city(6, &mut rng) {
                seen.insert(city);
            }
        }
        assert_eq!(seen.len(), catalog.len());
        assert!(seen.iter().any(|city| !city.is_primary));
    }

    #[test]
    fn empty_filtered_set_yields_none() {
        let only_minor = CityCatalog::from_cities(vec![City::new(
            "Lagos",
            "Nigeria",
            "Africa",
            Coordinate::new(6.5244, 3.3792),
            false,
        )]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(only_minor.random_city(1, &mut rng).is_none());
        assert!(only_minor.random_city(10, &mut rng).is_some());
        assert!(CityCatalog::default().random_city(10, &mut rng).is_none());
    }
}
