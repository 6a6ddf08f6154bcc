use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::models::{CityRow, NewCityRow};

/// Record store backing the city catalog.
pub trait CityStore: Send + Sync {
    /// Every stored row in id order.
    fn select_all(&self) -> Result<Vec<CityRow>>;
    /// Insert `rows` only when the store holds no rows yet. Returns how many were inserted.
    fn insert_if_empty(&self, rows: &[NewCityRow]) -> Result<usize>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CityTable {
    next_id: u64,
    rows: Vec<CityRow>,
}

impl Default for CityTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl CityTable {
    fn insert_if_empty(&mut self, rows: &[NewCityRow]) -> usize {
        if !self.rows.is_empty() {
            return 0;
        }
        for row in rows {
            let id = self.next_id;
            self.next_id += 1;
            self.rows.push(row.clone().with_id(id));
        }
        rows.len()
    }
}

/// City table persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonCityStore {
    path: PathBuf,
}

impl JsonCityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default table location inside a data directory.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join("cities.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<CityTable> {
        if !self.path.exists() {
            return Ok(CityTable::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn write_table(&self, table: &CityTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised = serde_json::to_vec_pretty(table)?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl CityStore for JsonCityStore {
    fn select_all(&self) -> Result<Vec<CityRow>> {
        let mut rows = self.read_table()?.rows;
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn insert_if_empty(&self, rows: &[NewCityRow]) -> Result<usize> {
        let mut table = self.read_table()?;
        let inserted = table.insert_if_empty(rows);
        if inserted > 0 {
            self.write_table(&table)?;
            info!(path = %self.path.display(), inserted, "Seeded city table");
        }
        Ok(inserted)
    }
}

/// City table held in memory. Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryCityStore {
    table: Arc<RwLock<CityTable>>,
}

impl MemoryCityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store that already holds `rows`, ids assigned in order.
    pub fn with_rows(rows: &[NewCityRow]) -> Self {
        let store = Self::new();
        store.table.write().insert_if_empty(rows);
        store
    }
}

impl CityStore for MemoryCityStore {
    fn select_all(&self) -> Result<Vec<CityRow>> {
        Ok(self.table.read().rows.clone())
    }

    fn insert_if_empty(&self, rows: &[NewCityRow]) -> Result<usize> {
        Ok(self.table.write().insert_if_empty(rows))
    }
}
