// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared store handles.
//
// The rusqlite-backed stores are `Send` but not `Sync`, so they are wrapped
// in `Arc<Mutex<>>` for safe sharing between editing sessions and the
// generation pipeline.  Mutex contention is minimal because all operations
// are fast SQLite queries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use countersign_core::error::Result;
use countersign_store::{AgencyStore, ContractStore, EventLog};
use tracing::info;

/// File name of the persisted engine configuration, kept next to the
/// databases.
pub const CONFIG_FILE: &str = "config.json";

/// Handles to all three databases, cheaply cloneable into sessions and
/// generators.
#[derive(Clone)]
pub struct Stores {
    pub contracts: Arc<Mutex<ContractStore>>,
    pub agencies: Arc<Mutex<AgencyStore>>,
    pub events: Arc<Mutex<EventLog>>,
}

impl Stores {
    /// Open (or create) the databases under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        info!(path = %data_dir.display(), "opening engine databases");
        std::fs::create_dir_all(data_dir)?;

        let contracts = ContractStore::open(data_dir.join("contracts.db"))?;
        let agencies = AgencyStore::open(data_dir.join("agencies.db"))?;
        let events = EventLog::open(data_dir.join("events.db"))?;

        Ok(Self {
            contracts: Arc::new(Mutex::new(contracts)),
            agencies: Arc::new(Mutex::new(agencies)),
            events: Arc::new(Mutex::new(events)),
        })
    }

    /// In-memory databases (useful for tests and throwaway sessions).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            contracts: Arc::new(Mutex::new(ContractStore::open_in_memory()?)),
            agencies: Arc::new(Mutex::new(AgencyStore::open_in_memory()?)),
            events: Arc::new(Mutex::new(EventLog::open_in_memory()?)),
        })
    }
}

/// Path of the configuration file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_the_data_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("engine-data");

        let stores = Stores::open(&data_dir).expect("open stores");
        assert!(data_dir.join("contracts.db").exists());
        assert!(data_dir.join("events.db").exists());

        let count = stores
            .events
            .lock()
            .expect("events lock poisoned")
            .count()
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn config_path_is_next_to_the_databases() {
        let path = config_path(Path::new("/data/countersign"));
        assert_eq!(path, Path::new("/data/countersign/config.json"));
    }
}
