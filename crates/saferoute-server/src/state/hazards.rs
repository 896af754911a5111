//! Hazard store: DashMap cache with write-through to SQLite.

use anyhow::Result;
use dashmap::DashMap;
use saferoute_core::{Hazard, HazardRepository, RepositoryError};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::persistence::{hazards as hazard_db, Database};

pub struct HazardStore {
    cache: DashMap<String, Hazard>,
    db: Option<Database>,
    /// Serializes read-modify-write cycles so concurrent upvotes are not lost.
    writes: Mutex<()>,
}

impl HazardStore {
    /// Store without persistence (tests, demos).
    pub fn in_memory() -> Self {
        Self {
            cache: DashMap::new(),
            db: None,
            writes: Mutex::new(()),
        }
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            cache: DashMap::new(),
            db: Some(db),
            writes: Mutex::new(()),
        }
    }

    /// Fill the cache from the database. Returns the number of hazards loaded.
    pub async fn load_from_database(&self) -> Result<usize> {
        let Some(db) = &self.db else {
            return Ok(0);
        };
        let hazards = hazard_db::load_all_hazards(db.pool()).await?;
        let count = hazards.len();
        for hazard in hazards {
            self.cache.insert(hazard.id.clone(), hazard);
        }
        info!("Loaded {} hazards from database", count);
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<Hazard> {
        self.cache.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Read-only copy of every hazard, oldest report first.
    ///
    /// The order is stable so that equal along-track distances keep a
    /// deterministic input order during avoidance.
    pub fn snapshot(&self) -> Vec<Hazard> {
        let mut hazards: Vec<Hazard> = self
            .cache
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        hazards.sort_by(|a, b| {
            a.reported_at
                .cmp(&b.reported_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        hazards
    }

    /// Apply `change` to a copy of the hazard, persist it, then publish it to
    /// the cache. A failed write leaves the cached hazard untouched.
    pub async fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut Hazard),
    ) -> Result<Hazard, RepositoryError> {
        let _guard = self.writes.lock().await;
        let mut updated = self
            .get(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        change(&mut updated);
        self.persist(&updated).await?;
        self.cache.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    async fn persist(&self, hazard: &Hazard) -> Result<(), RepositoryError> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        hazard_db::upsert_hazard(db.pool(), hazard).await.map_err(|err| {
            error!(hazard_id = %hazard.id, "Failed to persist hazard: {:#}", err);
            RepositoryError::Storage(format!("{err:#}"))
        })
    }
}

impl HazardRepository for HazardStore {
    async fn load(&self) -> Result<Vec<Hazard>, RepositoryError> {
        Ok(self.snapshot())
    }

    async fn append(&self, hazard: Hazard) -> Result<(), RepositoryError> {
        let _guard = self.writes.lock().await;
        if self.cache.contains_key(&hazard.id) {
            return Err(RepositoryError::Duplicate(hazard.id));
        }
        self.persist(&hazard).await?;
        self.cache.insert(hazard.id.clone(), hazard);
        Ok(())
    }

    async fn update(&self, hazard: Hazard) -> Result<(), RepositoryError> {
        let _guard = self.writes.lock().await;
        if !self.cache.contains_key(&hazard.id) {
            return Err(RepositoryError::NotFound(hazard.id));
        }
        self.persist(&hazard).await?;
        self.cache.insert(hazard.id.clone(), hazard);
        Ok(())
    }
}
