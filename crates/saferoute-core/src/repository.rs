//! Repository seams for hazards and shelters.
//!
//! Persistence is chosen by the host; callers receive a repository and never
//! touch storage directly.

use crate::models::{Hazard, Shelter, ValidationError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("hazard {0} already exists")]
    Duplicate(String),
    #[error("hazard {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Source of reported hazards.
pub trait HazardRepository {
    fn load(&self) -> impl Future<Output = Result<Vec<Hazard>, RepositoryError>> + Send;

    fn append(&self, hazard: Hazard) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace a stored hazard after verification or upvote.
    fn update(&self, hazard: Hazard) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Source of static shelter reference data.
pub trait ShelterRepository {
    fn load(&self) -> impl Future<Output = Result<Vec<Shelter>, RepositoryError>> + Send;
}

/// `{ "hazards": [...] }` file layout. A bare array is accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HazardDocument {
    pub hazards: Vec<Hazard>,
}

impl HazardDocument {
    /// Parse and validate every hazard.
    pub fn parse(json: &str) -> Result<Self, RepositoryError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let document: Self = if value.is_array() {
            Self {
                hazards: serde_json::from_value(value)?,
            }
        } else {
            serde_json::from_value(value)?
        };
        for hazard in &document.hazards {
            hazard.validate()?;
        }
        Ok(document)
    }
}

/// `{ "shelters": [...] }` file layout. A bare array is accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelterDocument {
    pub shelters: Vec<Shelter>,
}

impl ShelterDocument {
    /// Parse and validate every shelter.
    pub fn parse(json: &str) -> Result<Self, RepositoryError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let document: Self = if value.is_array() {
            Self {
                shelters: serde_json::from_value(value)?,
            }
        } else {
            serde_json::from_value(value)?
        };
        for shelter in &document.shelters {
            shelter.validate()?;
        }
        Ok(document)
    }
}

/// Hazards held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryHazardRepository {
    hazards: RwLock<Vec<Hazard>>,
}

impl InMemoryHazardRepository {
    pub fn new(hazards: Vec<Hazard>) -> Self {
        Self {
            hazards: RwLock::new(hazards),
        }
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Storage("hazard lock poisoned".to_string())
    }
}

impl HazardRepository for InMemoryHazardRepository {
    async fn load(&self) -> Result<Vec<Hazard>, RepositoryError> {
        let hazards = self.hazards.read().map_err(|_| Self::poisoned())?;
        Ok(hazards.clone())
    }

    async fn append(&self, hazard: Hazard) -> Result<(), RepositoryError> {
        let mut hazards = self.hazards.write().map_err(|_| Self::poisoned())?;
        if hazards.iter().any(|existing| existing.id == hazard.id) {
            return Err(RepositoryError::Duplicate(hazard.id));
        }
        hazards.push(hazard);
        Ok(())
    }

    async fn update(&self, hazard: Hazard) -> Result<(), RepositoryError> {
        let mut hazards = self.hazards.write().map_err(|_| Self::poisoned())?;
        let slot = hazards
            .iter_mut()
            .find(|existing| existing.id == hazard.id)
            .ok_or_else(|| RepositoryError::NotFound(hazard.id.clone()))?;
        *slot = hazard;
        Ok(())
    }
}

/// Shelters fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShelterRepository {
    shelters: Vec<Shelter>,
}

impl InMemoryShelterRepository {
    pub fn new(shelters: Vec<Shelter>) -> Self {
        Self { shelters }
    }

    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        Ok(Self::new(ShelterDocument::parse(json)?.shelters))
    }
}

impl ShelterRepository for InMemoryShelterRepository {
    async fn load(&self) -> Result<Vec<Shelter>, RepositoryError> {
        Ok(self.shelters.clone())
    }
}
