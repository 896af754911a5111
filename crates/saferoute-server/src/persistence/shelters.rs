//! Shelters from a JSON reference file.

use saferoute_core::{RepositoryError, Shelter, ShelterDocument, ShelterRepository};
use std::path::PathBuf;

/// `{ "shelters": [...] }` file read on every `load`.
#[derive(Debug, Clone)]
pub struct ShelterFile {
    path: PathBuf,
}

impl ShelterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ShelterRepository for ShelterFile {
    async fn load(&self) -> Result<Vec<Shelter>, RepositoryError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| RepositoryError::Storage(format!("{}: {}", self.path.display(), err)))?;
        Ok(ShelterDocument::parse(&json)?.shelters)
    }
}
