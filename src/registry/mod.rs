//! Model Registry
//!
//! Keyed storage for the artifacts/metadata produced by completed
//! training jobs. Ids are generated uniquely at write time and never
//! mutated afterward, so no versioning or write-conflict resolution is
//! needed. Storage sits behind the [`ModelStore`] repository trait so a
//! durable backend can replace the in-memory one without touching
//! scheduler logic.
//!
//! Deletion is soft: the record's status flips to `Deleted`, it drops out
//! of `list()`, but stays fetchable by id so terminal-state queries remain
//! idempotent.


use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::TrainConfig;
use crate::executor::{ArtifactMetadata, TrainingOutcome};

/// Lifecycle status of a registered model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// Available for download/serving
    Ready,
    /// Soft-deleted
    Deleted,
}

impl ModelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelStatus::Ready => "ready",
            ModelStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Unique model id, assigned at registration
    pub id: String,
    /// Job that produced this model
    pub job_id: String,
    /// Hyperparameters the model was trained with
    pub config: TrainConfig,
    /// Final metric bundle (opaque)
    pub metrics: HashMap<String, f64>,
    /// Classes the model detects
    pub classes: Vec<String>,
    /// Artifact metadata
    pub artifact: ArtifactMetadata,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: ModelStatus,
}

impl ModelRecord {
    /// Build a fresh `Ready` record from a job's training outcome
    pub fn from_outcome(
        job_id: &str,
        config: TrainConfig,
        classes: Vec<String>,
        outcome: TrainingOutcome,
    ) -> Self {
        Self {
            id: format!("model-{:016x}", rand::random::<u64>()),
            job_id: job_id.to_string(),
            config,
            metrics: outcome.metrics,
            classes,
            artifact: outcome.artifact,
            created_at: Utc::now(),
            status: ModelStatus::Ready,
        }
    }
}

/// Listing summary for a registered model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub job_id: String,
    pub classes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub status: ModelStatus,
}

impl From<&ModelRecord> for ModelSummary {
    fn from(record: &ModelRecord) -> Self {
        Self {
            id: record.id.clone(),
            job_id: record.job_id.clone(),
            classes: record.classes.clone(),
            created_at: record.created_at,
            status: record.status,
        }
    }
}

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Repository trait for model storage
///
/// Implementations must be safe to share across scheduler worker threads.
pub trait ModelStore: Send + Sync {
    /// Insert or replace a record
    fn put(&self, record: ModelRecord) -> Result<()>;

    /// Fetch a record by id
    fn get(&self, id: &str) -> Result<ModelRecord>;

    /// All records, oldest first
    fn list(&self) -> Result<Vec<ModelRecord>>;
}

/// In-memory model store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, ModelRecord>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for InMemoryStore {
    fn put(&self, record: ModelRecord) -> Result<()> {
        self.records
            .write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?
            .insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<ModelRecord> {
        self.records
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<ModelRecord>> {
        let mut records: Vec<ModelRecord> = self
            .records
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?
            .values()
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

/// Model registry service
///
/// Thin facade over a [`ModelStore`] that owns id assignment and the
/// soft-delete rule.
pub struct ModelRegistry {
    store: Box<dyn ModelStore>,
}

impl ModelRegistry {
    /// Create a registry over the given store
    pub fn new(store: Box<dyn ModelStore>) -> Self {
        Self { store }
    }

    /// Create a registry backed by in-process memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryStore::new()))
    }

    /// Register a completed job's outcome as a new model
    pub fn register(
        &self,
        job_id: &str,
        config: TrainConfig,
        classes: Vec<String>,
        outcome: TrainingOutcome,
    ) -> Result<ModelRecord> {
        let record = ModelRecord::from_outcome(job_id, config, classes, outcome);
        self.store.put(record.clone())?;
        Ok(record)
    }

    /// Persist an externally built record
    pub fn insert(&self, record: ModelRecord) -> Result<()> {
        self.store.put(record)
    }

    /// Fetch a record by id (deleted records included)
    pub fn get(&self, id: &str) -> Result<ModelRecord> {
        self.store.get(id)
    }

    /// Summaries of all `Ready` models, oldest first
    pub fn list(&self) -> Result<Vec<ModelSummary>> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|r| r.status == ModelStatus::Ready)
            .map(ModelSummary::from)
            .collect())
    }

    /// Soft-delete a model
    ///
    /// Returns `true` if a `Ready` record was marked deleted, `false` for
    /// unknown or already-deleted ids.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut record = match self.store.get(id) {
            Ok(r) => r,
            Err(RegistryError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        if record.status == ModelStatus::Deleted {
            return Ok(false);
        }
        record.status = ModelStatus::Deleted;
        self.store.put(record)?;
        Ok(true)
    }
}
