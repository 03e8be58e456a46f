//! Persistence backends for the client document.
//!
//! The whole collection lives in one JSON document. Backends only know how to
//! read and write that document in full; record-level logic lives in
//! [`crate::client_storage`].

use crate::errors::AppError;
use crate::models::ClientRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// The persisted document: `{"form-submissions": [ClientRecord, ...]}`.
///
/// Any other top-level keys are carried through rewrites untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(rename = "form-submissions", default)]
    pub submissions: Vec<ClientRecord>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Read/write access to the serialized document.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Reads the full document.
    async fn load(&self) -> Result<StoreDocument, AppError>;

    /// Replaces the full document.
    async fn save(&self, document: &StoreDocument) -> Result<(), AppError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Document stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Wraps an existing file without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Wraps `path`, creating an empty document there if none exists yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let backend = Self::new(path);

        let exists = tokio::fs::try_exists(&backend.path).await.map_err(|e| {
            AppError::StoreUnavailable(format!(
                "checking {}: {}",
                backend.path.display(),
                e
            ))
        })?;

        if !exists {
            if let Some(parent) = backend.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::StoreUnavailable(format!("creating {}: {}", parent.display(), e))
                })?;
            }
            backend.save(&StoreDocument::default()).await?;
            tracing::info!("Created empty client document at {}", backend.path.display());
        }

        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentBackend for JsonFileBackend {
    async fn load(&self) -> Result<StoreDocument, AppError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::StoreUnavailable(format!("reading {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            AppError::ParseError(format!("parsing {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, document: &StoreDocument) -> Result<(), AppError> {
        let body = serde_json::to_string_pretty(document)
            .map_err(|e| AppError::Internal(format!("serializing document: {}", e)))?;

        // Write beside the target and rename so a failed write never truncates it.
        let temp = self.temp_path();
        tokio::fs::write(&temp, body).await.map_err(|e| {
            AppError::StoreUnavailable(format!("writing {}: {}", temp.display(), e))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            AppError::StoreUnavailable(format!("replacing {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Document held in memory; used by tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: RwLock<StoreDocument>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn load(&self) -> Result<StoreDocument, AppError> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &StoreDocument) -> Result<(), AppError> {
        *self.document.write().await = document.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
