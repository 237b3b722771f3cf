//! Persistence for per-order reminder markers.
//!
//! A marker records when the last reminder for an order fired, as epoch
//! milliseconds, under the key `order_reminder_{orderId}`. Markers survive
//! restarts so a relaunched client honours the cooldown.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("marker file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("marker file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn marker_key(order_id: &str) -> String {
    format!("order_reminder_{order_id}")
}

/// Key-value store for reminder markers.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, MarkerError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), MarkerError>;
    async fn del(&self, key: &str) -> Result<(), MarkerError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryMarkerStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarkerStore for MemoryMarkerStore {
    async fn get(&self, key: &str) -> Result<Option<String>, MarkerError> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MarkerError> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), MarkerError> {
        self.data.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file implementation
// ---------------------------------------------------------------------------

/// Markers kept in memory and written through to a single JSON object file.
pub struct FileMarkerStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileMarkerStore {
    /// Open the store at `path`. A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MarkerError> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), markers = data.len(), "marker store opened");
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> Result<(), MarkerError> {
        let contents = serde_json::to_string_pretty(&*self.data.lock())?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl MarkerStore for FileMarkerStore {
    async fn get(&self, key: &str) -> Result<Option<String>, MarkerError> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MarkerError> {
        self.data.lock().insert(key.to_string(), value.to_string());
        self.flush().await
    }

    async fn del(&self, key: &str) -> Result<(), MarkerError> {
        if self.data.lock().remove(key).is_none() {
            return Ok(());
        }
        self.flush().await
    }
}
