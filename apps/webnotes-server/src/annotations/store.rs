//! Annotation store
//!
//! The whole list is kept as one document under one key, so every mutation
//! is read-modify-write. Mutations go through a single writer task fed by a
//! FIFO channel: one pending write at a time, so two concurrent appends can
//! never overwrite each other's result. Reads go straight to the backend.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::kv::KeyValueStore;
use super::types::{AnnotationRecord, NewAnnotation};

/// Well-known key holding the annotation list
pub const DEFAULT_STORAGE_KEY: &str = "annotations";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Key holding the list document
    pub key: String,
    /// Capacity of the write queue
    pub write_queue_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            write_queue_size: 64,
        }
    }
}

enum WriteCommand {
    Append {
        draft: NewAnnotation,
        respond: oneshot::Sender<Result<String>>,
    },
    Delete {
        id: String,
        respond: oneshot::Sender<Result<bool>>,
    },
    Clear {
        respond: oneshot::Sender<Result<usize>>,
    },
}

/// Cloneable handle to the annotation list
#[derive(Clone)]
pub struct AnnotationStore {
    backend: Arc<dyn KeyValueStore>,
    key: Arc<str>,
    write_tx: mpsc::Sender<WriteCommand>,
}

impl AnnotationStore {
    /// Create a store with the default key and queue size
    ///
    /// Spawns the writer task, so this must run inside a Tokio runtime.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    pub fn with_config(backend: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        let (write_tx, write_rx) = mpsc::channel(config.write_queue_size.max(1));
        let key: Arc<str> = Arc::from(config.key);

        let writer = Writer {
            backend: backend.clone(),
            key: key.clone(),
        };
        tokio::spawn(writer.run(write_rx));

        Self {
            backend,
            key,
            write_tx,
        }
    }

    /// Validate, stamp and append a record; returns the assigned id
    pub async fn append(&self, draft: NewAnnotation) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.send(WriteCommand::Append { draft, respond: tx }).await?;
        rx.await.map_err(|_| StoreError::WriterUnavailable)?
    }

    /// Remove a record; absent ids are a successful no-op.
    /// Returns whether a record was removed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(WriteCommand::Delete {
            id: id.to_string(),
            respond: tx,
        })
        .await?;
        rx.await.map_err(|_| StoreError::WriterUnavailable)?
    }

    /// Drop every record; returns how many were removed
    pub async fn clear_all(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.send(WriteCommand::Clear { respond: tx }).await?;
        rx.await.map_err(|_| StoreError::WriterUnavailable)?
    }

    /// Records captured on exactly this URL, in insertion order
    pub async fn list_by_url(&self, url: &str) -> Result<Vec<AnnotationRecord>> {
        let records = load_records(self.backend.as_ref(), &self.key).await?;
        Ok(records.into_iter().filter(|r| r.url == url).collect())
    }

    /// Every record, in insertion order
    pub async fn list_all(&self) -> Result<Vec<AnnotationRecord>> {
        load_records(self.backend.as_ref(), &self.key).await
    }

    async fn send(&self, command: WriteCommand) -> Result<()> {
        self.write_tx
            .send(command)
            .await
            .map_err(|_| StoreError::WriterUnavailable)
    }
}

async fn load_records(backend: &dyn KeyValueStore, key: &str) -> Result<Vec<AnnotationRecord>> {
    match backend.get(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Pick a fresh id not used by any existing record
pub(crate) fn assign_id(existing: &HashSet<&str>) -> String {
    loop {
        let id = Uuid::new_v4().simple().to_string();
        if !existing.contains(id.as_str()) {
            return id;
        }
        tracing::warn!(id = %id, "Generated annotation id collided, retrying");
    }
}

struct Writer {
    backend: Arc<dyn KeyValueStore>,
    key: Arc<str>,
}

impl Writer {
    async fn run(self, mut write_rx: mpsc::Receiver<WriteCommand>) {
        while let Some(command) = write_rx.recv().await {
            match command {
                WriteCommand::Append { draft, respond } => {
                    let _ = respond.send(self.append(draft).await);
                }
                WriteCommand::Delete { id, respond } => {
                    let _ = respond.send(self.delete(&id).await);
                }
                WriteCommand::Clear { respond } => {
                    let _ = respond.send(self.clear().await);
                }
            }
        }
        tracing::debug!("Annotation writer stopped");
    }

    async fn append(&self, draft: NewAnnotation) -> Result<String> {
        let draft = draft.validate()?;
        let mut records = load_records(self.backend.as_ref(), &self.key).await?;

        let id = {
            let existing: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
            assign_id(&existing)
        };
        let record = draft.into_record(id.clone(), Utc::now());
        tracing::info!(
            id = %record.id,
            annotation_type = ?record.annotation_type,
            url = %record.url,
            "Saved annotation"
        );
        records.push(record);

        self.persist(&records).await?;
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = load_records(self.backend.as_ref(), &self.key).await?;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            tracing::debug!(id = %id, "Delete of unknown annotation ignored");
            return Ok(false);
        }

        self.persist(&records).await?;
        tracing::info!(id = %id, "Deleted annotation");
        Ok(true)
    }

    async fn clear(&self) -> Result<usize> {
        let removed = load_records(self.backend.as_ref(), &self.key).await?.len();
        self.persist(&[]).await?;
        tracing::info!(removed, "Cleared all annotations");
        Ok(removed)
    }

    // One retry, then the error goes back to the caller.
    async fn persist(&self, records: &[AnnotationRecord]) -> Result<()> {
        let value = serde_json::to_value(records)?;
        match self.backend.set(&self.key, value.clone()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Persisting annotations failed, retrying once");
                self.backend.set(&self.key, value).await
            }
        }
    }
}
