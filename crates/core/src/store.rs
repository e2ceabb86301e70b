//! Record store collaborator contract.
//!
//! The pipeline's only persistence needs are "load by id" and "update
//! these fields". [`RecordStore`] is that seam; [`MemoryStore`] is the
//! in-process implementation used by the CLI and the test suites. Real
//! deployments put a database behind the same trait.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{LegibleError, Result};

/// Processing status of a page record.
///
/// Records start `Pending`; the pipeline transitions them exactly once per
/// invocation, to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Completed,
    Failed,
}

/// A stored page record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: Uuid,
    pub url: String,
    /// Extracted page title; empty until processing completes.
    pub title: String,
    /// Sanitized content, or an error message when processing failed.
    pub html_content: String,
    pub status: RecordStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A partial update; only the supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub title: Option<String>,
    pub html_content: Option<String>,
    pub status: Option<RecordStatus>,
}

impl RecordUpdate {
    /// Update for a successful pipeline run.
    pub fn completed(title: String, html_content: String) -> Self {
        Self { title: Some(title), html_content: Some(html_content), status: Some(RecordStatus::Completed) }
    }

    /// Update for a failed pipeline run; the title is left untouched.
    pub fn failed(message: String) -> Self {
        Self { title: None, html_content: Some(message), status: Some(RecordStatus::Failed) }
    }
}

/// Data-access contract for page records.
pub trait RecordStore: Send + Sync {
    /// Loads a record by id.
    fn load(&self, id: Uuid) -> Result<PageRecord>;

    /// Applies a partial update to a record and refreshes `updated_at`.
    fn update(&self, id: Uuid, update: RecordUpdate) -> Result<()>;
}

/// Mutex-guarded in-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, PageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new `Pending` record for a URL and returns it.
    pub fn create(&self, url: &str) -> Result<PageRecord> {
        let now = OffsetDateTime::now_utc();
        let record = PageRecord {
            id: Uuid::new_v4(),
            url: url.to_string(),
            title: String::new(),
            html_content: String::new(),
            status: RecordStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.lock()?.insert(record.id, record.clone());
        Ok(record)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, PageRecord>>> {
        self.records
            .lock()
            .map_err(|_| LegibleError::StoreError("record store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, id: Uuid) -> Result<PageRecord> {
        self.lock()?.get(&id).cloned().ok_or(LegibleError::RecordNotFound(id))
    }

    fn update(&self, id: Uuid, update: RecordUpdate) -> Result<()> {
        let mut records = self.lock()?;
        let record = records.get_mut(&id).ok_or(LegibleError::RecordNotFound(id))?;

        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(html_content) = update.html_content {
            record.html_content = html_content;
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        record.updated_at = OffsetDateTime::now_utc();

        Ok(())
    }
}
