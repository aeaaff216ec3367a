use std::sync::Arc;

use chrono::Utc;
use driftnet_core::{canonicalize, CanonicalLink, DeviceProfile, Job, LinkError};
use thiserror::Error;

use crate::store::{ContentStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Durable queue of user-submitted links awaiting ingestion. The
/// (link, submitted_by) pair is a job's identity for its whole life.
pub struct JobPool {
    store: Arc<dyn ContentStore>,
}

impl JobPool {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Queue a link for ingestion. Returns false when the link is
    /// already ingested for this profile or already queued; a link
    /// never sits in the pool twice.
    pub async fn submit(
        &self,
        link: &str,
        title: &str,
        submitted_by: &str,
        profile: DeviceProfile,
    ) -> Result<bool, SubmitError> {
        let link = canonicalize(link)?;
        if self.store.exists(&link, profile).await? {
            return Ok(false);
        }
        let job = Job {
            link,
            title: title.to_string(),
            submitted_by: submitted_by.to_string(),
            created_at: Utc::now(),
        };
        Ok(self.store.insert_job_if_absent(&job).await?)
    }

    /// Snapshot of pending jobs, not a live cursor.
    pub async fn list(&self) -> Result<Vec<Job>, StoreError> {
        self.store.list_jobs().await
    }

    pub async fn remove(
        &self,
        link: &CanonicalLink,
        submitted_by: &str,
    ) -> Result<(), StoreError> {
        self.store.delete_job(link, submitted_by).await
    }
}
