use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CanonicalLink;

/// Which device experience an ingestion targets. Every store partition
/// and renderer user-agent choice is keyed by exactly one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    Desktop,
    Mobile,
}

impl DeviceProfile {
    pub const ALL: [DeviceProfile; 2] = [DeviceProfile::Desktop, DeviceProfile::Mobile];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceProfile::Desktop => "desktop",
            DeviceProfile::Mobile => "mobile",
        }
    }
}

/// Metadata persisted alongside an item's raw content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub title: String,
    /// Feed the item was discovered through; empty for user submissions.
    pub feed_source: String,
    pub submitted_by: String,
}

/// Persisted content record. Created exactly once per
/// (canonical link, device profile) pair and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub link: CanonicalLink,
    pub metadata: ItemMetadata,
    pub content: Vec<u8>,
}

/// Pending user-submitted link awaiting ingestion. Identified by the
/// (link, submitted_by) pair through its whole lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub link: CanonicalLink,
    pub title: String,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
}

/// Terminal result of one orchestrated ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Content fetched and persisted under its final canonical link.
    Stored,
    /// Candidate link was empty; nothing was attempted.
    SkippedEmptyLink,
    /// An item already exists for this (link, profile) pair.
    SkippedDuplicate,
    /// Fetch or persist failed; the candidate is dropped, not retried.
    Failed(String),
}
