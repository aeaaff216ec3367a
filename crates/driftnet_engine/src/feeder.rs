use std::sync::Arc;
use std::time::Duration;

use driftnet_core::{DeviceProfile, IngestOutcome};
use ingest_logging::{ingest_error, ingest_info, ingest_warn};

use crate::feed::{clean_title, parse_feed, FeedError};
use crate::fetch::PageRenderer;
use crate::ingest::Ingestor;

#[derive(Debug, Clone)]
pub struct FeederSettings {
    /// Pause after each stored entry, to avoid hammering the renderer.
    pub entry_delay: Duration,
    /// Pause between the desktop and mobile passes.
    pub profile_delay: Duration,
    /// Submitter name recorded on feed-discovered items.
    pub default_submitter: String,
}

impl Default for FeederSettings {
    fn default() -> Self {
        Self {
            entry_delay: Duration::from_millis(500),
            profile_delay: Duration::from_secs(1),
            default_submitter: "driftnet".to_string(),
        }
    }
}

/// Per-feed tally of ingestion outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Batch ingestion over configured feeds: every feed, every entry, once
/// per device profile.
pub struct FeedIngestor {
    renderer: Arc<dyn PageRenderer>,
    ingestor: Ingestor,
    settings: FeederSettings,
}

impl FeedIngestor {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        ingestor: Ingestor,
        settings: FeederSettings,
    ) -> Self {
        Self {
            renderer,
            ingestor,
            settings,
        }
    }

    /// Fetch one feed and ingest each entry for the given profile.
    /// Per-entry failures are tallied, never propagated.
    pub async fn ingest_feed(
        &self,
        feed_url: &str,
        profile: DeviceProfile,
    ) -> Result<FeedSummary, FeedError> {
        let bytes = self.renderer.fetch_raw(feed_url).await?;
        let entries = parse_feed(&bytes)?;
        ingest_info!(
            "begin parsing for {feed_url} ({} entries, {})",
            entries.len(),
            profile.as_str()
        );

        let mut summary = FeedSummary::default();
        for entry in entries {
            let title = clean_title(&entry.title);
            let outcome = self
                .ingestor
                .ingest(
                    &entry.link,
                    &title,
                    feed_url,
                    &self.settings.default_submitter,
                    profile,
                )
                .await;
            match outcome {
                IngestOutcome::Stored => {
                    summary.stored += 1;
                    tokio::time::sleep(self.settings.entry_delay).await;
                }
                IngestOutcome::SkippedDuplicate | IngestOutcome::SkippedEmptyLink => {
                    summary.skipped += 1;
                }
                IngestOutcome::Failed(reason) => {
                    ingest_warn!("entry {:?} from {feed_url} failed: {reason}", entry.link);
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    /// One full batch pass: every feed for the desktop experience, then
    /// every feed for mobile. A broken feed is logged and skipped.
    pub async fn ingest_all_feeds(&self, sources: &[String]) {
        for (pass, profile) in DeviceProfile::ALL.into_iter().enumerate() {
            if pass > 0 {
                tokio::time::sleep(self.settings.profile_delay).await;
            }
            ingest_info!("-- {} pass --", profile.as_str());
            for source in sources {
                match self.ingest_feed(source, profile).await {
                    Ok(summary) => ingest_info!(
                        "{source}: {} stored, {} skipped, {} failed",
                        summary.stored,
                        summary.skipped,
                        summary.failed
                    ),
                    Err(err) => {
                        ingest_error!("feed {source} failed: {err}");
                        continue;
                    }
                }
            }
        }
    }
}
