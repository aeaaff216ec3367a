use std::sync::Arc;
use std::time::Instant;

use driftnet_core::{canonicalize, DeviceProfile, IngestOutcome, Item, ItemMetadata};
use ingest_logging::{ingest_info, ingest_warn};

use crate::decode::transliterate_ascii;
use crate::fetch::PageRenderer;
use crate::store::ContentStore;

/// Coordinates one candidate link through dedup check, fetch, and
/// persist. The single place where items are written.
pub struct Ingestor {
    store: Arc<dyn ContentStore>,
    renderer: Arc<dyn PageRenderer>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn ContentStore>, renderer: Arc<dyn PageRenderer>) -> Self {
        Self { store, renderer }
    }

    /// Run the full pipeline for one candidate. Every failure is caught
    /// and reported as an outcome so batch callers never abort.
    ///
    /// The item is keyed by the link the fetch finally landed on, which
    /// may differ from the candidate (tracking redirects, AMP pages);
    /// the store's uniqueness constraint absorbs the case where two
    /// candidates collapse onto one final link.
    pub async fn ingest(
        &self,
        candidate: &str,
        title: &str,
        feed_source: &str,
        submitted_by: &str,
        profile: DeviceProfile,
    ) -> IngestOutcome {
        if candidate.trim().is_empty() {
            return IngestOutcome::SkippedEmptyLink;
        }

        let link = match canonicalize(candidate) {
            Ok(link) => link,
            Err(err) => {
                ingest_warn!("skipping candidate {candidate:?}: {err}");
                return IngestOutcome::Failed(err.to_string());
            }
        };

        match self.store.exists(&link, profile).await {
            Ok(true) => return IngestOutcome::SkippedDuplicate,
            Ok(false) => {}
            Err(err) => return IngestOutcome::Failed(err.to_string()),
        }

        ingest_info!("fetching content for {link} ({})", profile.as_str());
        let started = Instant::now();
        let page = match self.renderer.render(link.as_str(), profile).await {
            Ok(page) => page,
            Err(err) => {
                ingest_warn!("fetch failed for {link}: {err}");
                return IngestOutcome::Failed(err.to_string());
            }
        };
        ingest_info!(
            "content fetched for {link}, took {:.2} s",
            started.elapsed().as_secs_f64()
        );

        let final_link = match canonicalize(&page.final_url) {
            Ok(link) => link,
            Err(err) => {
                ingest_warn!("unusable final url {:?}: {err}", page.final_url);
                return IngestOutcome::Failed(err.to_string());
            }
        };

        let item = Item {
            link: final_link,
            metadata: ItemMetadata {
                title: title.to_string(),
                feed_source: feed_source.to_string(),
                submitted_by: submitted_by.to_string(),
            },
            content: transliterate_ascii(&page.html).into_bytes(),
        };

        match self.store.put(&item, profile).await {
            Ok(true) => IngestOutcome::Stored,
            Ok(false) => IngestOutcome::SkippedDuplicate,
            Err(err) => {
                ingest_warn!("persist failed for {}: {err}", item.link);
                IngestOutcome::Failed(err.to_string())
            }
        }
    }
}
