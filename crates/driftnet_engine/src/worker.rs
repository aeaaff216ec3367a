use std::time::Duration;

use driftnet_core::{DeviceProfile, IngestOutcome};
use ingest_logging::{ingest_debug, ingest_error, ingest_info};

use crate::ingest::Ingestor;
use crate::jobs::JobPool;

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Poll delay while the pool is empty.
    pub idle_delay: Duration,
    /// Pause between the desktop and mobile ingestion of one job.
    pub step_delay: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_millis(200),
            step_delay: Duration::from_millis(500),
        }
    }
}

/// Drains the job pool forever: snapshot the pending jobs, ingest each
/// one for both device profiles, and drop the job on any terminal
/// outcome. There is no retry; a permanently broken link is removed
/// after its one attempt.
pub struct Worker {
    ingestor: Ingestor,
    pool: JobPool,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(ingestor: Ingestor, pool: JobPool, settings: WorkerSettings) -> Self {
        Self {
            ingestor,
            pool,
            settings,
        }
    }

    /// Process one snapshot of the pool; returns how many jobs were
    /// seen. Exposed separately so tests can drive the loop without
    /// wall-clock polling.
    pub async fn drain_once(&self) -> usize {
        let jobs = match self.pool.list().await {
            Ok(jobs) => jobs,
            Err(err) => {
                ingest_error!("failed to list jobs: {err}");
                return 0;
            }
        };

        for job in &jobs {
            ingest_info!("processing job {} from {}", job.link, job.submitted_by);
            let desktop = self
                .ingestor
                .ingest(
                    job.link.as_str(),
                    &job.title,
                    "",
                    &job.submitted_by,
                    DeviceProfile::Desktop,
                )
                .await;
            tokio::time::sleep(self.settings.step_delay).await;
            let mobile = self
                .ingestor
                .ingest(
                    job.link.as_str(),
                    &job.title,
                    "",
                    &job.submitted_by,
                    DeviceProfile::Mobile,
                )
                .await;

            // Every terminal outcome clears the job: success, duplicate,
            // and failure alike. Only an empty link leaves it queued,
            // which submit() has already made unreachable.
            let terminal = desktop != IngestOutcome::SkippedEmptyLink
                || mobile != IngestOutcome::SkippedEmptyLink;
            if terminal {
                if let Err(err) = self.pool.remove(&job.link, &job.submitted_by).await {
                    ingest_error!("failed to remove job {}: {err}", job.link);
                }
            } else {
                ingest_debug!("job {} left in pool (empty link)", job.link);
            }
        }

        jobs.len()
    }

    /// Run the drain loop forever. Any per-job error is absorbed inside
    /// `drain_once`; the loop itself has no failure mode.
    pub async fn run(&self) {
        loop {
            let processed = self.drain_once().await;
            if processed == 0 {
                tokio::time::sleep(self.settings.idle_delay).await;
            }
        }
    }
}
