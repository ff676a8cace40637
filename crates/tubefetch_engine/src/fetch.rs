use std::path::Path;
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use tubefetch_core::{ControlToken, Phase, ProgressSink, ProgressSnapshot, WorkItem};

use crate::persist::{ensure_output_dir, PersistError};
use crate::pool::{run_bounded, Drain};
use crate::{AudioFormat, Fetcher, PoolSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub snapshot: ProgressSnapshot,
    pub stopped: bool,
}

/// Downloads a batch of links with bounded concurrency.
pub struct MediaFetchPool {
    fetcher: Arc<dyn Fetcher>,
    settings: PoolSettings,
}

impl MediaFetchPool {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: PoolSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Fetch every link in `items` into `dest_dir`.
    ///
    /// Only a missing or unwritable `dest_dir` is an error; per-link faults
    /// are counted in the outcome.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        dest_dir: &Path,
        format: AudioFormat,
        token: &ControlToken,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutcome, PersistError> {
        let dir = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || ensure_output_dir(&dir))
            .await
            .map_err(|err| PersistError::OutputDir(err.to_string()))??;

        let total = items.len();
        let mut snapshot = ProgressSnapshot::new(Phase::Fetch, total);
        engine_info!(
            "fetching {} links as {} into {:?} with {} workers",
            total,
            format,
            dest_dir,
            self.settings.slots()
        );

        let drain = run_bounded(
            items,
            &self.settings,
            token,
            |item: &WorkItem| {
                let fetcher = Arc::clone(&self.fetcher);
                let link = item.value.clone();
                let dest_dir = dest_dir.to_path_buf();
                async move { fetcher.fetch(&link, &dest_dir, format).await }
            },
            |item, result| {
                let link = item.value;
                snapshot.completed += 1;
                match result {
                    Ok(Ok(())) => {
                        sink.log(format!(
                            "Downloaded {link} ({}/{total})",
                            snapshot.completed
                        ));
                    }
                    Ok(Err(err)) => {
                        snapshot.failed += 1;
                        engine_warn!("download failed for {}: {}", link, err);
                        sink.log(format!("Failed to download {link}: {err}"));
                    }
                    Err(panic) => {
                        snapshot.failed += 1;
                        engine_warn!("fetcher panicked for {}: {}", link, panic);
                        sink.log(format!("Failed to download {link}: {panic}"));
                    }
                }
                sink.progress(snapshot);
            },
        )
        .await;

        let stopped = drain == Drain::Stopped;
        if stopped {
            sink.log("Download stopped by user.".to_string());
        }
        let outcome = FetchOutcome {
            succeeded: snapshot.succeeded(),
            failed: snapshot.failed,
            snapshot,
            stopped,
        };
        sink.log(format!(
            "Download complete. {} succeeded, {} failed.",
            outcome.succeeded, outcome.failed
        ));
        Ok(outcome)
    }
}
