use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_error, engine_info};
use tubefetch_core::{
    needs_resolution, plan, ControlToken, InputKind, LinkPolicy, ProgressSink, ResolutionRecord,
    Table, WorkItem,
};

use crate::persist::{ensure_output_dir, parent_dir};
use crate::table;
use crate::{
    AudioFormat, DispatchError, DispatchSettings, DispatchSummary, Fetcher, MediaFetchPool,
    QueryResolutionPool, Resolver,
};

/// Where one job reads and writes its tables and media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    /// Append-only `query,url` table.
    pub output_table: PathBuf,
    /// One-column `query` table, rewritten by every resolution phase.
    pub failed_table: PathBuf,
    pub dest_dir: PathBuf,
}

impl JobPaths {
    /// `<dest>/<stem>_links.csv` and `<dest>/<stem>_failed.csv` for `input`.
    pub fn for_input(input: &Path, dest_dir: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "playlist".to_string());
        Self {
            output_table: dest_dir.join(format!("{stem}_links.csv")),
            failed_table: dest_dir.join(format!("{stem}_failed.csv")),
            dest_dir: dest_dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRequest {
    pub format: AudioFormat,
    /// Run the fetch phase after resolution.
    pub fetch_media: bool,
}

impl Default for DispatchRequest {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            fetch_media: true,
        }
    }
}

/// Classifies an input table and drives resolution then fetching.
pub struct JobDispatcher {
    resolver: Arc<dyn Resolver>,
    fetcher: Arc<dyn Fetcher>,
    settings: DispatchSettings,
}

impl JobDispatcher {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        fetcher: Arc<dyn Fetcher>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            settings,
        }
    }

    /// Read `input` and dispatch it; an unreadable file is an input error.
    pub async fn dispatch_file(
        &self,
        input: &Path,
        paths: &JobPaths,
        request: &DispatchRequest,
        token: &ControlToken,
        sink: &dyn ProgressSink,
    ) -> Result<DispatchSummary, DispatchError> {
        let path = input.to_path_buf();
        let read = blocking(move || {
            table::read_table(&path)
                .map_err(|err| DispatchError::Input(format!("Error reading input table: {err}")))
        });
        let table = match read.await {
            Ok(table) => table,
            Err(err) => return Err(report(sink, err)),
        };
        self.dispatch(&table, paths, request, token, sink).await
    }

    /// Run whichever phases `table` calls for.
    ///
    /// Every `Err` has already been emitted once as an error event.
    pub async fn dispatch(
        &self,
        table: &Table,
        paths: &JobPaths,
        request: &DispatchRequest,
        token: &ControlToken,
        sink: &dyn ProgressSink,
    ) -> Result<DispatchSummary, DispatchError> {
        self.run(table, paths, request, token, sink)
            .await
            .map_err(|err| report(sink, err))
    }

    async fn run(
        &self,
        table: &Table,
        paths: &JobPaths,
        request: &DispatchRequest,
        token: &ControlToken,
        sink: &dyn ProgressSink,
    ) -> Result<DispatchSummary, DispatchError> {
        let policy = LinkPolicy::new(self.settings.host_token.clone());
        let plan = plan(table, &policy);
        let mut summary = DispatchSummary::new(plan.kind);
        engine_info!(
            "dispatching {} rows as {:?}: {} residual, {} valid links",
            table.len(),
            plan.kind,
            plan.residual.len(),
            plan.valid_links.len()
        );

        match plan.kind {
            InputKind::Unrecognized => {
                return Err(DispatchError::Input(
                    "Unrecognized input table format.".to_string(),
                ));
            }
            InputKind::LinksOnly => {
                if plan.rejected_links > 0 {
                    sink.log(format!(
                        "Ignoring {} malformed links.",
                        plan.rejected_links
                    ));
                }
                if plan.valid_links.is_empty() {
                    return Err(DispatchError::Input(
                        "No valid links found in input table.".to_string(),
                    ));
                }
                summary.already_valid = plan.valid_links.len();
                let links = plan.valid_links.into_iter().map(|item| item.value);
                self.fetch_phase(links.collect(), paths, request, token, sink, &mut summary)
                    .await?;
                return Ok(summary);
            }
            InputKind::ArtistTrack { .. } | InputKind::Queries { .. } => {}
        }

        summary.already_valid = plan.valid_links.len();
        if plan.blank_rows > 0 {
            sink.log(format!("Ignoring {} rows with nothing to look up.", plan.blank_rows));
        }
        let mut links: Vec<String> = plan
            .valid_links
            .iter()
            .map(|item| item.value.clone())
            .collect();

        if plan.residual.is_empty() {
            sink.log(format!(
                "All {} tracks already have links. Skipping resolution.",
                summary.already_valid
            ));
        } else {
            let resolved = self
                .resolution_phase(plan.residual, &policy, paths, token, sink, &mut summary)
                .await?;
            if summary.stopped {
                return Ok(summary);
            }
            links.extend(
                resolved
                    .into_iter()
                    .filter(|record| policy.is_valid(&record.url))
                    .map(|record| record.url),
            );
        }

        let mut seen = HashSet::new();
        links.retain(|link| seen.insert(link.clone()));
        self.fetch_phase(links, paths, request, token, sink, &mut summary)
            .await?;
        Ok(summary)
    }

    /// Resolve `residual`, persist the results and return every record now in
    /// the output table.
    async fn resolution_phase(
        &self,
        residual: Vec<WorkItem>,
        policy: &LinkPolicy,
        paths: &JobPaths,
        token: &ControlToken,
        sink: &dyn ProgressSink,
        summary: &mut DispatchSummary,
    ) -> Result<Vec<ResolutionRecord>, DispatchError> {
        let pool_settings = &self.settings.resolve;
        sink.log(format!(
            "Resolving {} missing links (using {} workers)...",
            residual.len(),
            pool_settings.slots()
        ));

        let output_table = paths.output_table.clone();
        let unusable = policy.clone();
        let (mut records, existing) = blocking(move || {
            let table_dir = parent_dir(&output_table);
            ensure_output_dir(table_dir).map_err(|err| {
                DispatchError::Destination(format!("Cannot create {}: {err}", table_dir.display()))
            })?;
            let records = table::read_records(&output_table).map_err(|err| {
                DispatchError::Input(format!("Error reading output table: {err}"))
            })?;
            let existing: HashSet<String> = records
                .iter()
                .filter(|record| !needs_resolution(&record.url, &unusable))
                .map(|record| record.query.clone())
                .collect();
            Ok((records, existing))
        })
        .await?;

        let pool = QueryResolutionPool::new(Arc::clone(&self.resolver), pool_settings.clone())
            .with_link_policy(policy.clone());
        let outcome = pool.run(residual, &existing, token, sink).await;

        let fresh: Vec<ResolutionRecord> = outcome.resolved().cloned().collect();
        let (output_table, failed_table) = (paths.output_table.clone(), paths.failed_table.clone());
        let (appended, failed_queries) = (fresh.clone(), outcome.failed_queries.clone());
        blocking(move || {
            table::append_records(&output_table, &appended).map_err(|err| {
                DispatchError::Destination(format!("Error writing output table: {err}"))
            })?;
            table::write_failed(&failed_table, &failed_queries).map_err(|err| {
                DispatchError::Destination(format!("Error writing failed table: {err}"))
            })
        })
        .await?;

        summary.resolved = fresh.len();
        summary.failed_queries = outcome.failed_queries.len();
        summary.stopped = outcome.stopped;
        if !outcome.failed_queries.is_empty() {
            sink.log(format!(
                "{} queries failed. Saved to {}",
                outcome.failed_queries.len(),
                paths.failed_table.display()
            ));
        }
        sink.log(format!(
            "Done. Links saved to {}",
            paths.output_table.display()
        ));

        records.extend(fresh);
        Ok(records)
    }

    async fn fetch_phase(
        &self,
        links: Vec<String>,
        paths: &JobPaths,
        request: &DispatchRequest,
        token: &ControlToken,
        sink: &dyn ProgressSink,
        summary: &mut DispatchSummary,
    ) -> Result<(), DispatchError> {
        if !request.fetch_media {
            return Ok(());
        }
        if token.is_cancelled() {
            summary.stopped = true;
            return Ok(());
        }
        if links.is_empty() {
            sink.log("No valid links to download.".to_string());
            return Ok(());
        }

        sink.log(format!(
            "Starting audio download for {} tracks...",
            links.len()
        ));
        let items = links
            .into_iter()
            .enumerate()
            .map(|(idx, link)| WorkItem::new(idx, link))
            .collect();
        let pool = MediaFetchPool::new(Arc::clone(&self.fetcher), self.settings.fetch.clone());
        let outcome = pool
            .run(items, &paths.dest_dir, request.format, token, sink)
            .await
            .map_err(|err| {
                DispatchError::Destination(format!(
                    "Cannot write to {}: {err}",
                    paths.dest_dir.display()
                ))
            })?;

        summary.downloaded = outcome.succeeded;
        summary.download_failures = outcome.failed;
        summary.stopped = outcome.stopped;
        Ok(())
    }
}

/// Run table and directory IO on the blocking pool.
async fn blocking<T, F>(op: F) -> Result<T, DispatchError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DispatchError> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|err| DispatchError::Runtime(err.to_string()))?
}

fn report(sink: &dyn ProgressSink, err: DispatchError) -> DispatchError {
    engine_error!("dispatch aborted: {}", err);
    sink.error(err.to_string());
    err
}
