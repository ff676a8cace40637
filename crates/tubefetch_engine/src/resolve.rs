use std::collections::HashSet;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tubefetch_core::{
    ControlToken, LinkPolicy, Phase, ProgressSink, ProgressSnapshot, ResolutionRecord, WorkItem,
    FAILED,
};

use crate::pool::{run_bounded, Drain};
use crate::{PoolSettings, Resolver};

/// What a resolution batch produced before it drained or was stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// One record per attempted query, in completion order. Failed lookups
    /// carry the `FAILED` sentinel.
    pub results: Vec<ResolutionRecord>,
    pub failed_queries: Vec<String>,
    pub snapshot: ProgressSnapshot,
    pub stopped: bool,
}

impl ResolutionOutcome {
    /// Records with a usable link, i.e. everything except sentinel results.
    pub fn resolved(&self) -> impl Iterator<Item = &ResolutionRecord> {
        self.results.iter().filter(|record| !record.is_failed())
    }
}

/// Resolves a batch of queries with bounded concurrency.
pub struct QueryResolutionPool {
    resolver: Arc<dyn Resolver>,
    settings: PoolSettings,
    policy: Option<LinkPolicy>,
}

impl QueryResolutionPool {
    pub fn new(resolver: Arc<dyn Resolver>, settings: PoolSettings) -> Self {
        Self {
            resolver,
            settings,
            policy: None,
        }
    }

    /// Record links that `policy` rejects as `FAILED` instead of keeping them.
    pub fn with_link_policy(mut self, policy: LinkPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Resolve every query in `items` that is not already in `existing`.
    ///
    /// Queries found in `existing`, and repeats of a query earlier in the same
    /// batch, are skipped without a resolver call.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        existing: &HashSet<String>,
        token: &ControlToken,
        sink: &dyn ProgressSink,
    ) -> ResolutionOutcome {
        let mut snapshot = ProgressSnapshot::new(Phase::Resolve, items.len());
        let mut outcome = ResolutionOutcome {
            results: Vec::new(),
            failed_queries: Vec::new(),
            snapshot,
            stopped: false,
        };

        let mut submitted: HashSet<String> = HashSet::new();
        let mut batch = Vec::with_capacity(items.len());
        for item in items {
            if token.is_cancelled() {
                sink.log("Stopped by user.".to_string());
                outcome.stopped = true;
                outcome.snapshot = snapshot;
                return outcome;
            }
            if existing.contains(&item.value) || submitted.contains(&item.value) {
                snapshot.skipped += 1;
                sink.progress(snapshot);
                sink.log(format!("Skipped: {} already exists.", item.value));
                continue;
            }
            submitted.insert(item.value.clone());
            batch.push(item);
        }

        let attempted = batch.len();
        engine_info!(
            "resolving {} queries ({} skipped) with {} workers",
            attempted,
            snapshot.skipped,
            self.settings.slots()
        );

        let results = &mut outcome.results;
        let failed_queries = &mut outcome.failed_queries;
        let policy = self.policy.as_ref();
        let drain = run_bounded(
            batch,
            &self.settings,
            token,
            |item: &WorkItem| {
                let resolver = Arc::clone(&self.resolver);
                let query = item.value.clone();
                async move { resolver.resolve(&query).await }
            },
            |item, result| {
                let query = item.value;
                let link = match result {
                    Ok(Ok(link)) if link.trim().is_empty() => {
                        engine_debug!("resolver returned an empty link for {:?}", query);
                        FAILED.to_string()
                    }
                    Ok(Ok(link)) if policy.is_some_and(|p| !p.is_valid(&link)) => {
                        engine_warn!("resolver returned unusable link {:?} for {:?}", link, query);
                        sink.log(format!("Lookup for {query} returned an unusable link: {link}"));
                        FAILED.to_string()
                    }
                    Ok(Ok(link)) => link.trim().to_string(),
                    Ok(Err(err)) => {
                        engine_warn!("lookup failed for {:?}: {}", query, err);
                        sink.log(format!("Lookup failed for {query}: {err}"));
                        FAILED.to_string()
                    }
                    Err(panic) => {
                        engine_warn!("resolver panicked for {:?}: {}", query, panic);
                        sink.log(format!("Lookup crashed for {query}: {panic}"));
                        FAILED.to_string()
                    }
                };

                snapshot.completed += 1;
                if link == FAILED {
                    snapshot.failed += 1;
                    failed_queries.push(query.clone());
                }
                sink.progress(snapshot);
                sink.log(format!(
                    "{}/{}: {} -> {}",
                    snapshot.completed, attempted, query, link
                ));
                results.push(ResolutionRecord::resolved(query, link));
            },
        )
        .await;

        if drain == Drain::Stopped {
            sink.log("Stopped by user.".to_string());
            outcome.stopped = true;
        }
        outcome.snapshot = snapshot;
        outcome
    }
}
