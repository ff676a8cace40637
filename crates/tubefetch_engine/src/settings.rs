use std::time::Duration;

pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 3;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 6;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum capability calls in flight; 0 is treated as 1.
    pub concurrency: usize,
    /// How often a paused or waiting pool re-reads the control token.
    pub poll_interval: Duration,
}

impl PoolSettings {
    pub fn resolve_default() -> Self {
        Self {
            concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn fetch_default() -> Self {
        Self {
            concurrency: DEFAULT_FETCH_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub(crate) fn slots(&self) -> usize {
        self.concurrency.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub resolve: PoolSettings,
    pub fetch: PoolSettings,
    /// Substring a link must contain to count as resolved.
    pub host_token: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            resolve: PoolSettings::resolve_default(),
            fetch: PoolSettings::fetch_default(),
            host_token: "youtube".to_string(),
        }
    }
}
