//! Tubefetch engine: table IO, worker pools and job dispatch.
mod capability;
mod dispatch;
mod engine;
mod fetch;
mod persist;
mod pool;
mod resolve;
mod settings;
mod table;
mod types;
mod variants;
mod ytdlp;

pub use capability::{Fetcher, Resolver};
pub use dispatch::{DispatchRequest, JobDispatcher, JobPaths};
pub use engine::{ChannelProgressSink, EngineHandle, JobSpec};
pub use fetch::{FetchOutcome, MediaFetchPool};
pub use persist::{append, ensure_output_dir, write_atomic, PersistError};
pub use resolve::{QueryResolutionPool, ResolutionOutcome};
pub use settings::{
    DispatchSettings, PoolSettings, DEFAULT_FETCH_CONCURRENCY, DEFAULT_POLL_INTERVAL,
    DEFAULT_RESOLVE_CONCURRENCY,
};
pub use table::{
    append_records, parse_table, read_records, read_table, sniff_delimiter, write_failed,
    TableError,
};
pub use types::{AudioFormat, CapabilityError, DispatchError, DispatchSummary, EngineEvent};
pub use variants::{clean_query, query_variants};
pub use ytdlp::{YtDlpFetcher, YtDlpResolver};
