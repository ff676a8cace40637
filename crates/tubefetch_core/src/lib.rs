//! Tubefetch core: pure job model shared by the engine and front ends.
mod progress;
mod record;
mod schema;
mod token;

pub use progress::{JobEvent, Phase, ProgressSink, ProgressSnapshot};
pub use record::{ResolutionRecord, WorkItem, FAILED};
pub use schema::{
    build_query, classify, needs_resolution, plan, InputKind, LinkPolicy, ResolutionPlan, Table,
    ARTIST_COLUMNS, QUERY_COLUMN, TRACK_COLUMNS, URL_COLUMN,
};
pub use token::ControlToken;
