/// Link value recorded for a query whose every lookup variant came back empty.
pub const FAILED: &str = "FAILED";

/// One unit of input for a pool: a query or a link plus its input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub row: usize,
    pub value: String,
}

impl WorkItem {
    pub fn new(row: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            value: value.into(),
        }
    }
}

/// A `query,url` row of the output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRecord {
    pub query: String,
    pub url: String,
}

impl ResolutionRecord {
    pub fn resolved(query: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            url: url.into(),
        }
    }

    pub fn failed(query: impl Into<String>) -> Self {
        Self::resolved(query, FAILED)
    }

    pub fn is_failed(&self) -> bool {
        self.url == FAILED
    }
}
