use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tubefetch_core::{InputKind, JobEvent};

/// Target audio container handed to the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Opus,
    Flac,
    Mp3,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Opus => "opus",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opus" => Ok(AudioFormat::Opus),
            "flac" => Ok(AudioFormat::Flac),
            "mp3" => Ok(AudioFormat::Mp3),
            other => Err(format!("unsupported audio format {other:?}")),
        }
    }
}

/// Fault raised by a resolver or fetcher for a single item.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("required tool not found: {0}")]
    Unavailable(String),
    #[error("no result for {0:?}")]
    NotFound(String),
    #[error("{tool} failed: {message}")]
    Process { tool: &'static str, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Faults that stop a whole dispatch before or between phases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Unreadable or unrecognised input; no phase ran.
    #[error("{0}")]
    Input(String),
    /// Destination directory or table could not be written.
    #[error("{0}")]
    Destination(String),
    #[error("could not start job runtime: {0}")]
    Runtime(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub kind: InputKind,
    /// Rows whose link was already valid before this dispatch.
    pub already_valid: usize,
    /// Links appended to the output table by this dispatch.
    pub resolved: usize,
    /// Queries written to the failed table by this dispatch.
    pub failed_queries: usize,
    pub downloaded: usize,
    pub download_failures: usize,
    pub stopped: bool,
}

impl DispatchSummary {
    pub(crate) fn new(kind: InputKind) -> Self {
        Self {
            kind,
            already_valid: 0,
            resolved: 0,
            failed_queries: 0,
            downloaded: 0,
            download_failures: 0,
            stopped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Job(JobEvent),
    /// Sent exactly once when the background dispatch returns.
    Finished(Result<DispatchSummary, DispatchError>),
}
