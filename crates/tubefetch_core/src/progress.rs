use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Resolve,
    Fetch,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Resolve => write!(f, "resolve"),
            Phase::Fetch => write!(f, "fetch"),
        }
    }
}

/// Aggregate counters of one batch at one instant.
///
/// `completed` counts every finished attempt, `failed` is the failing subset of
/// `completed`, `skipped` counts items settled without an attempt. So
/// `completed + skipped <= total` always holds, with equality once a batch
/// drains without being stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub phase: Phase,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn new(phase: Phase, total: usize) -> Self {
        Self {
            phase,
            completed: 0,
            skipped: 0,
            failed: 0,
            total,
        }
    }

    /// Items that need no further work in this batch.
    pub fn settled(&self) -> usize {
        self.completed + self.skipped
    }

    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }

    /// Whole-number percentage; an empty batch reports 0.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.settled() * 100 / self.total).min(100) as u8
    }

    pub fn is_drained(&self) -> bool {
        self.settled() == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Log(String),
    Progress(ProgressSnapshot),
    /// Terminal for the current dispatch.
    Error(String),
}

/// Receiver for job events; implementations must tolerate calls from any thread.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: JobEvent);

    fn log(&self, msg: String) {
        self.emit(JobEvent::Log(msg));
    }

    fn progress(&self, snapshot: ProgressSnapshot) {
        self.emit(JobEvent::Progress(snapshot));
    }

    fn error(&self, msg: String) {
        self.emit(JobEvent::Error(msg));
    }
}
