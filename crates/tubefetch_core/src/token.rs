use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    paused: AtomicBool,
    cancelled: AtomicBool,
}

/// Pause/cancel signal pair shared by every unit of work in one job.
///
/// Clones share the same flags. Reads are plain atomic loads, so a worker can
/// check the token at any point without contending with the controller.
#[derive(Debug, Clone, Default)]
pub struct ControlToken {
    flags: Arc<Flags>,
}

impl ControlToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.flags.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::Release);
    }

    /// One-way: there is no way to clear a cancelled token.
    pub fn cancel(&self) {
        self.flags.cancelled.store(true, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::Acquire)
    }
}
