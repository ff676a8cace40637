#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tubefetch_core::{ControlToken, JobEvent, ProgressSink, ProgressSnapshot};
use tubefetch_engine::{AudioFormat, CapabilityError, Fetcher, PoolSettings, Resolver};

pub fn init_logging() {
    engine_logging::initialize_for_tests();
}

pub fn fast_pool(concurrency: usize) -> PoolSettings {
    PoolSettings {
        concurrency,
        poll_interval: Duration::from_millis(5),
    }
}

pub fn link(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Tracks calls and the peak number of calls running at once.
#[derive(Default)]
pub struct CallGauge {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl CallGauge {
    fn enter(&self, value: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(value.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

/// Resolves queries from a fixed map; unknown queries fail, `"PANIC"` panics.
#[derive(Default)]
pub struct ScriptedResolver {
    links: HashMap<String, String>,
    delay: Duration,
    pub gauge: CallGauge,
}

impl ScriptedResolver {
    pub fn new<Q: AsRef<str>, L: AsRef<str>>(pairs: &[(Q, L)]) -> Self {
        Self {
            links: pairs
                .iter()
                .map(|(q, l)| (q.as_ref().to_string(), l.as_ref().to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Knows no queries, so every lookup fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, query: &str) -> Result<String, CapabilityError> {
        self.gauge.enter(query);
        tokio::time::sleep(self.delay).await;
        self.gauge.leave();
        if query == "PANIC" {
            panic!("resolver blew up");
        }
        self.links
            .get(query)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound(query.to_string()))
    }
}

/// Succeeds for every link except those listed as broken.
#[derive(Default)]
pub struct ScriptedFetcher {
    broken: Vec<String>,
    delay: Duration,
    pub gauge: CallGauge,
    pub destinations: Mutex<Vec<(PathBuf, AudioFormat)>>,
}

impl ScriptedFetcher {
    pub fn new(broken: &[&str]) -> Self {
        Self {
            broken: broken.iter().map(|b| b.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        link: &str,
        dest_dir: &Path,
        format: AudioFormat,
    ) -> Result<(), CapabilityError> {
        self.gauge.enter(link);
        self.destinations
            .lock()
            .unwrap()
            .push((dest_dir.to_path_buf(), format));
        tokio::time::sleep(self.delay).await;
        self.gauge.leave();
        if self.broken.iter().any(|b| b == link) {
            return Err(CapabilityError::Process {
                tool: "stub",
                message: "unavailable video".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub enum Action {
    Pause,
    Cancel,
}

/// Records every event; optionally flips the token once `completed` reaches a count.
#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<JobEvent>>,
    trigger: Option<(usize, Action, ControlToken)>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acting_after(completed: usize, action: Action, token: &ControlToken) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            trigger: Some((completed, action, token.clone())),
        }
    }

    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JobEvent::Log(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JobEvent::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JobEvent::Progress(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect()
    }

    pub fn last_snapshot(&self) -> Option<ProgressSnapshot> {
        self.snapshots().pop()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: JobEvent) {
        let fire = match (&event, &self.trigger) {
            (JobEvent::Progress(snapshot), Some((after, _, _))) => snapshot.completed == *after,
            _ => false,
        };
        self.events.lock().unwrap().push(event);
        if fire {
            if let Some((_, action, token)) = &self.trigger {
                match action {
                    Action::Pause => token.pause(),
                    Action::Cancel => token.cancel(),
                }
            }
        }
    }
}
