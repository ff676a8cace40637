use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use tubefetch_core::{ControlToken, JobEvent, ProgressSink};

use crate::{DispatchError, DispatchRequest, EngineEvent, JobDispatcher, JobPaths};

/// Forwards job events into an engine event channel.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: JobEvent) {
        let _ = self.tx.send(EngineEvent::Job(event));
    }
}

/// One input table to process.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub input: PathBuf,
    pub paths: JobPaths,
    pub request: DispatchRequest,
}

/// A dispatch running on its own thread and runtime, plus its control surface.
///
/// `pause`, `resume` and `cancel` only flip flags, so they are safe to call
/// from a UI thread at any time.
pub struct EngineHandle {
    token: ControlToken,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn start(dispatcher: JobDispatcher, job: JobSpec) -> Self {
        let token = ControlToken::new();
        let (event_tx, event_rx) = mpsc::channel();
        let worker_token = token.clone();

        thread::spawn(move || {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime.block_on(dispatcher.dispatch_file(
                    &job.input,
                    &job.paths,
                    &job.request,
                    &worker_token,
                    &sink,
                )),
                Err(err) => {
                    let err = DispatchError::Runtime(err.to_string());
                    engine_error!("{}", err);
                    sink.error(err.to_string());
                    Err(err)
                }
            };
            engine_info!("job for {:?} finished: {:?}", job.input, result);
            let _ = event_tx.send(EngineEvent::Finished(result));
        });

        Self { token, event_rx }
    }

    pub fn pause(&self) {
        self.token.pause();
    }

    pub fn resume(&self) {
        self.token.resume();
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &ControlToken {
        &self.token
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block until the next event; `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
