use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use engine_logging::engine_warn;
use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tubefetch_core::ControlToken;

use crate::PoolSettings;

/// How a bounded batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drain {
    Completed,
    Stopped,
}

/// Result of one unit: the capability's output, or the panic message if the
/// unit panicked.
pub(crate) type UnitResult<O> = Result<O, String>;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Run `start` over `items` with at most `settings.slots()` units in flight.
///
/// Every accepted unit is handed to `accept` on the caller's task, so the
/// caller owns all counters without sharing them with workers. The token is
/// read before each submission and before each result is accepted; while
/// paused nothing is submitted or accepted. After a cancel the remaining
/// in-flight units run to completion and their results are dropped.
pub(crate) async fn run_bounded<I, O, F, Fut, A>(
    items: Vec<I>,
    settings: &PoolSettings,
    token: &ControlToken,
    mut start: F,
    mut accept: A,
) -> Drain
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(&I) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
    A: FnMut(I, UnitResult<O>),
{
    let slots = settings.slots();
    let poll = settings.poll_interval;
    let mut pending = items.into_iter();
    let mut in_flight: JoinSet<(I, UnitResult<O>)> = JoinSet::new();

    let drain = loop {
        if token.is_cancelled() {
            break Drain::Stopped;
        }
        if token.is_paused() {
            sleep(poll).await;
            continue;
        }

        while in_flight.len() < slots && !token.is_cancelled() {
            let Some(item) = pending.next() else {
                break;
            };
            let unit = start(&item);
            in_flight.spawn(async move {
                let result = AssertUnwindSafe(unit).catch_unwind().await;
                (item, result.map_err(panic_message))
            });
        }

        if in_flight.is_empty() {
            break if token.is_cancelled() {
                Drain::Stopped
            } else {
                Drain::Completed
            };
        }

        tokio::select! {
            joined = in_flight.join_next() => {
                let Some(joined) = joined else {
                    continue;
                };
                while token.is_paused() && !token.is_cancelled() {
                    sleep(poll).await;
                }
                if token.is_cancelled() {
                    break Drain::Stopped;
                }
                match joined {
                    Ok((item, result)) => accept(item, result),
                    Err(err) => engine_warn!("pool task ended abnormally: {}", err),
                }
            }
            _ = sleep(poll) => {}
        }
    };

    if drain == Drain::Stopped {
        while in_flight.join_next().await.is_some() {}
    }
    drain
}
