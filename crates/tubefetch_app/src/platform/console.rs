use std::collections::HashSet;
use std::io::{self, Write};

use tubefetch_core::{JobEvent, ProgressSnapshot};
use tubefetch_engine::{DispatchError, DispatchSummary};

const FETCH_FAILURE_PREFIX: &str = "Failed to download ";

/// One thing to show on the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Output {
    Line(String),
    Error(String),
    /// Replaces the previous progress line.
    Progress(String),
}

/// Turns job events into terminal output, folding repeated download failures.
#[derive(Debug, Default)]
pub(crate) struct Console {
    failed_links: HashSet<String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &JobEvent) -> Option<Output> {
        match event {
            JobEvent::Log(msg) => match msg.strip_prefix(FETCH_FAILURE_PREFIX) {
                Some(rest) => {
                    let link = rest.split(": ").next().unwrap_or(rest).trim();
                    self.failed_links.insert(link.to_string());
                    None
                }
                None => Some(Output::Line(msg.clone())),
            },
            JobEvent::Progress(snapshot) => Some(Output::Progress(progress_line(snapshot))),
            JobEvent::Error(msg) => Some(Output::Error(msg.clone())),
        }
    }

    /// Closing lines once the job has returned.
    pub fn finish(&self, result: &Result<DispatchSummary, DispatchError>) -> Vec<Output> {
        let mut out = Vec::new();
        if !self.failed_links.is_empty() {
            out.push(Output::Error(format!(
                "{} downloads failed. See the log file for details.",
                self.failed_links.len()
            )));
        }
        match result {
            Ok(summary) if summary.stopped => out.push(Output::Line("Stopped.".to_string())),
            Ok(_) => out.push(Output::Line("All done!".to_string())),
            Err(_) => {}
        }
        out
    }
}

pub(crate) fn progress_line(snapshot: &ProgressSnapshot) -> String {
    format!(
        "[{}] {:>3}% | Completed: {} | Skipped: {} | Failed: {} | Total: {}",
        snapshot.phase,
        snapshot.percent(),
        snapshot.completed,
        snapshot.skipped,
        snapshot.failed,
        snapshot.total
    )
}

/// Writes outputs, keeping the progress line on one redrawn row.
#[derive(Debug, Default)]
pub(crate) struct Printer {
    progress_open: bool,
}

impl Printer {
    pub fn print(&mut self, output: Output) {
        let mut stdout = io::stdout().lock();
        match output {
            Output::Progress(line) => {
                let _ = write!(stdout, "\r{line}");
                let _ = stdout.flush();
                self.progress_open = true;
            }
            Output::Line(line) => {
                self.close_progress(&mut stdout);
                let _ = writeln!(stdout, "{line}");
            }
            Output::Error(line) => {
                self.close_progress(&mut stdout);
                let _ = stdout.flush();
                eprintln!("{line}");
            }
        }
    }

    fn close_progress(&mut self, stdout: &mut impl Write) {
        if self.progress_open {
            let _ = writeln!(stdout);
            self.progress_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tubefetch_core::{InputKind, Phase};

    fn summary(stopped: bool) -> DispatchSummary {
        DispatchSummary {
            kind: InputKind::LinksOnly,
            already_valid: 0,
            resolved: 0,
            failed_queries: 0,
            downloaded: 0,
            download_failures: 0,
            stopped,
        }
    }

    #[test]
    fn progress_line_shows_percent_and_counters() {
        let snapshot = ProgressSnapshot {
            phase: Phase::Resolve,
            completed: 2,
            skipped: 1,
            failed: 1,
            total: 4,
        };
        assert_eq!(
            progress_line(&snapshot),
            "[resolve]  75% | Completed: 2 | Skipped: 1 | Failed: 1 | Total: 4"
        );
    }

    #[test]
    fn download_failures_are_folded_per_link() {
        let mut console = Console::new();
        for msg in [
            "Failed to download https://youtube.com/watch?v=a: gone",
            "Failed to download https://youtube.com/watch?v=a: gone again",
            "Failed to download https://youtube.com/watch?v=b: private",
        ] {
            assert_eq!(console.apply(&JobEvent::Log(msg.to_string())), None);
        }

        assert_eq!(
            console.finish(&Ok(summary(false))),
            vec![
                Output::Error("2 downloads failed. See the log file for details.".to_string()),
                Output::Line("All done!".to_string()),
            ]
        );
    }

    #[test]
    fn other_events_pass_through() {
        let mut console = Console::new();
        assert_eq!(
            console.apply(&JobEvent::Log("Downloaded x (1/1)".to_string())),
            Some(Output::Line("Downloaded x (1/1)".to_string()))
        );
        assert_eq!(
            console.apply(&JobEvent::Error("Unrecognized input table format.".to_string())),
            Some(Output::Error("Unrecognized input table format.".to_string()))
        );
        assert_eq!(console.finish(&Ok(summary(true))), vec![Output::Line("Stopped.".to_string())]);
        assert!(console
            .finish(&Err(DispatchError::Input("bad".to_string())))
            .is_empty());
    }
}
