use std::io::BufRead;
use std::thread;

use engine_logging::engine_info;
use tubefetch_core::ControlToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Pause,
    Resume,
    Stop,
}

pub(crate) const HELP: &str = "Controls: p + Enter pauses, r resumes, s or q stops.";

pub(crate) fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Control::Pause),
        "r" | "resume" => Some(Control::Resume),
        "s" | "q" | "stop" | "quit" => Some(Control::Stop),
        _ => None,
    }
}

pub(crate) fn apply(control: Control, token: &ControlToken) {
    match control {
        Control::Pause => token.pause(),
        Control::Resume => token.resume(),
        Control::Stop => token.cancel(),
    }
}

/// Read controls from stdin until EOF or a stop.
pub(crate) fn spawn_reader(token: ControlToken) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let Some(control) = parse_control(&line) else {
                eprintln!("{HELP}");
                continue;
            };
            engine_info!("console control: {:?}", control);
            apply(control, &token);
            if control == Control::Stop {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(parse_control("p"), Some(Control::Pause));
        assert_eq!(parse_control(" Resume \n"), Some(Control::Resume));
        assert_eq!(parse_control("q"), Some(Control::Stop));
        assert_eq!(parse_control("S"), Some(Control::Stop));
        assert_eq!(parse_control("x"), None);
        assert_eq!(parse_control(""), None);
    }

    #[test]
    fn controls_flip_the_token() {
        let token = ControlToken::new();
        apply(Control::Pause, &token);
        assert!(token.is_paused());
        apply(Control::Resume, &token);
        assert!(!token.is_paused());
        apply(Control::Stop, &token);
        assert!(token.is_cancelled());
    }
}
