//! Progress feedback on stderr.
//!
//! Animated spinners on a terminal, plain `[clawdhub] ...` lines when stderr
//! is redirected, JSON events in `--json` mode, and nothing with `--quiet`.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    NonTty,
    Robot,
    Quiet,
}

impl ProgressMode {
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventType {
    SpinnerStart,
    SpinnerComplete,
    SpinnerError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub event: ProgressEventType,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl ProgressEvent {
    fn new(event: ProgressEventType, operation: &str) -> Self {
        Self {
            event_type: "progress",
            event,
            operation: operation.to_string(),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{json}");
        }
    }
}

pub struct ProgressReporter {
    mode: ProgressMode,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(robot_mode: bool, quiet: bool) -> Self {
        Self {
            mode: ProgressMode::detect(robot_mode, quiet),
        }
    }

    pub fn spinner(&self, msg: &str) -> ProgressHandle {
        match self.mode {
            ProgressMode::Quiet => ProgressHandle::Noop,
            ProgressMode::Robot => {
                ProgressEvent::new(ProgressEventType::SpinnerStart, msg).emit();
                ProgressHandle::Robot {
                    operation: msg.to_string(),
                }
            }
            ProgressMode::NonTty => {
                eprintln!("[clawdhub] {msg}...");
                ProgressHandle::NonTty
            }
            ProgressMode::Tty => {
                let pb = ProgressBar::new_spinner();
                let style = ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
                pb.set_style(style);
                pb.set_message(msg.to_string());
                pb.enable_steady_tick(Duration::from_millis(100));
                ProgressHandle::Tty(pb)
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

pub enum ProgressHandle {
    Tty(ProgressBar),
    NonTty,
    Robot { operation: String },
    Noop,
}

impl ProgressHandle {
    pub fn set_message(&self, msg: impl Into<String>) {
        if let Self::Tty(pb) = self {
            pb.set_message(msg.into());
        }
    }

    /// Stop the spinner before a prompt takes over the terminal.
    pub fn suspend<T>(&self, f: impl FnOnce() -> T) -> T {
        match self {
            Self::Tty(pb) => pb.suspend(f),
            _ => f(),
        }
    }

    pub fn finish(&self) {
        match self {
            Self::Tty(pb) => pb.finish_and_clear(),
            Self::Robot { operation } => {
                ProgressEvent::new(ProgressEventType::SpinnerComplete, operation).emit();
            }
            Self::NonTty | Self::Noop => {}
        }
    }

    pub fn abandon_with_message(&self, msg: &str) {
        match self {
            Self::Tty(pb) => pb.abandon_with_message(format!("✗ {msg}")),
            Self::Robot { operation } => {
                ProgressEvent::new(ProgressEventType::SpinnerError, operation)
                    .with_message(msg)
                    .emit();
            }
            Self::NonTty => eprintln!("[clawdhub] ✗ ERROR: {msg}"),
            Self::Noop => {}
        }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_robot() {
        let mode = ProgressMode::detect(true, true);
        assert_eq!(mode, ProgressMode::Quiet);
    }

    #[test]
    fn robot_mode_without_quiet() {
        let mode = ProgressMode::detect(true, false);
        assert_eq!(mode, ProgressMode::Robot);
    }

    #[test]
    fn quiet_spinner_is_noop() {
        let reporter = ProgressReporter::new(false, true);
        let handle = reporter.spinner("Scanning");
        assert!(handle.is_noop());
        assert_eq!(handle.suspend(|| 7), 7);
        handle.finish();
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = ProgressEvent::new(ProgressEventType::SpinnerComplete, "Publishing")
            .with_message("done");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["event"], "spinner_complete");
        assert_eq!(json["message"], "done");
    }

    #[test]
    fn non_tty_handle_is_not_noop() {
        let reporter = ProgressReporter {
            mode: ProgressMode::NonTty,
        };
        assert!(!reporter.spinner("Checking").is_noop());
    }
}
