//! The local display.
//!
//! The chat core never prints; it hands [`ConsoleEvent`]s to a [`Console`].
//! [`TerminalConsole`] renders them for an interactive terminal.

use std::io::Write;
use std::time::Duration;

use super::command::Command;
use super::Role;

const COLOR_RED: &str = "\x1b[31m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_YELLOW: &str = "\x1b[33m";
const COLOR_BLUE: &str = "\x1b[34m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Per-session counters shown by `/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Peer label
    pub peer: String,
    /// Time since the chat started
    pub elapsed: Duration,
    /// Messages written to the peer
    pub sent: u64,
    /// Messages read from the peer
    pub received: u64,
}

/// Something the chat core wants shown locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEvent<'a> {
    /// Text received from the peer
    Peer {
        /// Who sent it
        from: &'a str,
        /// Message text, terminators stripped
        text: &'a str,
    },
    /// A local line that was sent
    Sent(&'a str),
    /// Progress or status information
    Notice(&'a str),
    /// Something went wrong but the session continues (or is ending)
    Warning(&'a str),
    /// The next local line will be sent as the password
    SecretPrompt {
        /// 1-based attempt number
        attempt: u32,
        /// Attempts allowed
        max: u32,
    },
    /// List the commands for a role
    Help(Role),
    /// Clear the display
    Clear,
    /// Session statistics
    Status(&'a StatusReport),
}

/// Display collaborator.
pub trait Console {
    /// Show one event.
    fn show(&mut self, event: ConsoleEvent<'_>);
}

/// Colored, timestamped terminal output on stdout.
pub struct TerminalConsole {
    role: Role,
}

impl TerminalConsole {
    /// Create a console for `role`.
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// Print the startup banner.
    pub fn banner(&mut self) {
        let title = match self.role {
            Role::Client => "TOR CHAT CLIENT",
            Role::Server => "TOR CHAT SERVER",
        };
        let rule = "=".repeat(58);
        println!();
        println!("{}{}{}", COLOR_CYAN, rule, COLOR_RESET);
        println!("{}{:^58}{}", COLOR_CYAN, title, COLOR_RESET);
        println!("{}{}{}", COLOR_CYAN, rule, COLOR_RESET);
        println!();
    }

    fn timestamp(&self) -> String {
        chrono::Local::now().format("[%H:%M:%S]").to_string()
    }

    fn line(&self, color: &str, text: impl std::fmt::Display) {
        println!(
            "{}{}{} {}{}{}",
            COLOR_YELLOW,
            self.timestamp(),
            COLOR_RESET,
            color,
            text,
            COLOR_RESET
        );
    }
}

impl Console for TerminalConsole {
    fn show(&mut self, event: ConsoleEvent<'_>) {
        match event {
            ConsoleEvent::Peer { from, text } => {
                self.line(COLOR_BLUE, format_args!("{}: {}", from, text))
            }
            ConsoleEvent::Sent(text) => self.line(COLOR_CYAN, format_args!("You: {}", text)),
            ConsoleEvent::Notice(text) => self.line(COLOR_GREEN, text),
            ConsoleEvent::Warning(text) => self.line(COLOR_RED, text),
            ConsoleEvent::SecretPrompt { attempt, max } => {
                print!(
                    "{}Enter password (attempt {}/{}): {}",
                    COLOR_YELLOW, attempt, max, COLOR_RESET
                );
                let _ = std::io::stdout().flush();
            }
            ConsoleEvent::Help(role) => {
                println!("{}\nAvailable commands:{}", COLOR_YELLOW, COLOR_RESET);
                for command in Command::available(role) {
                    println!(
                        "  {}{:<8}{} - {}",
                        COLOR_CYAN,
                        command.token(),
                        COLOR_RESET,
                        command.description()
                    );
                }
                println!("  Just type and press Enter to send a message\n");
            }
            ConsoleEvent::Clear => {
                print!("{}", CLEAR_SCREEN);
                self.banner();
            }
            ConsoleEvent::Status(report) => self.line(
                COLOR_GREEN,
                format_args!(
                    "Status: active with {} for {}s, {} sent, {} received",
                    report.peer,
                    report.elapsed.as_secs(),
                    report.sent,
                    report.received
                ),
            ),
        }
    }
}

/// Console that forwards owned copies of every event, for tests.
#[cfg(test)]
pub(crate) mod recording {
    use tokio::sync::mpsc;

    use super::{Console, ConsoleEvent};
    use crate::chat::Role;

    /// Owned form of [`ConsoleEvent`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Recorded {
        Peer(String),
        Sent(String),
        Notice(String),
        Warning(String),
        SecretPrompt(u32, u32),
        Help(Role),
        Clear,
        Status { sent: u64, received: u64 },
    }

    pub(crate) struct RecordingConsole {
        tx: mpsc::UnboundedSender<Recorded>,
    }

    impl RecordingConsole {
        pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Recorded>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { tx }, rx)
        }
    }

    impl Console for RecordingConsole {
        fn show(&mut self, event: ConsoleEvent<'_>) {
            let recorded = match event {
                ConsoleEvent::Peer { text, .. } => Recorded::Peer(text.to_string()),
                ConsoleEvent::Sent(text) => Recorded::Sent(text.to_string()),
                ConsoleEvent::Notice(text) => Recorded::Notice(text.to_string()),
                ConsoleEvent::Warning(text) => Recorded::Warning(text.to_string()),
                ConsoleEvent::SecretPrompt { attempt, max } => Recorded::SecretPrompt(attempt, max),
                ConsoleEvent::Help(role) => Recorded::Help(role),
                ConsoleEvent::Clear => Recorded::Clear,
                ConsoleEvent::Status(report) => Recorded::Status {
                    sent: report.sent,
                    received: report.received,
                },
            };
            let _ = self.tx.send(recorded);
        }
    }
}
