//! Local commands.
//!
//! A line is a command only if it matches a reserved token exactly; a chat
//! message equal to one of them cannot be sent.

use super::Role;

/// A locally executed command. Never sent to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// End the session (`/quit`, `/exit`)
    Quit,
    /// List commands (`/help`, client only)
    Help,
    /// Clear the screen (`/clear`, client only)
    Clear,
    /// Show session statistics (`/status`, server only)
    Status,
}

impl Command {
    /// Parse `line` as a command available to `role`.
    pub fn parse(line: &str, role: Role) -> Option<Command> {
        let command = match line {
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            "/clear" => Command::Clear,
            "/status" => Command::Status,
            _ => return None,
        };

        if Self::available(role).contains(&command) {
            Some(command)
        } else {
            None
        }
    }

    /// Commands `role` understands.
    pub fn available(role: Role) -> &'static [Command] {
        match role {
            Role::Client => &[Command::Quit, Command::Help, Command::Clear],
            Role::Server => &[Command::Quit, Command::Status],
        }
    }

    /// Primary token.
    pub fn token(self) -> &'static str {
        match self {
            Command::Quit => "/quit",
            Command::Help => "/help",
            Command::Clear => "/clear",
            Command::Status => "/status",
        }
    }

    /// One-line description for help output.
    pub fn description(self) -> &'static str {
        match self {
            Command::Quit => "Exit the chat (also /exit)",
            Command::Help => "Show this help message",
            Command::Clear => "Clear the screen",
            Command::Status => "Show session status",
        }
    }
}
