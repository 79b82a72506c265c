//! Chat session layer.
//!
//! Everything that happens after the transport is connected:
//!
//! - [`auth`]: the shared-secret gate (responder and initiator)
//! - [`event_loop`]: the duplex chat itself
//! - [`line`]: wire framing and local line input
//! - [`command`]: local `/` commands
//! - [`console`]: local display

pub mod auth;
pub mod command;
pub mod console;
pub mod event_loop;
pub mod line;

pub use auth::{initiate, respond, AuthSession, SharedSecret};
pub use command::Command;
pub use console::{Console, ConsoleEvent, StatusReport, TerminalConsole};
pub use event_loop::{run, LoopOptions, SessionEnd, SessionStats};
pub use line::LineInput;

/// Which end of the conversation this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dials out through the proxy and answers password prompts
    Client,
    /// Accepts connections and checks the password
    Server,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}
