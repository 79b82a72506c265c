//! Shared-secret password exchange.
//!
//! Runs over the stream once the proxy has connected it to the peer. The
//! responder prompts and checks; the initiator answers prompts with locally
//! typed secrets. This is a gate only: the secret crosses the wire in
//! plaintext.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::console::{Console, ConsoleEvent};
use super::line::{read_message, write_message, LineInput};
use crate::error::{Error, Result};
use crate::DEFAULT_MAX_AUTH_ATTEMPTS;

/// Prompt written before each attempt.
pub const PROMPT: &str = "Enter password: ";
/// Written when the secret matches.
pub const SUCCESS: &str = "Authentication successful! Welcome to the secure chat.\n";
/// Written after a wrong secret while attempts remain.
pub const RETRY: &str = "Authentication failed. Please try again.\n";
/// Written after the last wrong secret.
pub const EXHAUSTED: &str = "Maximum authentication attempts exceeded. Connection closed.\n";

const SUCCESS_MARKER: &str = "Authentication successful";
const EXHAUSTED_MARKER: &str = "Maximum authentication attempts";
const PROMPT_KEYWORD: &str = "password";

/// Does a responder message report success?
pub fn is_success(text: &str) -> bool {
    text.contains(SUCCESS_MARKER)
}

/// Does a responder message report that no attempts remain?
pub fn is_exhausted(text: &str) -> bool {
    text.contains(EXHAUSTED_MARKER)
}

/// Does a responder message ask for the password?
///
/// Substring match, case-insensitive. Any message mentioning "password" is
/// taken as a prompt, including ordinary chat text; peers rely on this.
pub fn looks_like_prompt(text: &str) -> bool {
    text.to_ascii_lowercase().contains(PROMPT_KEYWORD)
}

/// The responder's password. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// True if no secret was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact comparison against a submitted candidate.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Attempt bookkeeping for one connection.
#[derive(Debug)]
pub struct AuthSession {
    attempts: u32,
    max_attempts: u32,
}

impl AuthSession {
    /// Start a session allowing `max_attempts` tries.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    /// Attempts used so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempts allowed.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// No attempts left.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Use up one attempt, returning its 1-based number.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AUTH_ATTEMPTS)
    }
}

/// Challenge the peer for `secret`, consuming `session`.
///
/// Returns the stream after a match. Fails with [`Error::AuthFailed`] once
/// every attempt is used or as soon as the peer disconnects.
pub async fn respond<S>(
    mut stream: S,
    secret: &SharedSecret,
    mut session: AuthSession,
    max_line_len: usize,
) -> Result<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while !session.is_exhausted() {
        write_message(&mut stream, PROMPT).await?;

        let candidate = match read_message(&mut stream, max_line_len).await {
            Ok(Some(text)) => Zeroizing::new(text),
            Ok(None) => {
                return Err(Error::auth_failed(format!(
                    "peer disconnected during authentication after {} of {} attempts",
                    session.attempts(),
                    session.max_attempts()
                )))
            }
            Err(e) => {
                return Err(Error::auth_failed(format!(
                    "peer disconnected during authentication: {}",
                    e
                )))
            }
        };

        if secret.matches(&candidate) {
            tracing::info!(
                "Authentication attempt {}/{}: success",
                session.attempts() + 1,
                session.max_attempts()
            );
            write_message(&mut stream, SUCCESS).await?;
            return Ok(stream);
        }

        let attempt = session.record_attempt();
        tracing::info!(
            "Authentication attempt {}/{}: failed",
            attempt,
            session.max_attempts()
        );

        if session.is_exhausted() {
            if let Err(e) = write_message(&mut stream, EXHAUSTED).await {
                tracing::debug!("Failed to send exhaustion notice: {}", e);
            }
            break;
        }
        write_message(&mut stream, RETRY).await?;
    }

    Err(Error::auth_failed("maximum authentication attempts exceeded"))
}

/// Answer the peer's password prompts with secrets read from `input`.
///
/// Every message from the peer is shown on `console` as coming from `peer`.
/// At most `session.max_attempts()` prompts are answered. An empty local
/// line is refused and asked for again without using an attempt.
pub async fn initiate<S, C>(
    mut stream: S,
    input: &mut LineInput,
    console: &mut C,
    mut session: AuthSession,
    peer: &str,
    max_line_len: usize,
) -> Result<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Console + ?Sized,
{
    console.show(ConsoleEvent::Notice("Starting authentication..."));

    loop {
        let text = match read_message(&mut stream, max_line_len).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                return Err(Error::auth_failed("server disconnected during authentication"))
            }
            Err(e) => {
                return Err(Error::auth_failed(format!(
                    "server disconnected during authentication: {}",
                    e
                )))
            }
        };

        console.show(ConsoleEvent::Peer {
            from: peer,
            text: &text,
        });

        if is_success(&text) {
            tracing::info!("Authenticated after {} attempt(s)", session.attempts());
            return Ok(stream);
        }
        if is_exhausted(&text) {
            return Err(Error::auth_failed("maximum authentication attempts exceeded"));
        }
        if !looks_like_prompt(&text) {
            continue;
        }

        if session.is_exhausted() {
            return Err(Error::auth_failed("too many authentication attempts"));
        }
        // Empty lines are refused without using an attempt.
        let secret = loop {
            console.show(ConsoleEvent::SecretPrompt {
                attempt: session.attempts() + 1,
                max: session.max_attempts(),
            });

            match input.next_line().await {
                Ok(Some(line)) if line.is_empty() => {
                    console.show(ConsoleEvent::Warning("Password cannot be empty"));
                }
                Ok(Some(line)) => break Zeroizing::new(line),
                Ok(None) => {
                    return Err(Error::auth_failed("input closed before a password was entered"))
                }
                Err(e @ Error::LineTooLong { .. }) => return Err(Error::auth_failed(e.to_string())),
                Err(e) => return Err(e),
            }
        };
        session.record_attempt();
        write_message(&mut stream, &secret).await?;
    }
}
