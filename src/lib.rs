//! # torchat
//!
//! Password-gated, line-oriented chat between two peers, reached through a
//! local SOCKS5 proxy such as Tor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           client / server orchestration                 │
//! ├─────────────────────────────────────────────────────────┤
//! │  Duplex chat loop (peer stream + local input)           │
//! ├─────────────────────────────────────────────────────────┤
//! │  Password exchange (responder / initiator)              │
//! ├─────────────────────────────────────────────────────────┤
//! │  SOCKS5 CONNECT (client side only)                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  TCP                                                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Each stage takes the stream by value and hands it to the next on
//! success. A failing stage drops it, which closes the connection.
//!
//! Nothing is encrypted by this crate. Confidentiality comes from the
//! proxy's transport, if at all.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod chat;
pub mod client;
pub mod error;
pub mod proxy;
pub mod server;

pub use chat::{LineInput, Role, SessionEnd, TerminalConsole};
pub use client::{ChatClient, ClientConfig};
pub use error::{Error, Result};
pub use server::{ChatServer, ServerConfig};

/// Default SOCKS5 proxy address (a local Tor daemon)
pub const DEFAULT_PROXY_ADDR: &str = "127.0.0.1";

/// Default SOCKS5 proxy port
pub const DEFAULT_PROXY_PORT: u16 = 9050;

/// Default server listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1";

/// Default server listen port
pub const DEFAULT_LISTEN_PORT: u16 = 1234;

/// Password attempts allowed per connection
pub const DEFAULT_MAX_AUTH_ATTEMPTS: u32 = 3;

/// Largest single read from the peer, and largest local line (bytes)
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;
