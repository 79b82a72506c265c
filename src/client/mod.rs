//! Chat client.
//!
//! Proxy connection, SOCKS5 handshake, password exchange and chat, each
//! stage handing the stream to the next.

mod config;

pub use config::ClientConfig;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::chat::{self, AuthSession, Console, ConsoleEvent, LineInput, LoopOptions, Role, SessionEnd};
use crate::error::{Error, Result};
use crate::proxy::{self, ConnectRequest};

/// Label for messages from the server.
const PEER_LABEL: &str = "Server";

/// A configured chat client.
pub struct ChatClient {
    config: ClientConfig,
}

impl ChatClient {
    /// Create a client. Fails on an invalid configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(Error::config)?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect through the proxy and chat until the session ends.
    pub async fn run<C>(&self, input: &mut LineInput, console: &mut C) -> Result<SessionEnd>
    where
        C: Console + ?Sized,
    {
        let request = ConnectRequest::new(&self.config.target_host, self.config.target_port)?;

        console.show(ConsoleEvent::Notice("Connecting to Tor proxy..."));
        let stream = proxy::connect(&self.config.proxy_addr, self.config.proxy_port).await?;

        console.show(ConsoleEvent::Notice("Establishing connection through proxy..."));
        let stream = proxy::establish(stream, &request).await?;
        console.show(ConsoleEvent::Notice("Connected to server"));

        self.chat_over(stream, input, console).await
    }

    /// Authenticate and chat over an already established stream.
    pub async fn chat_over<S, C>(
        &self,
        stream: S,
        input: &mut LineInput,
        console: &mut C,
    ) -> Result<SessionEnd>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        C: Console + ?Sized,
    {
        let stream = chat::initiate(
            stream,
            input,
            console,
            AuthSession::new(self.config.max_auth_attempts),
            PEER_LABEL,
            self.config.max_line_len,
        )
        .await?;

        console.show(ConsoleEvent::Notice("Authenticated. You can start chatting."));
        console.show(ConsoleEvent::Help(Role::Client));

        let options = LoopOptions::new(Role::Client, PEER_LABEL, self.config.max_line_len);
        chat::run(stream, input, console, &options).await
    }
}
