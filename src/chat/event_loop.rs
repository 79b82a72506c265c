//! Duplex chat over an authenticated stream.
//!
//! Waits on the peer and on local input at once and handles whichever is
//! ready first. Neither side waits for the other to take a turn.

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::command::Command;
use super::console::{Console, ConsoleEvent, StatusReport};
use super::line::{decode_chunk, write_message, LineInput};
use super::Role;
use crate::error::{Error, Result};

/// Why a chat session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed the stream (or it failed on read)
    PeerClosed,
    /// A local quit command was entered
    LocalQuit,
    /// Local input reached end of file
    InputClosed,
}

/// Per-session settings for [`run`].
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Which command set applies
    pub role: Role,
    /// Label shown in front of peer messages
    pub peer: String,
    /// Largest single read from the peer
    pub max_line_len: usize,
    /// Sent to the peer on a local quit, if set
    pub farewell: Option<String>,
}

impl LoopOptions {
    /// Options for `role` with no farewell message.
    pub fn new(role: Role, peer: impl Into<String>, max_line_len: usize) -> Self {
        Self {
            role,
            peer: peer.into(),
            max_line_len,
            farewell: None,
        }
    }

    /// Send `farewell` to the peer before a local quit.
    pub fn with_farewell(mut self, farewell: impl Into<String>) -> Self {
        self.farewell = Some(farewell.into());
        self
    }
}

/// Message counters for one session.
#[derive(Debug)]
pub struct SessionStats {
    started: Instant,
    sent: u64,
    received: u64,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            sent: 0,
            received: 0,
        }
    }

    /// Snapshot for display.
    pub fn report(&self, peer: &str) -> StatusReport {
        StatusReport {
            peer: peer.to_string(),
            elapsed: self.started.elapsed(),
            sent: self.sent,
            received: self.received,
        }
    }
}

/// Run the chat until one side ends it, then shut the stream down.
///
/// Consumes the stream, so it is closed exactly once whatever the outcome.
pub async fn run<S, C>(
    mut stream: S,
    input: &mut LineInput,
    console: &mut C,
    options: &LoopOptions,
) -> Result<SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Console + ?Sized,
{
    let mut stats = SessionStats::new();
    let outcome = chat(&mut stream, input, console, options, &mut stats).await;

    if let Err(e) = stream.shutdown().await {
        tracing::debug!("Stream shutdown failed: {}", e);
    }
    drop(stream);

    match &outcome {
        Ok(end) => tracing::info!(
            "Chat with {} ended ({:?}): {} sent, {} received",
            options.peer,
            end,
            stats.sent,
            stats.received
        ),
        Err(e) => tracing::warn!("Chat with {} failed: {}", options.peer, e),
    }

    outcome
}

async fn chat<S, C>(
    stream: &mut S,
    input: &mut LineInput,
    console: &mut C,
    options: &LoopOptions,
    stats: &mut SessionStats,
) -> Result<SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Console + ?Sized,
{
    let mut buf = vec![0u8; options.max_line_len];

    loop {
        tokio::select! {
            read = stream.read(&mut buf) => {
                let n = match read {
                    Ok(0) => {
                        console.show(ConsoleEvent::Warning("Peer disconnected"));
                        return Ok(SessionEnd::PeerClosed);
                    }
                    Ok(n) => n,
                    Err(e) => {
                        tracing::debug!("Read from {} failed: {}", options.peer, e);
                        console.show(ConsoleEvent::Warning("Connection lost"));
                        return Ok(SessionEnd::PeerClosed);
                    }
                };

                let text = decode_chunk(&buf[..n]);
                stats.received += 1;
                console.show(ConsoleEvent::Peer { from: &options.peer, text: &text });
            }
            line = input.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if let Some(end) = handle_line(stream, console, options, stats, &line).await? {
                            return Ok(end);
                        }
                    }
                    Ok(None) => return Ok(SessionEnd::InputClosed),
                    Err(e @ Error::LineTooLong { .. }) => {
                        console.show(ConsoleEvent::Warning(&e.to_string()));
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}

/// Act on one local line. `Some` ends the session.
async fn handle_line<S, C>(
    stream: &mut S,
    console: &mut C,
    options: &LoopOptions,
    stats: &mut SessionStats,
    line: &str,
) -> Result<Option<SessionEnd>>
where
    S: AsyncWrite + Unpin,
    C: Console + ?Sized,
{
    if let Some(command) = Command::parse(line, options.role) {
        match command {
            Command::Quit => {
                if let Some(farewell) = &options.farewell {
                    if let Err(e) = write_message(stream, farewell).await {
                        tracing::debug!("Failed to send farewell: {}", e);
                    }
                }
                console.show(ConsoleEvent::Notice("Closing connection..."));
                return Ok(Some(SessionEnd::LocalQuit));
            }
            Command::Help => console.show(ConsoleEvent::Help(options.role)),
            Command::Clear => console.show(ConsoleEvent::Clear),
            Command::Status => console.show(ConsoleEvent::Status(&stats.report(&options.peer))),
        }
        return Ok(None);
    }

    if line.is_empty() {
        return Ok(None);
    }

    write_message(stream, line).await?;
    stats.sent += 1;
    console.show(ConsoleEvent::Sent(line));
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::console::recording::{Recorded, RecordingConsole};
    use tokio::io::{duplex, DuplexStream};
    use tokio::sync::mpsc;

    async fn read_all(mut stream: DuplexStream) -> String {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<Recorded>) -> Vec<Recorded> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_peer_messages_are_displayed_stripped() {
        let (local, mut peer) = duplex(1024);
        let (_tx, mut input) = LineInput::channel(4096);
        let (mut console, mut events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Client, "Server", 4096);

        peer.write_all(b"hello\r\n").await.unwrap();
        peer.flush().await.unwrap();
        drop(peer);

        let end = run(local, &mut input, &mut console, &options).await.unwrap();
        assert_eq!(end, SessionEnd::PeerClosed);

        let events = drain(&mut events);
        assert_eq!(events[0], Recorded::Peer("hello".into()));
        assert!(events.contains(&Recorded::Warning("Peer disconnected".into())));
    }

    #[tokio::test]
    async fn test_local_lines_sent_verbatim() {
        let (local, peer) = duplex(1024);
        let (tx, mut input) = LineInput::channel(4096);
        let (mut console, mut events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Client, "Server", 4096);

        tx.send("hello".into()).await.unwrap();
        tx.send("".into()).await.unwrap();
        tx.send("/help".into()).await.unwrap();
        tx.send("/clear".into()).await.unwrap();
        drop(tx);

        let end = run(local, &mut input, &mut console, &options).await.unwrap();
        assert_eq!(end, SessionEnd::InputClosed);
        assert_eq!(read_all(peer).await, "hello");

        let events = drain(&mut events);
        assert_eq!(
            events,
            vec![
                Recorded::Sent("hello".into()),
                Recorded::Help(Role::Client),
                Recorded::Clear,
            ]
        );
    }

    #[tokio::test]
    async fn test_quit_without_farewell() {
        let (local, peer) = duplex(1024);
        let (tx, mut input) = LineInput::channel(4096);
        let (mut console, _events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Client, "Server", 4096);

        tx.send("/exit".into()).await.unwrap();
        tx.send("never sent".into()).await.unwrap();

        let end = run(local, &mut input, &mut console, &options).await.unwrap();
        assert_eq!(end, SessionEnd::LocalQuit);
        assert_eq!(read_all(peer).await, "");
    }

    #[tokio::test]
    async fn test_quit_sends_farewell() {
        let (local, peer) = duplex(1024);
        let (tx, mut input) = LineInput::channel(4096);
        let (mut console, _events) = RecordingConsole::new();
        let options =
            LoopOptions::new(Role::Server, "Client", 4096).with_farewell("Goodbye!\n");

        tx.send("/quit".into()).await.unwrap();

        let end = run(local, &mut input, &mut console, &options).await.unwrap();
        assert_eq!(end, SessionEnd::LocalQuit);
        assert_eq!(read_all(peer).await, "Goodbye!\n");
    }

    #[tokio::test]
    async fn test_oversized_line_is_not_sent() {
        let (local, peer) = duplex(1024);
        let (tx, mut input) = LineInput::channel(4);
        let (mut console, mut events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Client, "Server", 4);

        tx.send("toolong".into()).await.unwrap();
        tx.send("ok".into()).await.unwrap();
        drop(tx);

        run(local, &mut input, &mut console, &options).await.unwrap();
        assert_eq!(read_all(peer).await, "ok");

        let events = drain(&mut events);
        assert!(matches!(&events[0], Recorded::Warning(w) if w.contains("line too long")));
        assert_eq!(events[1], Recorded::Sent("ok".into()));
    }

    #[tokio::test]
    async fn test_status_counts_messages() {
        let (local, mut peer) = duplex(1024);
        let (tx, mut input) = LineInput::channel(4096);
        let (mut console, mut events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Server, "Client", 4096);

        let session = tokio::spawn(async move {
            let end = run(local, &mut input, &mut console, &options).await;
            (end, input)
        });

        tx.send("one".into()).await.unwrap();
        tx.send("two".into()).await.unwrap();

        let mut buf = [0u8; 16];
        let mut got = String::new();
        while got != "onetwo" {
            let n = peer.read(&mut buf).await.unwrap();
            got.push_str(std::str::from_utf8(&buf[..n]).unwrap());
        }

        peer.write_all(b"hi").await.unwrap();
        loop {
            let displayed = drain(&mut events);
            if displayed.contains(&Recorded::Peer("hi".into())) {
                break;
            }
            tokio::task::yield_now().await;
        }

        tx.send("/status".into()).await.unwrap();
        tx.send("/quit".into()).await.unwrap();

        let (end, _input) = session.await.unwrap();
        assert_eq!(end.unwrap(), SessionEnd::LocalQuit);

        let events = drain(&mut events);
        assert!(events.contains(&Recorded::Status { sent: 2, received: 1 }));
    }

    #[tokio::test]
    async fn test_status_is_chat_text_for_client() {
        let (local, peer) = duplex(1024);
        let (tx, mut input) = LineInput::channel(4096);
        let (mut console, _events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Client, "Server", 4096);

        tx.send("/status".into()).await.unwrap();
        drop(tx);

        run(local, &mut input, &mut console, &options).await.unwrap();
        assert_eq!(read_all(peer).await, "/status");
    }

    #[tokio::test]
    async fn test_write_failure_is_an_error() {
        let (local, peer) = duplex(1024);
        drop(peer);
        let (tx, mut input) = LineInput::channel(4096);
        let (mut console, _events) = RecordingConsole::new();
        let options = LoopOptions::new(Role::Client, "Server", 4096);

        tx.send("hello".into()).await.unwrap();

        // The closed peer may be noticed on read first; either way the session ends.
        match run(local, &mut input, &mut console, &options).await {
            Ok(end) => assert_eq!(end, SessionEnd::PeerClosed),
            Err(e) => assert!(matches!(e, Error::Io(_))),
        }
    }
}
