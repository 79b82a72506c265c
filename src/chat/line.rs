//! Chat line handling.
//!
//! The wire carries plain UTF-8 text with no length prefix: one `read` is one
//! message. Local input arrives as whole lines through a channel, fed either by
//! a dedicated stdin thread or directly by a test.

use std::io::BufRead;
use std::thread;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Backlog of local lines not yet consumed.
const INPUT_QUEUE_DEPTH: usize = 64;

/// Strip every trailing `\r` and `\n`.
pub fn strip_line_terminators(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}

/// Decode a chunk read from the wire into a display/compare-ready line.
pub fn decode_chunk(bytes: &[u8]) -> String {
    strip_line_terminators(&String::from_utf8_lossy(bytes)).to_string()
}

/// Read one message with a single `read` of at most `max_len` bytes.
///
/// Returns `Ok(None)` when the peer has closed the stream.
pub async fn read_message<S>(stream: &mut S, max_len: usize) -> Result<Option<String>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; max_len];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(decode_chunk(&buf[..n])))
}

/// Write `text` exactly as given.
pub async fn write_message<S>(stream: &mut S, text: &str) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(text.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Send each line of `reader` to `tx` until end of input or the receiver
/// goes away. Invalid UTF-8 is decoded lossily, like peer messages.
fn forward_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Failed to read from stdin: {}", e);
                break;
            }
        }
    }
}

/// Local interactive input, one line at a time, bounded in length.
pub struct LineInput {
    rx: mpsc::Receiver<String>,
    max_len: usize,
}

impl LineInput {
    /// Wrap an existing line channel.
    pub fn new(rx: mpsc::Receiver<String>, max_len: usize) -> Self {
        Self { rx, max_len }
    }

    /// Create an input fed by the returned sender. Dropping the sender closes the input.
    pub fn channel(max_len: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
        (tx, Self::new(rx, max_len))
    }

    /// Read lines from the process's stdin on a dedicated thread.
    pub fn stdin(max_len: usize) -> Self {
        let (tx, input) = Self::channel(max_len);

        let spawned = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || forward_lines(std::io::stdin().lock(), &tx));

        if let Err(e) = spawned {
            // The sender went down with the closure, so the input reads as closed.
            tracing::warn!("Failed to start stdin reader: {}", e);
        }

        input
    }

    /// Maximum accepted line length in bytes.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Next line with terminators stripped.
    ///
    /// `Ok(None)` once the source is closed; `Error::LineTooLong` for a line
    /// over the limit (the line is discarded, later lines are unaffected).
    /// Cancel safe.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let Some(line) = self.rx.recv().await else {
            return Ok(None);
        };

        let line = strip_line_terminators(&line);
        if line.len() > self.max_len {
            return Err(Error::LineTooLong {
                len: line.len(),
                max: self.max_len,
            });
        }
        Ok(Some(line.to_string()))
    }
}
