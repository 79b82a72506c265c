//! Error types for torchat.

use thiserror::Error;

/// Result type alias for torchat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while connecting, negotiating, authenticating or chatting.
#[derive(Error, Debug)]
pub enum Error {
    /// The proxy or peer could not be reached
    #[error("cannot connect to {addr}: {reason}")]
    Connect {
        /// Address that was dialed
        addr: String,
        /// Why the connection failed
        reason: String,
    },

    /// Malformed SOCKS5 exchange or invalid CONNECT request
    #[error("SOCKS5 protocol error: {0}")]
    Protocol(String),

    /// The proxy answered the CONNECT request with a non-zero status
    #[error("proxy rejected connection: {message} (status {status:#04x})")]
    ProxyRejected {
        /// Raw SOCKS5 reply status
        status: u8,
        /// Human-readable cause
        message: &'static str,
    },

    /// Network I/O error (short read/write, reset, ...)
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// Password authentication did not succeed
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A local input line exceeded the configured maximum
    #[error("line too long: {len} bytes exceeds the {max} byte limit")]
    LineTooLong {
        /// Length of the rejected line
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new connect error
    pub fn connect(addr: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Connect {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create a new authentication error
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Error::AuthFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this error indicates authentication failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::AuthFailed(_))
    }

    /// Check if the proxy was reachable but refused the target
    pub fn is_proxy_rejection(&self) -> bool {
        matches!(self, Error::ProxyRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ProxyRejected {
            status: 0x04,
            message: "Host unreachable",
        };
        assert_eq!(
            err.to_string(),
            "proxy rejected connection: Host unreachable (status 0x04)"
        );

        let err = Error::connect("127.0.0.1:9050", "Connection refused");
        assert_eq!(
            err.to_string(),
            "cannot connect to 127.0.0.1:9050: Connection refused"
        );

        let err = Error::LineTooLong { len: 10, max: 4 };
        assert_eq!(err.to_string(), "line too long: 10 bytes exceeds the 4 byte limit");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::auth_failed("attempts exhausted").is_auth_failure());
        assert!(!Error::protocol("bad version").is_auth_failure());

        let rejected = Error::ProxyRejected {
            status: 0x05,
            message: "Connection refused",
        };
        assert!(rejected.is_proxy_rejection());
        assert!(!Error::connect("127.0.0.1:9050", "refused").is_proxy_rejection());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "early eof");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
