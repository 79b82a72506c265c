//! SOCKS5 CONNECT client ([RFC1928](https://tools.ietf.org/rfc/rfc1928.txt)).
//!
//! Negotiates the "no authentication" method with the proxy and asks it to
//! open a TCP connection to a domain-name target. Once established, the proxy
//! relays bytes transparently between the stream and the target.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Protocol version byte
pub const SOCKS_VERSION: u8 = 0x05;
/// "No authentication required" method
pub const AUTH_METHOD_NONE: u8 = 0x00;
/// CONNECT command
pub const CMD_CONNECT: u8 = 0x01;
const RESERVED: u8 = 0x00;

/// IPv4 address type
pub const ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name address type
pub const ADDR_TYPE_DOMAIN_NAME: u8 = 0x03;
/// IPv6 address type
pub const ADDR_TYPE_IPV6: u8 = 0x04;

/// Reply status for a successful CONNECT
pub const REPLY_SUCCEEDED: u8 = 0x00;

/// Longest domain name a CONNECT request can carry
pub const MAX_DOMAIN_LEN: usize = 255;

// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 1 to 255 |
// +----+----------+----------+
const GREETING: [u8; 3] = [SOCKS_VERSION, 0x01, AUTH_METHOD_NONE];

/// Human-readable cause for a SOCKS5 reply status.
pub fn reply_message(status: u8) -> &'static str {
    match status {
        REPLY_SUCCEEDED => "Succeeded",
        0x01 => "General failure",
        0x02 => "Connection not allowed",
        0x03 => "Network unreachable",
        0x04 => "Host unreachable",
        0x05 => "Connection refused",
        0x06 => "TTL expired",
        0x07 => "Command not supported",
        0x08 => "Address type not supported",
        _ => "Unknown error",
    }
}

/// A validated CONNECT request for a domain-name target.
///
/// ```text
/// +----+-----+-------+------+-----+----------+----------+
/// |VER | CMD |  RSV  | ATYP | LEN |  DOMAIN  | DST.PORT |
/// +----+-----+-------+------+-----+----------+----------+
/// | 1  |  1  | X'00' | X'03'|  1  | 1 to 255 |    2     |
/// +----+-----+-------+------+-----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    domain: String,
    port: u16,
}

impl ConnectRequest {
    /// Create a request, rejecting empty or over-long domains and port 0.
    pub fn new(domain: impl Into<String>, port: u16) -> Result<Self> {
        let domain = domain.into();

        if domain.is_empty() {
            return Err(Error::protocol("domain name is empty"));
        }
        if domain.len() > MAX_DOMAIN_LEN {
            return Err(Error::protocol(format!(
                "domain name too long: {} bytes (max {})",
                domain.len(),
                MAX_DOMAIN_LEN
            )));
        }
        if port == 0 {
            return Err(Error::protocol("destination port must be in 1..=65535"));
        }

        Ok(Self { domain, port })
    }

    /// Target domain name.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Size of the serialized request.
    pub fn encoded_len(&self) -> usize {
        7 + self.domain.len()
    }

    /// Serialize the request.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(SOCKS_VERSION);
        buf.put_u8(CMD_CONNECT);
        buf.put_u8(RESERVED);
        buf.put_u8(ADDR_TYPE_DOMAIN_NAME);
        buf.put_u8(self.domain.len() as u8);
        buf.put_slice(self.domain.as_bytes());
        buf.put_u16(self.port);
        buf.freeze()
    }
}

impl fmt::Display for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.port)
    }
}

/// Address the proxy reports as bound for the relayed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundAddr {
    /// IPv4 address and port
    V4(SocketAddrV4),
    /// IPv6 address and port
    V6(SocketAddrV6),
    /// Domain name and port
    Domain(String, u16),
}

impl fmt::Display for BoundAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundAddr::V4(addr) => write!(f, "{}", addr),
            BoundAddr::V6(addr) => write!(f, "{}", addr),
            BoundAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet
    Greeting,
    /// Proxy accepted the "no authentication" method
    MethodSelected,
    /// CONNECT request written
    RequestSent,
    /// Proxy reported success; the stream now reaches the target
    Established,
    /// A step failed; the stream must not be reused
    Rejected,
}

/// Client side of a SOCKS5 CONNECT handshake over an owned stream.
pub struct Handshake<S> {
    stream: S,
    state: HandshakeState,
}

impl<S> Handshake<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Start a handshake on a freshly connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: HandshakeState::Greeting,
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Offer the "no authentication" method and check the proxy's choice.
    pub async fn select_method(&mut self) -> Result<()> {
        self.expect_state(HandshakeState::Greeting)?;
        let result = self.greet().await;
        self.transition(result, HandshakeState::MethodSelected)
    }

    /// Write the CONNECT request.
    pub async fn send_request(&mut self, request: &ConnectRequest) -> Result<()> {
        self.expect_state(HandshakeState::MethodSelected)?;
        let result = self.write_request(request).await;
        self.transition(result, HandshakeState::RequestSent)
    }

    /// Read and validate the CONNECT reply, consuming the bound address.
    pub async fn read_reply(&mut self) -> Result<BoundAddr> {
        self.expect_state(HandshakeState::RequestSent)?;
        let result = self.read_connect_reply().await;
        self.transition(result, HandshakeState::Established)
    }

    /// Give the stream back.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn expect_state(&self, expected: HandshakeState) -> Result<()> {
        if self.state != expected {
            return Err(Error::protocol(format!(
                "handshake step out of order: expected {:?}, in {:?}",
                expected, self.state
            )));
        }
        Ok(())
    }

    fn transition<T>(&mut self, result: Result<T>, next: HandshakeState) -> Result<T> {
        self.state = if result.is_ok() {
            next
        } else {
            HandshakeState::Rejected
        };
        result
    }

    async fn greet(&mut self) -> Result<()> {
        self.stream.write_all(&GREETING).await?;
        self.stream.flush().await?;

        // +----+--------+
        // |VER | METHOD |
        // +----+--------+
        let mut buf = [0u8; 2];
        if let Err(e) = self.stream.read_exact(&mut buf).await {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Err(Error::protocol(
                    "proxy closed the connection during method selection",
                ));
            }
            return Err(e.into());
        }

        if buf[0] != SOCKS_VERSION {
            return Err(Error::protocol(format!(
                "unsupported SOCKS version {:#04x} in method selection",
                buf[0]
            )));
        }
        if buf[1] != AUTH_METHOD_NONE {
            return Err(Error::protocol(format!(
                "proxy requires unsupported authentication method {:#04x}",
                buf[1]
            )));
        }
        Ok(())
    }

    async fn write_request(&mut self, request: &ConnectRequest) -> Result<()> {
        let bytes = request.encode();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        tracing::debug!("Sent {} byte CONNECT request for {}", bytes.len(), request);
        Ok(())
    }

    async fn read_connect_reply(&mut self) -> Result<BoundAddr> {
        // +----+-----+-------+------+----------+----------+
        // |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
        // +----+-----+-------+------+----------+----------+
        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header).await?;

        if header[0] != SOCKS_VERSION {
            return Err(Error::protocol(format!(
                "invalid version {:#04x} in CONNECT reply",
                header[0]
            )));
        }

        let status = header[1];
        if status != REPLY_SUCCEEDED {
            return Err(Error::ProxyRejected {
                status,
                message: reply_message(status),
            });
        }

        self.read_bound_addr(header[3]).await
    }

    async fn read_bound_addr(&mut self, atyp: u8) -> Result<BoundAddr> {
        match atyp {
            ADDR_TYPE_IPV4 => {
                let mut buf = [0u8; 4 + 2];
                self.stream.read_exact(&mut buf).await?;
                let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
                let port = u16::from_be_bytes([buf[4], buf[5]]);
                Ok(BoundAddr::V4(SocketAddrV4::new(ip, port)))
            }
            ADDR_TYPE_DOMAIN_NAME => {
                let mut len = [0u8; 1];
                self.stream.read_exact(&mut len).await?;
                let len = len[0] as usize;

                let mut buf = vec![0u8; len + 2];
                self.stream.read_exact(&mut buf).await?;
                let domain = String::from_utf8_lossy(&buf[..len]).into_owned();
                let port = u16::from_be_bytes([buf[len], buf[len + 1]]);
                Ok(BoundAddr::Domain(domain, port))
            }
            ADDR_TYPE_IPV6 => {
                let mut buf = [0u8; 16 + 2];
                self.stream.read_exact(&mut buf).await?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&buf[..16]);
                let port = u16::from_be_bytes([buf[16], buf[17]]);
                Ok(BoundAddr::V6(SocketAddrV6::new(Ipv6Addr::from(octets), port, 0, 0)))
            }
            other => Err(Error::protocol(format!(
                "unsupported address type {:#04x}",
                other
            ))),
        }
    }
}

/// Run the full handshake and hand back the established stream.
///
/// On failure the stream is dropped, closing the connection.
pub async fn establish<S>(stream: S, request: &ConnectRequest) -> Result<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!("Establishing SOCKS5 connection to {}", request);

    let mut handshake = Handshake::new(stream);
    handshake.select_method().await?;
    handshake.send_request(request).await?;
    let bound = handshake.read_reply().await?;

    tracing::debug!("Proxy bound address {}", bound);
    tracing::info!("SOCKS5 connection to {} established", request);
    Ok(handshake.into_inner())
}

/// Validate `domain:port` and run the handshake.
///
/// An invalid target fails before any byte is written.
pub async fn connect_domain<S>(stream: S, domain: &str, port: u16) -> Result<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = ConnectRequest::new(domain, port)?;
    establish(stream, &request).await
}
