//! Raw TCP connection to the proxy endpoint.

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Open a TCP stream to `host:port`.
///
/// `host` must be a literal IPv4 or IPv6 address. A single attempt is made;
/// retrying is left to the caller.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e| Error::connect(format!("{}:{}", host, port), format!("invalid address: {}", e)))?;
    let addr = SocketAddr::new(ip, port);

    tracing::info!("Connecting to proxy at {}", addr);

    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::connect(addr.to_string(), e))?;
    stream.set_nodelay(true)?;

    tracing::info!("Connected to proxy at {}", addr);
    Ok(stream)
}
