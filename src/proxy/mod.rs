//! Reaching the peer through a SOCKS5 proxy.
//!
//! `connector` dials the proxy; `socks5` asks it to CONNECT to the target.

pub mod connector;
pub mod socks5;

pub use connector::connect;
pub use socks5::{establish, BoundAddr, ConnectRequest, Handshake, HandshakeState};
