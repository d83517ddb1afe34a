//! Moves query bytes to a server and response bytes back.
//!
//! Requests arrive already framed for their protocol (see
//! [`crate::codec::DnsCodec`]). Responses are always returned as a bare
//! message: UDP delivers one datagram, TCP strips the length prefix.

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};
use tracing::debug;

use crate::errors::DnsError;

/// Default bound on a whole exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Largest datagram accepted, the common EDNS(0) buffer size
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub trait Transport: Send + Sync {
    /// Sends `query` to `server` and returns the reply message.
    fn resolve(
        &self,
        query: &[u8],
        server: SocketAddr,
    ) -> impl Future<Output = Result<BytesMut, DnsError>> + Send;
}

/// One datagram out, one datagram back.
#[derive(Debug, Clone, Copy)]
pub struct UdpTransport {
    timeout: Duration,
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl UdpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Transport for UdpTransport {
    async fn resolve(&self, query: &[u8], server: SocketAddr) -> Result<BytesMut, DnsError> {
        let response = within(self.timeout, udp_exchange(query, server))
            .await
            .map_err(|source| DnsError::TransportFailure { server, source })?;

        debug!(
            server = %server,
            bytes_sent = query.len(),
            bytes_received = response.len(),
            "UDP exchange complete"
        );
        Ok(response)
    }
}

async fn udp_exchange(query: &[u8], server: SocketAddr) -> io::Result<BytesMut> {
    // Bind to an ephemeral port of the server's address family
    let bind_addr: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(bind_addr).await?;
    // connected sockets drop datagrams from any other source
    socket.connect(server).await?;
    socket.send(query).await?;

    let mut buf = BytesMut::zeroed(MAX_UDP_RESPONSE_SIZE);
    let len = socket.recv(&mut buf).await?;
    buf.truncate(len);
    Ok(buf)
}

/// One connection per query; the reply is read as a single length
/// delimited frame.
#[derive(Debug, Clone, Copy)]
pub struct TcpTransport {
    timeout: Duration,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl TcpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Transport for TcpTransport {
    async fn resolve(&self, query: &[u8], server: SocketAddr) -> Result<BytesMut, DnsError> {
        let response = within(self.timeout, tcp_exchange(query, server))
            .await
            .map_err(|source| DnsError::TransportFailure { server, source })?;

        debug!(
            server = %server,
            bytes_sent = query.len(),
            bytes_received = response.len(),
            "TCP exchange complete"
        );
        Ok(response)
    }
}

async fn tcp_exchange(query: &[u8], server: SocketAddr) -> io::Result<BytesMut> {
    let mut stream = TcpStream::connect(server).await?;
    stream.set_nodelay(true)?;
    stream.write_all(query).await?;
    stream.flush().await?;

    let codec = LengthDelimitedCodec::builder()
        .length_field_length(2)
        .new_codec();
    let mut frames = FramedRead::new(stream, codec);

    match frames.next().await {
        Some(frame) => frame,
        None => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before a response arrived",
        )),
    }
}

async fn within<T>(
    timeout: Duration,
    exchange: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    tokio::time::timeout(timeout, exchange)
        .await
        .unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response within {} ms", timeout.as_millis()),
            ))
        })
}
