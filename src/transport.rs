//! Single request/response exchanges with one DNS server.

use crate::dns::DNSPacket;
use crate::dns::common::PacketComponent;
use crate::dns::constants::UDP_RECV_SIZE;
use crate::dns::header::DNSHeader;
use crate::error::TransportError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, trace};

/// Sends `query` over UDP and waits for the matching response.
///
/// Datagrams whose header is unreadable or carries a foreign id are dropped
/// and the wait continues until the deadline. A datagram that answers the
/// query but fails to parse past the header ends the exchange as
/// [`TransportError::Malformed`].
pub async fn exchange_udp(
    server: SocketAddr,
    query: &DNSPacket,
    deadline: Duration,
) -> Result<DNSPacket, TransportError> {
    let query_bytes = query.serialize()?;
    let local: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    socket.send(&query_bytes).await?;
    trace!("Sent {} bytes to {} over UDP", query_bytes.len(), server);

    let until = Instant::now() + deadline;
    let mut buf = vec![0u8; UDP_RECV_SIZE];
    loop {
        let len = timeout_at(until, socket.recv(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout)??;
        let datagram = &buf[..len];
        let mut offset = 0;
        match DNSHeader::read(datagram, &mut offset) {
            Ok(header) if header.qr && header.id == query.header.id => {
                return Ok(DNSPacket::parse(datagram)?);
            }
            Ok(header) => debug!(
                "Dropping unrelated datagram from {} (id {})",
                server, header.id
            ),
            Err(e) => debug!("Dropping unparsable datagram from {}: {}", server, e),
        }
    }
}

/// Sends `query` over TCP and reads one response.
pub async fn exchange_tcp(
    server: SocketAddr,
    query: &DNSPacket,
    deadline: Duration,
) -> Result<DNSPacket, TransportError> {
    let exchange = async {
        let mut stream = TcpStream::connect(server).await?;
        write_message(&mut stream, &query.serialize()?).await?;
        let bytes = read_message(&mut stream).await?;
        Ok::<_, TransportError>(DNSPacket::parse(&bytes)?)
    };
    let response = timeout(deadline, exchange)
        .await
        .map_err(|_| TransportError::Timeout)??;

    if !is_response_to(&response, query) {
        return Err(TransportError::Io(format!(
            "response id {} does not match query id {}",
            response.header.id, query.header.id
        )));
    }
    Ok(response)
}

/// Writes one length-prefixed message (RFC 1035 4.2.2).
pub async fn write_message(stream: &mut TcpStream, bytes: &[u8]) -> Result<(), TransportError> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| TransportError::Io("message exceeds 65535 bytes".to_string()))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(bytes).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one length-prefixed message.
pub async fn read_message(stream: &mut TcpStream) -> Result<Vec<u8>, TransportError> {
    let mut length_buf = [0u8; 2];
    stream.read_exact(&mut length_buf).await?;
    let len = u16::from_be_bytes(length_buf) as usize;

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    trace!("Read {} byte message over TCP", len);
    Ok(buf)
}

fn is_response_to(response: &DNSPacket, query: &DNSPacket) -> bool {
    response.header.qr && response.header.id == query.header.id
}
