//! Zone transfer client (AXFR, RFC 5936).

use crate::dns::DNSPacket;
use crate::dns::constants::{DNS_PORT, DNSRcode};
use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::error::{TransportError, XfrError};
use crate::transport::{read_message, write_message};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

#[async_trait]
pub trait ZoneTransfer: Send + Sync {
    /// Performs a full transfer of `zone` from `server` and returns every
    /// response message of the transfer in order.
    async fn axfr(&self, server: IpAddr, zone: &str) -> Result<Vec<DNSPacket>, XfrError>;
}

/// AXFR over TCP. The transfer ends at the SOA that closes the zone.
#[derive(Debug, Clone)]
pub struct TcpZoneTransfer {
    port: u16,
    message_timeout: Duration,
}

impl TcpZoneTransfer {
    pub fn new(message_timeout: Duration) -> Self {
        Self {
            port: DNS_PORT,
            message_timeout,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn next_message(&self, stream: &mut TcpStream) -> Result<Vec<u8>, XfrError> {
        timeout(self.message_timeout, read_message(stream))
            .await
            .map_err(|_| XfrError::from(TransportError::Timeout))?
            .map_err(XfrError::from)
    }
}

#[async_trait]
impl ZoneTransfer for TcpZoneTransfer {
    async fn axfr(&self, server: IpAddr, zone: &str) -> Result<Vec<DNSPacket>, XfrError> {
        let addr = SocketAddr::new(server, self.port);
        let zone = name::normalize(zone);
        let query = DNSPacket::query(&zone, DNSResourceType::AXFR, false);

        let mut stream = timeout(self.message_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| XfrError::Transport(format!("connect to {} timed out", addr)))?
            .map_err(|e| XfrError::Transport(e.to_string()))?;
        let query_bytes = query
            .serialize()
            .map_err(|e| XfrError::Format(e.to_string()))?;
        write_message(&mut stream, &query_bytes).await?;
        debug!("Requested AXFR of {} from {}", zone, addr);

        let mut messages = Vec::new();
        let mut soa_seen = 0usize;
        let mut records = 0usize;

        loop {
            let bytes = self.next_message(&mut stream).await?;
            let message = DNSPacket::parse(&bytes).map_err(|e| XfrError::Format(e.to_string()))?;

            if message.header.id != query.header.id {
                return Err(XfrError::Format(format!(
                    "ID mismatch: expected {}, got {}",
                    query.header.id, message.header.id
                )));
            }
            if message.header.rcode != DNSRcode::NOERROR {
                return Err(XfrError::Transfer(format!(
                    "server answered {}",
                    DNSRcode::name(message.header.rcode)
                )));
            }

            for record in &message.answers {
                let is_apex_soa =
                    record.rtype == DNSResourceType::SOA && name::normalize(&record.name()) == zone;
                if records == 0 && !is_apex_soa {
                    return Err(XfrError::Format("first RR is not the zone SOA".to_string()));
                }
                records += 1;
                if is_apex_soa {
                    soa_seen += 1;
                }
            }
            if message.answers.is_empty() {
                return Err(XfrError::Format("empty transfer message".to_string()));
            }

            trace!(
                "AXFR message {} from {}: {} records",
                messages.len() + 1,
                addr,
                message.answers.len()
            );
            messages.push(message);

            if soa_seen >= 2 {
                break;
            }
        }

        debug!(
            "AXFR of {} from {} complete: {} messages, {} records",
            zone,
            addr,
            messages.len(),
            records
        );
        Ok(messages)
    }
}
