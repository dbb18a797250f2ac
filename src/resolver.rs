use crate::config::{AuditConfig, Transport};
use crate::dns::DNSPacket;
use crate::dns::constants::DNSRcode;
use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::dns::resource::DNSResource;
use crate::error::{LookupError, TransportError};
use crate::transport::{exchange_tcp, exchange_udp};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Name resolution as the audit needs it: records of one type for one
/// name, or a failure kind the caller can branch on.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn lookup(
        &self,
        qname: &str,
        rtype: DNSResourceType,
    ) -> Result<Vec<DNSResource>, LookupError>;
}

/// Stub resolver that hands recursive queries to the configured resolvers,
/// one after the other.
///
/// Failure kinds follow the usual stub semantics: an NXDOMAIN or an empty
/// NOERROR answer from any server is final; if every server fails, the
/// lookup is a timeout when at least one of them timed out and
/// `NoNameservers` otherwise.
#[derive(Debug, Clone)]
pub struct StubResolver {
    servers: Vec<SocketAddr>,
    query_timeout: Duration,
    transport: Transport,
}

impl StubResolver {
    pub fn new(config: &AuditConfig) -> Self {
        debug!(
            "Stub resolver using {:?} over {:?}, timeout {:?}",
            config.resolvers, config.transport, config.query_timeout
        );
        Self {
            servers: config.resolvers.clone(),
            query_timeout: config.query_timeout,
            transport: config.transport,
        }
    }

    async fn query_server(
        &self,
        server: SocketAddr,
        query: &DNSPacket,
    ) -> Result<DNSPacket, TransportError> {
        match self.transport {
            Transport::Tcp => exchange_tcp(server, query, self.query_timeout).await,
            Transport::Udp => {
                let response = exchange_udp(server, query, self.query_timeout).await?;
                if response.header.tc {
                    debug!("UDP response from {} truncated, retrying with TCP", server);
                    exchange_tcp(server, query, self.query_timeout).await
                } else {
                    Ok(response)
                }
            }
        }
    }
}

#[async_trait]
impl Resolve for StubResolver {
    async fn lookup(
        &self,
        qname: &str,
        rtype: DNSResourceType,
    ) -> Result<Vec<DNSResource>, LookupError> {
        let qname = name::to_absolute(qname);
        let query = DNSPacket::query(&qname, rtype, true);
        let mut timed_out = false;
        let mut failures = Vec::new();

        for &server in &self.servers {
            trace!("Querying {} for {} {}", server, qname, rtype);
            match self.query_server(server, &query).await {
                Ok(response) => match response.header.rcode {
                    DNSRcode::NOERROR => {
                        let records: Vec<DNSResource> =
                            response.answers_of_type(rtype).cloned().collect();
                        if records.is_empty() {
                            return Err(LookupError::NoAnswer);
                        }
                        return Ok(records);
                    }
                    DNSRcode::NXDOMAIN => return Err(LookupError::NxDomain),
                    rcode => {
                        debug!(
                            "{} answered {} for {} {}",
                            server,
                            DNSRcode::name(rcode),
                            qname,
                            rtype
                        );
                        failures.push(format!("{} answered {}", server, DNSRcode::name(rcode)));
                    }
                },
                Err(TransportError::Timeout) => {
                    debug!("{} timed out for {} {}", server, qname, rtype);
                    timed_out = true;
                }
                Err(e) => {
                    warn!("Query to {} for {} {} failed: {}", server, qname, rtype, e);
                    failures.push(format!("{}: {}", server, e));
                }
            }
        }

        if timed_out {
            Err(LookupError::Timeout)
        } else {
            Err(LookupError::NoNameservers(failures.join("; ")))
        }
    }
}
