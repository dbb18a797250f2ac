use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::error::LookupError;
use crate::resolver::Resolve;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Result of checking one domain for IPv6-reachable name servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckVerdict {
    Ok,
    LookupTimeout,
    NoNameservers,
    NoAnswer,
    AllTimedOut,
    NoIpv6,
}

impl CheckVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckVerdict::Ok)
    }

    pub fn description(&self) -> &'static str {
        match self {
            CheckVerdict::Ok => "ok",
            CheckVerdict::LookupTimeout => "lookup error: timeout",
            CheckVerdict::NoNameservers => "lookup error: no working name servers",
            CheckVerdict::NoAnswer => "lookup error: no answer",
            CheckVerdict::AllTimedOut => "all AAAA lookups timed out",
            CheckVerdict::NoIpv6 => "no IPv6 nameservers",
        }
    }
}

impl fmt::Display for CheckVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Retry rule for the AAAA lookup of a single name server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per name server, first one included.
    pub max_attempts: u32,
    /// Whether a name server that times out on every attempt ends the
    /// whole probe with [`CheckVerdict::AllTimedOut`] instead of moving on
    /// to the next name server.
    pub abort_on_exhaustion: bool,
}

impl RetryPolicy {
    /// Three attempts, retried on timeout only, and exhaustion aborts the
    /// probe.
    pub const REFERENCE: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        abort_on_exhaustion: true,
    };

    pub fn is_retryable(&self, err: &LookupError) -> bool {
        matches!(err, LookupError::Timeout)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// What probing one name server found out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameServerOutcome {
    HasIpv6,
    NoIpv6,
    Exhausted,
}

pub struct Ipv6Prober {
    resolver: Arc<dyn Resolve>,
    policy: RetryPolicy,
}

impl Ipv6Prober {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self::with_policy(resolver, RetryPolicy::REFERENCE)
    }

    pub fn with_policy(resolver: Arc<dyn Resolve>, policy: RetryPolicy) -> Self {
        Self { resolver, policy }
    }

    pub async fn probe(&self, domain: &str) -> CheckVerdict {
        let domain = name::to_absolute(domain);

        let name_servers: BTreeSet<String> =
            match self.resolver.lookup(&domain, DNSResourceType::NS).await {
                Ok(records) => records
                    .iter()
                    .filter_map(|r| r.ns_target())
                    .map(name::normalize)
                    .collect(),
                Err(LookupError::Timeout) => return CheckVerdict::LookupTimeout,
                Err(LookupError::NoNameservers(_)) => return CheckVerdict::NoNameservers,
                Err(LookupError::NoAnswer | LookupError::NxDomain) => {
                    return CheckVerdict::NoAnswer;
                }
            };
        debug!("{} has {} name servers", domain, name_servers.len());

        let mut exhausted = 0;
        for ns in &name_servers {
            match self.probe_name_server(ns).await {
                NameServerOutcome::HasIpv6 => {
                    debug!("{}: {} has IPv6", domain, ns);
                    return CheckVerdict::Ok;
                }
                NameServerOutcome::Exhausted if self.policy.abort_on_exhaustion => {
                    return CheckVerdict::AllTimedOut;
                }
                NameServerOutcome::Exhausted => exhausted += 1,
                NameServerOutcome::NoIpv6 => {}
            }
        }

        if exhausted > 0 && exhausted == name_servers.len() {
            CheckVerdict::AllTimedOut
        } else {
            CheckVerdict::NoIpv6
        }
    }

    async fn probe_name_server(&self, ns: &str) -> NameServerOutcome {
        for attempt in 1..=self.policy.max_attempts {
            match self.resolver.lookup(ns, DNSResourceType::AAAA).await {
                Ok(records) if !records.is_empty() => return NameServerOutcome::HasIpv6,
                Ok(_) => return NameServerOutcome::NoIpv6,
                Err(e) if self.policy.is_retryable(&e) => {
                    trace!("AAAA {} attempt {} timed out", ns, attempt);
                }
                Err(e) => {
                    trace!("AAAA {}: {}", ns, e);
                    return NameServerOutcome::NoIpv6;
                }
            }
        }
        debug!(
            "AAAA {} timed out {} times",
            ns, self.policy.max_attempts
        );
        NameServerOutcome::Exhausted
    }
}
