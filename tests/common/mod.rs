//! Shared test helpers: scripted resolver and zone transfer backends, and
//! record builders.

#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use tldv6::dns::DNSPacket;
use tldv6::dns::enums::DNSResourceType;
use tldv6::dns::name;
use tldv6::dns::resource::{DNSResource, DNSResourceData, SoaData};
use tldv6::error::{LookupError, XfrError};
use tldv6::resolver::Resolve;
use tldv6::xfr::ZoneTransfer;

pub type LookupResult = Result<Vec<DNSResource>, LookupError>;

/// Resolver that replays scripted answers.
///
/// Each (name, type) has a queue of results; the last one repeats once the
/// queue is down to a single entry. Unscripted lookups answer NXDOMAIN.
#[derive(Default)]
pub struct FakeResolver {
    script: Mutex<HashMap<(String, DNSResourceType), VecDeque<LookupResult>>>,
    calls: Mutex<Vec<(String, DNSResourceType)>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, qname: &str, rtype: DNSResourceType, result: LookupResult) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry((name::normalize(qname), rtype))
            .or_default()
            .push_back(result);
        self
    }

    pub fn ns(self, domain: &str, targets: &[&str]) -> Self {
        let records = targets.iter().map(|t| ns_record(domain, t)).collect();
        self.on(domain, DNSResourceType::NS, Ok(records))
    }

    pub fn aaaa(self, host: &str, addr: &str) -> Self {
        self.on(host, DNSResourceType::AAAA, Ok(vec![aaaa_record(host, addr)]))
    }

    pub fn a(self, host: &str, addr: &str) -> Self {
        self.on(host, DNSResourceType::A, Ok(vec![a_record(host, addr)]))
    }

    pub fn fail(self, qname: &str, rtype: DNSResourceType, err: LookupError) -> Self {
        self.on(qname, rtype, Err(err))
    }

    pub fn calls(&self) -> Vec<(String, DNSResourceType)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, qname: &str, rtype: DNSResourceType) -> usize {
        let qname = name::normalize(qname);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, t)| *n == qname && *t == rtype)
            .count()
    }
}

#[async_trait]
impl Resolve for FakeResolver {
    async fn lookup(&self, qname: &str, rtype: DNSResourceType) -> LookupResult {
        let key = (name::normalize(qname), rtype);
        self.calls.lock().unwrap().push(key.clone());

        let mut script = self.script.lock().unwrap();
        match script.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Err(LookupError::NxDomain)),
            None => Err(LookupError::NxDomain),
        }
    }
}

/// Zone transfer backend with a fixed outcome per server.
#[derive(Default)]
pub struct FakeTransfer {
    outcomes: HashMap<IpAddr, Result<Vec<DNSPacket>, XfrError>>,
    calls: Mutex<Vec<IpAddr>>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, server: &str, tlds: &[&str]) -> Self {
        self.outcomes
            .insert(server.parse().unwrap(), Ok(root_zone_messages(tlds)));
        self
    }

    pub fn fail(mut self, server: &str, err: XfrError) -> Self {
        self.outcomes.insert(server.parse().unwrap(), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<IpAddr> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZoneTransfer for FakeTransfer {
    async fn axfr(&self, server: IpAddr, _zone: &str) -> Result<Vec<DNSPacket>, XfrError> {
        self.calls.lock().unwrap().push(server);
        self.outcomes
            .get(&server)
            .cloned()
            .unwrap_or_else(|| Err(XfrError::Transport("connection refused".to_string())))
    }
}

/// Log lines emitted on the current thread while the returned guard lives.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn ns_record(owner: &str, target: &str) -> DNSResource {
    DNSResource::new(owner, 172800, DNSResourceData::NS(name::to_absolute(target)))
}

pub fn aaaa_record(owner: &str, addr: &str) -> DNSResource {
    DNSResource::new(owner, 3600, DNSResourceData::AAAA(addr.parse().unwrap()))
}

pub fn a_record(owner: &str, addr: &str) -> DNSResource {
    DNSResource::new(owner, 3600, DNSResourceData::A(addr.parse().unwrap()))
}

pub fn root_soa() -> DNSResource {
    DNSResource::new(
        ".",
        86400,
        DNSResourceData::SOA(SoaData {
            mname: "a.root-servers.net.".to_string(),
            rname: "nstld.verisign-grs.com.".to_string(),
            serial: 2024010101,
            refresh: 1800,
            retry: 900,
            expire: 604800,
            minimum: 86400,
        }),
    )
}

/// A root zone transfer split over two messages: SOA, apex NS, one
/// delegation (plus glue) per TLD, closing SOA.
pub fn root_zone_messages(tlds: &[&str]) -> Vec<DNSPacket> {
    let mut first = DNSPacket::default();
    first.header.qr = true;
    first.answers.push(root_soa());
    first.answers.push(ns_record(".", "a.root-servers.net."));

    let mut second = first.clone();
    second.answers.clear();
    for (i, tld) in tlds.iter().enumerate() {
        let target = format!("ns{}.nic.{}", i, tld.trim_end_matches('.'));
        second.answers.push(ns_record(tld, &target));
        second
            .answers
            .push(aaaa_record(&target, &format!("2001:db8::{}", i + 1)));
    }
    second.answers.push(root_soa());
    vec![first, second]
}
