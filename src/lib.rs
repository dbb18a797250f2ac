pub mod audit;
pub mod config;
pub mod dns;
pub mod enumerator;
pub mod error;
pub mod locator;
pub mod probe;
pub mod resolver;
pub mod transport;
pub mod xfr;

pub use audit::{Audit, AuditSummary};
pub use config::AuditConfig;
pub use dns::DNSPacket;
pub use probe::{CheckVerdict, Ipv6Prober, RetryPolicy};
