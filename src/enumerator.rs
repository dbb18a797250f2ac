use crate::config::AddressFamily;
use crate::dns::DNSPacket;
use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::xfr::ZoneTransfer;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Apex of the zone being transferred.
pub const ROOT_ZONE: &str = ".";

/// Lists the TLDs delegated from the root zone by transferring it from the
/// first root server that allows it.
pub struct ZoneEnumerator {
    transfer: Arc<dyn ZoneTransfer>,
    family: AddressFamily,
}

impl ZoneEnumerator {
    pub fn new(transfer: Arc<dyn ZoneTransfer>, family: AddressFamily) -> Self {
        Self { transfer, family }
    }

    /// Tries each candidate in turn and returns the TLD set of the first
    /// complete transfer, or `None` once every candidate has failed.
    pub async fn enumerate(&self, candidates: &BTreeSet<IpAddr>) -> Option<BTreeSet<String>> {
        for &server in candidates.iter().filter(|addr| self.family.admits(addr)) {
            match self.transfer.axfr(server, ROOT_ZONE).await {
                Ok(messages) => {
                    let tlds = delegations(&messages);
                    info!("Transferred root zone from {}: {} TLDs", server, tlds.len());
                    return Some(tlds);
                }
                Err(e) => warn!("{}; Unable to XFR from {}", e, server),
            }
        }
        None
    }
}

/// Owners of NS records below the apex, lowercased.
pub fn delegations(messages: &[DNSPacket]) -> BTreeSet<String> {
    messages
        .iter()
        .flat_map(|message| message.answers_of_type(DNSResourceType::NS))
        .map(|record| name::normalize(&record.name()))
        .filter(|owner| !name::is_root(owner))
        .collect()
}
