use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::error::{AuditError, Result};
use crate::resolver::Resolve;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Finds the addresses of the root servers, both families.
pub struct RootServerLocator {
    resolver: Arc<dyn Resolve>,
    discovery_name: String,
}

impl RootServerLocator {
    pub fn new(resolver: Arc<dyn Resolve>, discovery_name: &str) -> Self {
        Self {
            resolver,
            discovery_name: name::normalize(discovery_name),
        }
    }

    /// Resolves the root server names listed under the discovery name and
    /// collects their A and AAAA addresses.
    ///
    /// Failing to list the names is fatal. A failed address lookup for one
    /// name is logged and skipped; the result is an error only if no
    /// address at all could be found.
    pub async fn locate(&self) -> Result<BTreeSet<IpAddr>> {
        let names = self.root_server_names().await?;
        info!(
            "Found {} root server names under {}",
            names.len(),
            self.discovery_name
        );

        let mut addresses = BTreeSet::new();
        for server_name in &names {
            for rtype in [DNSResourceType::A, DNSResourceType::AAAA] {
                match self.resolver.lookup(server_name, rtype).await {
                    Ok(records) => {
                        addresses.extend(records.iter().filter_map(|r| r.ip_addr()));
                    }
                    Err(e) => warn!("{} lookup for {} failed: {}", rtype, server_name, e),
                }
            }
        }

        if addresses.is_empty() {
            return Err(AuditError::NoRootServers);
        }
        debug!("Root server addresses: {:?}", addresses);
        Ok(addresses)
    }

    async fn root_server_names(&self) -> Result<BTreeSet<String>> {
        let records = self
            .resolver
            .lookup(&self.discovery_name, DNSResourceType::NS)
            .await
            .map_err(|source| AuditError::RootDiscovery {
                name: self.discovery_name.clone(),
                source,
            })?;

        Ok(records
            .iter()
            .filter_map(|r| r.ns_target())
            .map(name::normalize)
            .collect())
    }
}
