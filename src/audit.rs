//! Runs a full audit: root servers, root zone, then one probe per TLD.

use crate::config::AuditConfig;
use crate::enumerator::ZoneEnumerator;
use crate::error::{AuditError, Result};
use crate::locator::RootServerLocator;
use crate::probe::{CheckVerdict, Ipv6Prober};
use crate::resolver::{Resolve, StubResolver};
use crate::xfr::{TcpZoneTransfer, ZoneTransfer};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Counter line shown while the audit runs, overwritten in place.
#[derive(Debug, Default)]
pub struct Progress {
    last_len: usize,
}

impl Progress {
    /// The `[   n/total pct%] ` prefix, 1-based.
    pub fn prefix(index: usize, total: usize) -> String {
        let n = index + 1;
        let percent = if total == 0 { 100 } else { n * 100 / total };
        format!("[{:4}/{:4} {:3}%] ", n, total, percent)
    }

    /// Clears the previous line and writes the new one without a newline.
    pub fn render(&mut self, index: usize, total: usize, tld: &str) -> String {
        let prefix = Self::prefix(index, total);
        let blank = " ".repeat(self.last_len + prefix.len());
        self.last_len = tld.len();
        format!("\r{}\r{}{}", blank, prefix, tld)
    }
}

/// What a finished run found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    pub checked: usize,
    pub failures: Vec<(String, CheckVerdict)>,
}

pub struct Audit {
    config: AuditConfig,
    resolver: Arc<dyn Resolve>,
    transfer: Arc<dyn ZoneTransfer>,
}

impl Audit {
    /// Audit over the network with the configured resolvers.
    pub fn new(config: AuditConfig) -> Self {
        let resolver = Arc::new(StubResolver::new(&config));
        let transfer = Arc::new(TcpZoneTransfer::new(config.transfer_timeout));
        Self::with_backends(config, resolver, transfer)
    }

    pub fn with_backends(
        config: AuditConfig,
        resolver: Arc<dyn Resolve>,
        transfer: Arc<dyn ZoneTransfer>,
    ) -> Self {
        Self {
            config,
            resolver,
            transfer,
        }
    }

    /// Runs the audit. Failing TLDs go to `out` as `<tld>\t<verdict>`
    /// lines; the progress counter goes to `progress`.
    pub async fn run<O, P>(&self, out: &mut O, progress: &mut P) -> Result<AuditSummary>
    where
        O: Write,
        P: Write,
    {
        let locator =
            RootServerLocator::new(self.resolver.clone(), &self.config.root_discovery_name);
        let root_servers = locator.locate().await?;

        let enumerator = ZoneEnumerator::new(self.transfer.clone(), self.config.address_family);
        let tlds = enumerator
            .enumerate(&root_servers)
            .await
            .ok_or(AuditError::ZoneTransferExhausted)?;

        let prober = Ipv6Prober::new(self.resolver.clone());
        let total = tlds.len();
        let mut bar = Progress::default();
        let mut summary = AuditSummary::default();

        // BTreeSet iteration is already sorted.
        for (index, tld) in tlds.iter().enumerate() {
            write!(progress, "{}", bar.render(index, total, tld))?;
            progress.flush()?;

            let verdict = prober.probe(tld).await;
            summary.checked += 1;
            if !verdict.is_ok() {
                writeln!(out, "{}\t{}", tld, verdict)?;
                out.flush()?;
                summary.failures.push((tld.clone(), verdict));
            }
        }
        writeln!(progress)?;

        info!(
            "Checked {} TLDs, {} without IPv6 name servers or not checkable",
            summary.checked,
            summary.failures.len()
        );
        Ok(summary)
    }
}
