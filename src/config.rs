use crate::dns::constants::DNS_PORT;
use crate::dns::name;
use crate::error::ConfigError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use domain::resolv::stub::conf::{ResolvConf, ResolvOptions};
use tracing::debug;

pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Upper bound for any configured timeout, in seconds.
const MAX_TIMEOUT_SECS: u64 = 300;

/// How queries reach the recursive resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// UDP, retrying over TCP when the answer comes back truncated.
    #[default]
    Udp,
    Tcp,
}

/// Which root server addresses are used as zone transfer candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    #[default]
    Any,
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn admits(&self, addr: &IpAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::Ipv4 => addr.is_ipv4(),
            AddressFamily::Ipv6 => addr.is_ipv6(),
        }
    }
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "udp" => Ok(Transport::Udp),
            "tcp" => Ok(Transport::Tcp),
            _ => Err(ConfigError::InvalidTransport(s.to_string())),
        }
    }
}

impl FromStr for AddressFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" => Ok(AddressFamily::Any),
            "4" | "v4" | "ipv4" => Ok(AddressFamily::Ipv4),
            "6" | "v6" | "ipv6" => Ok(AddressFamily::Ipv6),
            _ => Err(ConfigError::InvalidAddressFamily(s.to_string())),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Any => write!(f, "any"),
            AddressFamily::Ipv4 => write!(f, "ipv4"),
            AddressFamily::Ipv6 => write!(f, "ipv6"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Recursive resolvers used for NS/A/AAAA lookups
    pub resolvers: Vec<SocketAddr>,

    /// Deadline for a single query to a single resolver
    pub query_timeout: Duration,

    /// Deadline for each message of a zone transfer
    pub transfer_timeout: Duration,

    /// Transport used towards the resolvers
    pub transport: Transport,

    /// Root server addresses eligible for zone transfer
    pub address_family: AddressFamily,

    /// Name whose NS records list the root servers
    pub root_discovery_name: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            // glibc falls back to the local host when nothing is configured.
            resolvers: vec![SocketAddr::new(
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                DNS_PORT,
            )],
            query_timeout: Duration::from_secs(2),
            transfer_timeout: Duration::from_secs(30),
            transport: Transport::Udp,
            address_family: AddressFamily::Any,
            root_discovery_name: "root-servers.net.".to_string(),
        }
    }
}

impl AuditConfig {
    /// Defaults overlaid with the system resolver configuration, if readable.
    pub fn system() -> Self {
        Self::with_resolv_conf(Path::new(RESOLV_CONF_PATH))
    }

    /// Defaults overlaid with the resolvers and timeout of a resolv.conf
    /// file. Entries read before a malformed line still apply.
    pub fn with_resolv_conf(path: &Path) -> Self {
        let mut conf = ResolvConf::new();
        if let Err(e) = conf.parse_file(path) {
            debug!("Unable to fully read {}: {}", path.display(), e);
        }
        let mut config = Self::default();
        config.apply_resolv_conf(&conf);
        config
    }

    fn apply_resolv_conf(&mut self, conf: &ResolvConf) {
        // Every nameserver line yields a UDP and a TCP entry.
        let mut servers: Vec<SocketAddr> = Vec::new();
        for server in &conf.servers {
            if !servers.contains(&server.addr) {
                servers.push(server.addr);
            }
        }
        if !servers.is_empty() {
            debug!("Using {} resolvers from resolv.conf", servers.len());
            self.resolvers = servers;
        }

        // The library default stands for "no timeout option given".
        if conf.options.timeout != ResolvOptions::default().timeout {
            self.query_timeout = conf
                .options
                .timeout
                .clamp(Duration::from_secs(1), Duration::from_secs(MAX_TIMEOUT_SECS));
        }
    }

    /// Create an AuditConfig from the system configuration and environment
    /// variables. Returns Err if any override is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::system();

        if let Ok(resolvers) = std::env::var("TLDV6_RESOLVERS") {
            config.resolvers = parse_resolver_list(&resolvers)?;
        }

        if let Ok(timeout) = std::env::var("TLDV6_QUERY_TIMEOUT") {
            config.query_timeout = parse_timeout(&timeout)?;
        }

        if let Ok(timeout) = std::env::var("TLDV6_TRANSFER_TIMEOUT") {
            config.transfer_timeout = parse_timeout(&timeout)?;
        }

        if let Ok(transport) = std::env::var("TLDV6_TRANSPORT") {
            config.transport = transport.parse()?;
        }

        if let Ok(family) = std::env::var("TLDV6_ADDRESS_FAMILY") {
            config.address_family = family.parse()?;
        }

        if let Ok(discovery) = std::env::var("TLDV6_ROOT_DISCOVERY_NAME") {
            config.root_discovery_name = discovery;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolvers.is_empty() {
            return Err(ConfigError::InvalidResolver(
                "At least one resolver is required".to_string(),
            ));
        }

        for timeout in [self.query_timeout, self.transfer_timeout] {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout(
                    "Timeout must be greater than 0".to_string(),
                ));
            }
            if timeout.as_secs() > MAX_TIMEOUT_SECS {
                return Err(ConfigError::InvalidTimeout(
                    "Timeout too large (max 300 seconds)".to_string(),
                ));
            }
        }

        if name::is_root(&self.root_discovery_name) {
            return Err(ConfigError::InvalidName(
                "Root discovery name must not be the root".to_string(),
            ));
        }

        Ok(())
    }
}

/// Accepts `ip`, `ip:port` and `[ipv6]:port`; a bare address gets port 53.
pub fn parse_resolver(s: &str) -> Result<SocketAddr, ConfigError> {
    let s = s.trim();
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| ConfigError::InvalidResolver(s.to_string()))
}

pub fn parse_resolver_list(s: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    let servers = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_resolver)
        .collect::<Result<Vec<_>, _>>()?;
    if servers.is_empty() {
        return Err(ConfigError::InvalidResolver(
            "No valid resolvers provided".to_string(),
        ));
    }
    Ok(servers)
}

/// Whole seconds, 1 to 300.
pub fn parse_timeout(s: &str) -> Result<Duration, ConfigError> {
    let secs = s
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout(s.to_string()))?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidTimeout(format!(
            "{} (expected 1-300 seconds)",
            s
        )));
    }
    Ok(Duration::from_secs(secs))
}
