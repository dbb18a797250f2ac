use thiserror::Error;

use crate::dns::ParseError;

/// Outcome kinds of a failed name lookup. Callers branch on the kind, so
/// these stay distinct rather than collapsing into a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("query timed out")]
    Timeout,

    #[error("the name exists but has no records of the requested type")]
    NoAnswer,

    #[error("the name does not exist")]
    NxDomain,

    #[error("no working name servers: {0}")]
    NoNameservers(String),
}

/// Failure of a single exchange with one server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timed out")]
    Timeout,

    #[error("IO error: {0}")]
    Io(String),

    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Zone transfer failures, split the way the enumerator reports them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XfrError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("transfer error: {0}")]
    Transfer(String),
}

impl From<TransportError> for XfrError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Malformed(e) => XfrError::Format(e.to_string()),
            other => XfrError::Transport(other.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid resolver address: {0}")]
    InvalidResolver(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid transport: {0}")]
    InvalidTransport(String),

    #[error("Invalid address family: {0}")]
    InvalidAddressFamily(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

/// Errors that end a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("unable to look up root servers under {name}: {source}")]
    RootDiscovery { name: String, source: LookupError },

    #[error("no root server addresses could be resolved")]
    NoRootServers,

    #[error("unable to transfer the root zone from any root server")]
    ZoneTransferExhausted,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
