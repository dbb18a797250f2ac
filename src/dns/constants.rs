/// DNS Response Code constants from RFC 1035 and subsequent RFCs
pub struct DNSRcode;

impl DNSRcode {
    pub const NOERROR: u8 = 0; // No error
    pub const FORMERR: u8 = 1; // Format error
    pub const SERVFAIL: u8 = 2; // Server failure
    pub const NXDOMAIN: u8 = 3; // Name error
    pub const NOTIMP: u8 = 4; // Not implemented
    pub const REFUSED: u8 = 5; // Query refused
    pub const NOTAUTH: u8 = 9; // Not authorized

    /// Mnemonic for log lines.
    pub fn name(rcode: u8) -> &'static str {
        match rcode {
            Self::NOERROR => "NOERROR",
            Self::FORMERR => "FORMERR",
            Self::SERVFAIL => "SERVFAIL",
            Self::NXDOMAIN => "NXDOMAIN",
            Self::NOTIMP => "NOTIMP",
            Self::REFUSED => "REFUSED",
            Self::NOTAUTH => "NOTAUTH",
            _ => "UNKNOWN",
        }
    }
}

/// Well-known DNS port.
pub const DNS_PORT: u16 = 53;

/// Receive buffer for UDP responses. Queries carry no EDNS, so servers stay
/// within 512 bytes and set TC otherwise.
pub const UDP_RECV_SIZE: usize = 4096;
