pub mod common;
pub mod constants;
pub mod enums;
pub mod header;
pub mod name;
pub mod question;
pub mod resource;

use common::{PacketComponent, Writer};
use enums::DNSResourceType;
use header::DNSHeader;
use question::DNSQuestion;
use resource::DNSResource;
use thiserror::Error;
use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid DNS header")]
    InvalidHeader,
    #[error("Invalid DNS label")]
    InvalidLabel,
    #[error("DNS name too long")]
    NameTooLong,
    #[error("Invalid compression pointer")]
    BadPointer,
    #[error("Message truncated")]
    Truncated,
    #[error("Malformed {0} record data")]
    InvalidRData(DNSResourceType),
    #[error("Too many records in section")]
    TooManyRecords,
    #[error("Invalid bit stream: {0}")]
    InvalidBitStream(String),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::InvalidBitStream(e.to_string())
    }
}

impl DNSPacket {
    /// Builds a single-question query with a random id.
    pub fn query(qname: &str, qtype: DNSResourceType, recursion_desired: bool) -> Self {
        DNSPacket {
            header: DNSHeader::query(rand::random(), recursion_desired),
            questions: vec![DNSQuestion::new(qname, qtype)],
            ..Default::default()
        }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        trace!("Parsing DNS packet, size: {} bytes", buf.len());
        let mut offset = 0;
        let header = DNSHeader::read(buf, &mut offset)?;

        let packet = DNSPacket {
            questions: read_section(buf, &mut offset, header.qdcount)?,
            answers: read_section(buf, &mut offset, header.ancount)?,
            authorities: read_section(buf, &mut offset, header.nscount)?,
            resources: read_section(buf, &mut offset, header.arcount)?,
            header,
        };

        if offset != buf.len() {
            trace!("Ignoring {} trailing bytes", buf.len() - offset);
        }
        Ok(packet)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        let mut header = self.header.clone();
        header.qdcount = section_count(self.questions.len())?;
        header.ancount = section_count(self.answers.len())?;
        header.nscount = section_count(self.authorities.len())?;
        header.arcount = section_count(self.resources.len())?;

        let mut buf = Vec::new();
        let mut writer = Writer::new(&mut buf);
        header.write(&mut writer)?;
        for question in &self.questions {
            question.write(&mut writer)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.resources)
        {
            record.write(&mut writer)?;
        }
        Ok(buf)
    }

    /// Answer-section records of the given type.
    pub fn answers_of_type(&self, rtype: DNSResourceType) -> impl Iterator<Item = &DNSResource> {
        self.answers.iter().filter(move |r| r.rtype == rtype)
    }

    /// Turns a query into an empty response carrying the same question.
    pub fn response_to(query: &DNSPacket, rcode: u8) -> Self {
        let mut header = query.header.clone();
        header.qr = true;
        header.ra = true;
        header.rcode = rcode;
        DNSPacket {
            header,
            questions: query.questions.clone(),
            ..Default::default()
        }
    }
}

fn read_section<T: PacketComponent>(
    buf: &[u8],
    offset: &mut usize,
    count: u16,
) -> Result<Vec<T>, ParseError> {
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(T::read(buf, offset)?);
    }
    Ok(items)
}

fn section_count(len: usize) -> Result<u16, ParseError> {
    u16::try_from(len).map_err(|_| ParseError::TooManyRecords)
}
