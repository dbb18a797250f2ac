use std::net::{Ipv4Addr, Ipv6Addr};

use bitstream_io::{BitRead, BitWrite};

use super::{
    ParseError,
    common::{PacketComponent, Writer, fixed_reader, read_labels, write_labels},
    enums::{DNSResourceClass, DNSResourceType},
    name,
};

/// TYPE, CLASS, TTL and RDLENGTH.
const FIXED_LEN: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdata: DNSResourceData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoaData {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// Record data. Names inside RDATA are kept in absolute presentation form
/// with their original case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DNSResourceData {
    #[default]
    Empty,
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(String),
    CNAME(String),
    SOA(SoaData),
    Raw(Vec<u8>),
}

impl DNSResource {
    /// Record whose type follows from its data.
    ///
    /// `Empty` and `Raw` data carry no type of their own and get the reserved
    /// type 0; build those with [`DNSResource::raw`] instead.
    pub fn new(owner: &str, ttl: u32, rdata: DNSResourceData) -> Self {
        let rtype = match &rdata {
            DNSResourceData::A(_) => DNSResourceType::A,
            DNSResourceData::AAAA(_) => DNSResourceType::AAAA,
            DNSResourceData::NS(_) => DNSResourceType::NS,
            DNSResourceData::CNAME(_) => DNSResourceType::CNAME,
            DNSResourceData::SOA(_) => DNSResourceType::SOA,
            DNSResourceData::Empty | DNSResourceData::Raw(_) => DNSResourceType::Unknown(0),
        };
        Self::with_type(owner, rtype, ttl, rdata)
    }

    /// Record of an explicit type with opaque data.
    pub fn raw(owner: &str, rtype: DNSResourceType, ttl: u32, data: Vec<u8>) -> Self {
        let rdata = if data.is_empty() {
            DNSResourceData::Empty
        } else {
            DNSResourceData::Raw(data)
        };
        Self::with_type(owner, rtype, ttl, rdata)
    }

    fn with_type(owner: &str, rtype: DNSResourceType, ttl: u32, rdata: DNSResourceData) -> Self {
        Self {
            labels: name::labels_of(owner),
            rtype,
            rclass: DNSResourceClass::IN,
            ttl,
            rdata,
        }
    }

    /// Absolute presentation form of the owner name.
    pub fn name(&self) -> String {
        name::from_labels(&self.labels)
    }

    /// Target of an NS record.
    pub fn ns_target(&self) -> Option<&str> {
        match &self.rdata {
            DNSResourceData::NS(target) => Some(target),
            _ => None,
        }
    }

    pub fn ip_addr(&self) -> Option<std::net::IpAddr> {
        match self.rdata {
            DNSResourceData::A(addr) => Some(addr.into()),
            DNSResourceData::AAAA(addr) => Some(addr.into()),
            _ => None,
        }
    }
}

fn read_rdata(
    buf: &[u8],
    start: usize,
    len: usize,
    rtype: DNSResourceType,
) -> Result<DNSResourceData, ParseError> {
    let end = start + len;
    let raw = buf.get(start..end).ok_or(ParseError::Truncated)?;
    let invalid = || ParseError::InvalidRData(rtype);

    let data = match rtype {
        DNSResourceType::A => {
            let octets: [u8; 4] = raw.try_into().map_err(|_| invalid())?;
            DNSResourceData::A(Ipv4Addr::from(octets))
        }
        DNSResourceType::AAAA => {
            let octets: [u8; 16] = raw.try_into().map_err(|_| invalid())?;
            DNSResourceData::AAAA(Ipv6Addr::from(octets))
        }
        DNSResourceType::NS | DNSResourceType::CNAME => {
            let mut pos = start;
            let target = name::from_labels(&read_labels(buf, &mut pos)?);
            if pos != end {
                return Err(invalid());
            }
            if rtype == DNSResourceType::NS {
                DNSResourceData::NS(target)
            } else {
                DNSResourceData::CNAME(target)
            }
        }
        DNSResourceType::SOA => {
            let mut pos = start;
            let mname = name::from_labels(&read_labels(buf, &mut pos)?);
            let rname = name::from_labels(&read_labels(buf, &mut pos)?);
            if pos + 20 != end {
                return Err(invalid());
            }
            let mut reader = fixed_reader(buf, pos, 20)?;
            DNSResourceData::SOA(SoaData {
                mname,
                rname,
                serial: reader.read_var::<u32>(32)?,
                refresh: reader.read_var::<u32>(32)?,
                retry: reader.read_var::<u32>(32)?,
                expire: reader.read_var::<u32>(32)?,
                minimum: reader.read_var::<u32>(32)?,
            })
        }
        _ if raw.is_empty() => DNSResourceData::Empty,
        _ => DNSResourceData::Raw(raw.to_vec()),
    };
    Ok(data)
}

fn write_rdata(writer: &mut Writer<'_>, rdata: &DNSResourceData) -> Result<(), ParseError> {
    match rdata {
        DNSResourceData::Empty => {}
        DNSResourceData::A(addr) => writer.write_bytes(&addr.octets())?,
        DNSResourceData::AAAA(addr) => writer.write_bytes(&addr.octets())?,
        DNSResourceData::NS(target) | DNSResourceData::CNAME(target) => {
            write_labels(writer, &name::labels_of(target))?
        }
        DNSResourceData::SOA(soa) => {
            write_labels(writer, &name::labels_of(&soa.mname))?;
            write_labels(writer, &name::labels_of(&soa.rname))?;
            for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                writer.write_var::<u32>(32, value)?;
            }
        }
        DNSResourceData::Raw(bytes) => writer.write_bytes(bytes)?,
    }
    Ok(())
}

impl PacketComponent for DNSResource {
    fn write(&self, writer: &mut Writer<'_>) -> Result<(), ParseError> {
        let mut rdata = Vec::new();
        write_rdata(&mut Writer::new(&mut rdata), &self.rdata)?;
        let rdlength = u16::try_from(rdata.len()).map_err(|_| ParseError::InvalidRData(self.rtype))?;

        write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.rclass.into())?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, rdlength)?;
        writer.write_bytes(&rdata)?;
        Ok(())
    }

    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, ParseError> {
        let labels = read_labels(buf, offset)?;
        let mut reader = fixed_reader(buf, *offset, FIXED_LEN)?;
        let rtype: DNSResourceType = reader.read_var::<u16>(16)?.into();
        let rclass = reader.read_var::<u16>(16)?.into();
        let ttl = reader.read_var::<u32>(32)?;
        let rdlength = reader.read_var::<u16>(16)? as usize;
        *offset += FIXED_LEN;

        let rdata = read_rdata(buf, *offset, rdlength, rtype)?;
        *offset += rdlength;

        Ok(DNSResource {
            labels,
            rtype,
            rclass,
            ttl,
            rdata,
        })
    }
}
