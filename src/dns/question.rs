use bitstream_io::{BitRead, BitWrite};

use super::{
    ParseError,
    common::{PacketComponent, Writer, fixed_reader, read_labels, write_labels},
    enums::{DNSResourceClass, DNSResourceType},
    name,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    pub labels: Vec<String>,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(qname: &str, qtype: DNSResourceType) -> Self {
        Self {
            labels: name::labels_of(qname),
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }

    /// Absolute presentation form of the question name.
    pub fn name(&self) -> String {
        name::from_labels(&self.labels)
    }
}

impl PacketComponent for DNSQuestion {
    fn write(&self, writer: &mut Writer<'_>) -> Result<(), ParseError> {
        write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.qtype.into())?;
        writer.write_var::<u16>(16, self.qclass.into())?;
        Ok(())
    }

    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, ParseError> {
        let labels = read_labels(buf, offset)?;
        let mut reader = fixed_reader(buf, *offset, 4)?;
        let qtype = reader.read_var::<u16>(16)?.into();
        let qclass = reader.read_var::<u16>(16)?.into();
        *offset += 4;
        Ok(DNSQuestion {
            labels,
            qtype,
            qclass,
        })
    }
}
