use bitstream_io::{BigEndian, BitReader, BitWrite, BitWriter};

use super::{ParseError, name};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// Upper bound on compression pointers followed while decoding one name.
const MAX_POINTER_HOPS: usize = 64;

pub type Writer<'a> = BitWriter<&'a mut Vec<u8>, BigEndian>;

pub trait PacketComponent: Sized {
    fn write(&self, writer: &mut Writer<'_>) -> Result<(), ParseError>;

    /// Reads one component starting at `*offset` in the complete message
    /// `buf`, leaving `offset` just past it. The whole message is needed so
    /// compressed names can be followed.
    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, ParseError>;
}

/// Returns a big-endian reader over exactly `len` bytes at `offset`.
pub fn fixed_reader(
    buf: &[u8],
    offset: usize,
    len: usize,
) -> Result<BitReader<&[u8], BigEndian>, ParseError> {
    let end = offset.checked_add(len).ok_or(ParseError::Truncated)?;
    let slice = buf.get(offset..end).ok_or(ParseError::Truncated)?;
    Ok(BitReader::new(slice))
}

/// Decodes a possibly compressed domain name (RFC 1035 4.1.4).
///
/// The returned labels never include the empty root label, so the root name
/// decodes to an empty vector. Labels come back in escaped presentation
/// form, so arbitrary bytes survive.
pub fn read_labels(buf: &[u8], offset: &mut usize) -> Result<Vec<String>, ParseError> {
    let mut labels = Vec::new();
    let mut pos = *offset;
    let mut resume_at = None;
    let mut hops = 0;
    let mut wire_len = 1;

    loop {
        let len = *buf.get(pos).ok_or(ParseError::Truncated)?;
        match len & 0xC0 {
            0x00 => {
                pos += 1;
                if len == 0 {
                    break;
                }
                let len = len as usize;
                let raw = buf.get(pos..pos + len).ok_or(ParseError::Truncated)?;
                wire_len += len + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(ParseError::NameTooLong);
                }
                labels.push(name::escape_label(raw));
                pos += len;
            }
            0xC0 => {
                let low = *buf.get(pos + 1).ok_or(ParseError::Truncated)?;
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(ParseError::BadPointer);
                }
                let target = (((len & 0x3F) as usize) << 8) | low as usize;
                if target >= buf.len() {
                    return Err(ParseError::BadPointer);
                }
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                pos = target;
            }
            // 0x40 and 0x80 are the retired extended label types.
            _ => return Err(ParseError::InvalidLabel),
        }
    }

    *offset = resume_at.unwrap_or(pos);
    Ok(labels)
}

/// Writes a name without compression, terminated by the root label.
/// Labels are unescaped from presentation form first.
pub fn write_labels(writer: &mut Writer<'_>, labels: &[String]) -> Result<(), ParseError> {
    let mut wire_len = 1;
    for label in labels {
        let raw = name::unescape_label(label).ok_or(ParseError::InvalidLabel)?;
        if raw.is_empty() || raw.len() > MAX_LABEL_LEN {
            return Err(ParseError::InvalidLabel);
        }
        wire_len += raw.len() + 1;
        if wire_len > MAX_NAME_LEN {
            return Err(ParseError::NameTooLong);
        }
        writer.write_var::<u8>(8, raw.len() as u8)?;
        writer.write_bytes(&raw)?;
    }
    writer.write_var::<u8>(8, 0)?;
    Ok(())
}
