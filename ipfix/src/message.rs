use std::convert::TryFrom;
use bytes::{BufMut, Bytes, BytesMut};
use crate::element::InfoElement;
use crate::record::{Data, Record, Template, Value};
use crate::Error;

pub const MIN_TEMPLATE_ID: u16 = 256;

const VERSION:         u16   = 10;
const TEMPLATE_SET_ID: u16   = 2;
const MAX_MESSAGE:     usize = 65535;
const ENTERPRISE:      u16   = 0x8000;

/// Frames records into IPFIX messages for one observation domain,
/// tracking the data record sequence number across the stream.
#[derive(Debug)]
pub struct Message {
    domain:   u32,
    sequence: u32,
}

impl Message {
    pub fn new(domain: u32) -> Self {
        Self {
            domain:   domain,
            sequence: 0,
        }
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Encode a record into a single message, returning it along with the
    /// number of data records it carries. The sequence number is not
    /// advanced until the message is committed.
    pub fn encode(&self, record: &Record, export_time: u32) -> Result<(Bytes, u32), Error> {
        let id = record.id();
        if id < MIN_TEMPLATE_ID {
            return Err(Error::TemplateId(id));
        }

        let mut buf = BytesMut::with_capacity(512);
        buf.put_u16(VERSION);
        buf.put_u16(0);
        buf.put_u32(export_time);
        buf.put_u32(self.sequence);
        buf.put_u32(self.domain);

        let start = buf.len();
        buf.put_u16(0);
        buf.put_u16(0);

        let (set, records) = match record {
            Record::Template(t) => (TEMPLATE_SET_ID, template(&mut buf, t)?),
            Record::Data(d)     => (d.id, data(&mut buf, d)?),
        };

        let length = buf.len();
        if length > MAX_MESSAGE {
            return Err(Error::TooLarge(length));
        }

        let set_length = (length - start) as u16;
        buf[2..4].copy_from_slice(&(length as u16).to_be_bytes());
        buf[start..start + 2].copy_from_slice(&set.to_be_bytes());
        buf[start + 2..start + 4].copy_from_slice(&set_length.to_be_bytes());

        Ok((buf.freeze(), records))
    }

    /// Count data records that reached the collector.
    pub fn commit(&mut self, records: u32) {
        self.sequence = self.sequence.wrapping_add(records);
    }
}

fn template(buf: &mut BytesMut, t: &Template) -> Result<u32, Error> {
    if t.elements.is_empty() {
        return Err(Error::EmptyTemplate(t.id));
    }

    buf.put_u16(t.id);
    buf.put_u16(t.elements.len() as u16);

    for e in &t.elements {
        specifier(buf, e);
    }

    Ok(0)
}

fn specifier(buf: &mut BytesMut, e: &InfoElement) {
    match e.is_enterprise() {
        true  => {
            buf.put_u16(e.id | ENTERPRISE);
            buf.put_u16(e.length);
            buf.put_u32(e.enterprise);
        },
        false => {
            buf.put_u16(e.id & !ENTERPRISE);
            buf.put_u16(e.length);
        }
    }
}

fn data(buf: &mut BytesMut, d: &Data) -> Result<u32, Error> {
    for field in &d.fields {
        value(buf, &field.value)?;
    }
    Ok(1)
}

fn value(buf: &mut BytesMut, v: &Value) -> Result<(), Error> {
    match v {
        Value::Unsigned8(n)       => buf.put_u8(*n),
        Value::Unsigned16(n)      => buf.put_u16(*n),
        Value::Unsigned32(n)      => buf.put_u32(*n),
        Value::Unsigned64(n)      => buf.put_u64(*n),
        Value::Ipv4(ip)           => buf.put_slice(&ip.octets()),
        Value::Ipv6(ip)           => buf.put_slice(&ip.octets()),
        Value::DateTimeSeconds(s) => {
            let secs = u32::try_from(*s).map_err(|_| Error::Timestamp(*s))?;
            buf.put_u32(secs);
        },
        Value::String(s) if s.len() < 255 => {
            buf.put_u8(s.len() as u8);
            buf.put_slice(s.as_bytes());
        },
        Value::String(s) => {
            let len = u16::try_from(s.len()).map_err(|_| Error::TooLarge(s.len()))?;
            buf.put_u8(255);
            buf.put_u16(len);
            buf.put_slice(s.as_bytes());
        }
    }
    Ok(())
}
