pub(crate) mod a;
pub(crate) mod opaque;
pub(crate) mod ptr;
pub(crate) mod srv;
pub(crate) mod txt;

use std::any::Any;
use std::fmt;

use a::*;
use opaque::*;
use ptr::*;
use srv::*;
use txt::*;

use super::name::*;
use super::packer::*;
use super::*;
use shared::error::*;

// A Resource is a DNS resource record.
#[derive(Default, Debug)]
pub(crate) struct Resource {
    pub(crate) header: ResourceHeader,
    pub(crate) body: Option<Box<dyn Payload>>,
}

impl Resource {
    // pack appends the wire format of the Resource to msg. The RDLENGTH
    // field is reserved before the body is written and back-patched via
    // fix_len once the body length is known.
    pub(crate) fn pack(&mut self, msg: Vec<u8>) -> Result<Vec<u8>> {
        self.header.typ = self
            .body
            .as_ref()
            .ok_or(Error::ErrNilResourceBody)?
            .real_type();
        let (mut msg, len_off) = self.header.pack(msg)?;
        let pre_len = msg.len();
        if let Some(body) = &self.body {
            msg = body.pack(msg)?;
            self.header.fix_len(&mut msg, len_off, pre_len)?;
        }
        Ok(msg)
    }

    pub(crate) fn unpack(msg: &[u8], off: usize) -> Result<(Self, usize)> {
        let (header, off) = ResourceHeader::unpack(msg, off)?;
        let (body, off) = unpack_payload(header.typ, msg, off, header.length as usize)?;
        Ok((
            Resource {
                header,
                body: Some(body),
            },
            off,
        ))
    }

    // skip advances past a record using its declared RDLENGTH without
    // inspecting the body.
    pub(crate) fn skip(msg: &[u8], off: usize) -> Result<usize> {
        let (header, off) = ResourceHeader::unpack(msg, off)?;
        let new_off = off + header.length as usize;
        if new_off > msg.len() {
            return Err(Error::ErrResourceLen);
        }
        Ok(new_off)
    }
}

/// Header common to every DNS resource record: owner name, type, class,
/// TTL and the length of the RDATA that follows.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub(crate) struct ResourceHeader {
    pub(crate) name: Name,
    /// Set automatically during packing from the body's real type.
    pub(crate) typ: DnsType,
    pub(crate) class: DnsClass,
    pub(crate) ttl: u32,
    /// Set automatically during packing.
    pub(crate) length: u16,
}

impl fmt::Display for ResourceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResourceHeader{{Name: {}, Type: {}, Class: {}, TTL: {}, Length: {}}}",
            self.name, self.typ, self.class, self.ttl, self.length,
        )
    }
}

impl ResourceHeader {
    // pack appends the wire format of the header to msg and returns the
    // offset at which the Length field was packed, for fix_len.
    pub(crate) fn pack(&self, mut msg: Vec<u8>) -> Result<(Vec<u8>, usize)> {
        msg = self.name.pack(msg)?;
        msg = self.typ.pack(msg);
        msg = self.class.pack(msg);
        msg = pack_uint32(msg, self.ttl);
        let len_off = msg.len();
        msg = pack_uint16(msg, self.length);
        Ok((msg, len_off))
    }

    pub(crate) fn unpack(msg: &[u8], off: usize) -> Result<(Self, usize)> {
        let (name, off) = Name::unpack(msg, off);
        let (typ, off) = DnsType::unpack(msg, off)?;
        let (class, off) = DnsClass::unpack(msg, off)?;
        let (ttl, off) = unpack_uint32(msg, off)?;
        let (length, off) = unpack_uint16(msg, off)?;
        Ok((
            ResourceHeader {
                name,
                typ,
                class,
                ttl,
                length,
            },
            off,
        ))
    }

    // fix_len updates a packed ResourceHeader to include the length of the
    // packed body.
    //
    // len_off is the offset of the Length field in msg; pre_len is the
    // length msg had before the body was packed.
    pub(crate) fn fix_len(&mut self, msg: &mut [u8], len_off: usize, pre_len: usize) -> Result<()> {
        if msg.len() < pre_len || msg.len() > pre_len + u16::MAX as usize {
            return Err(Error::ErrResTooLong);
        }

        let con_len = msg.len() - pre_len;
        msg[len_off] = ((con_len >> 8) & 0xFF) as u8;
        msg[len_off + 1] = (con_len & 0xFF) as u8;
        self.length = con_len as u16;

        Ok(())
    }
}

// A Payload is a DNS resource record minus the header.
pub(crate) trait Payload: fmt::Debug {
    // real_type returns the actual type of the Resource. This is used to
    // fill in the header typ field.
    fn real_type(&self) -> DnsType;

    // pack packs a Resource except for its header.
    fn pack(&self, msg: Vec<u8>) -> Result<Vec<u8>>;

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize>;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) fn unpack_payload(
    typ: DnsType,
    msg: &[u8],
    mut off: usize,
    length: usize,
) -> Result<(Box<dyn Payload>, usize)> {
    let mut body: Box<dyn Payload> = match typ {
        DnsType::A => Box::<APayload>::default(),
        DnsType::Ptr => Box::<PtrPayload>::default(),
        DnsType::Srv => Box::<SrvPayload>::default(),
        DnsType::Txt => Box::<TxtPayload>::default(),
        // Record types this system does not inspect are carried opaquely.
        _ => Box::new(OpaquePayload {
            typ,
            data: Vec::new(),
        }),
    };

    off = body.unpack(msg, off, length)?;

    Ok((body, off))
}
