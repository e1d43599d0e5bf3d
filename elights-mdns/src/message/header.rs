use super::packer::*;
use shared::error::*;

// HEADER_LEN is the length (in bytes) of a DNS header.
//
// A header is comprised of 6 uint16s and no padding.
pub(crate) const HEADER_LEN: usize = 6 * UINT16LEN;

const HEADER_BIT_QR: u16 = 1 << 15; // query/response (response=1)
const HEADER_BIT_AA: u16 = 1 << 10; // authoritative

/// The fixed 12-byte DNS message header.
///
/// The message ID is always zero on the wire (mDNS) and is not modeled.
/// Only the QR and AA flag bits are meaningful in this system: queries
/// carry flags 0x0000, announcements 0x8400.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) response: bool,
    pub(crate) authoritative: bool,
    pub(crate) questions: u16,
    pub(crate) answers: u16,
    pub(crate) authorities: u16,
    pub(crate) additionals: u16,
}

impl Header {
    fn bits(&self) -> u16 {
        let mut bits = 0;
        if self.response {
            bits |= HEADER_BIT_QR;
        }
        if self.authoritative {
            bits |= HEADER_BIT_AA;
        }
        bits
    }

    // pack appends the wire format of the header to msg.
    pub(crate) fn pack(&self, msg: Vec<u8>) -> Vec<u8> {
        let mut msg = pack_uint16(msg, 0); // ID is always 0 for mDNS
        msg = pack_uint16(msg, self.bits());
        msg = pack_uint16(msg, self.questions);
        msg = pack_uint16(msg, self.answers);
        msg = pack_uint16(msg, self.authorities);
        pack_uint16(msg, self.additionals)
    }

    pub(crate) fn unpack(msg: &[u8]) -> Result<(Self, usize)> {
        let (_id, off) = unpack_uint16(msg, 0)?;
        let (bits, off) = unpack_uint16(msg, off)?;
        let (questions, off) = unpack_uint16(msg, off)?;
        let (answers, off) = unpack_uint16(msg, off)?;
        let (authorities, off) = unpack_uint16(msg, off)?;
        let (additionals, off) = unpack_uint16(msg, off)?;
        Ok((
            Header {
                response: bits & HEADER_BIT_QR != 0,
                authoritative: bits & HEADER_BIT_AA != 0,
                questions,
                answers,
                authorities,
                additionals,
            },
            off,
        ))
    }
}
