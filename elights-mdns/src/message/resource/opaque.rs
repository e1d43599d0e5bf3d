use std::any::Any;

use super::*;
use shared::error::*;

// An OpaquePayload carries the raw RDATA of a record type this system
// does not interpret, so foreign records can be skipped without loss.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpaquePayload {
    pub(crate) typ: DnsType,
    pub(crate) data: Vec<u8>,
}

impl Payload for OpaquePayload {
    fn real_type(&self) -> DnsType {
        self.typ
    }

    fn pack(&self, msg: Vec<u8>) -> Result<Vec<u8>> {
        Ok(pack_bytes(msg, &self.data))
    }

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize> {
        if off + length > msg.len() {
            return Err(Error::ErrResourceLen);
        }
        self.data = msg[off..off + length].to_vec();
        Ok(off + length)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
