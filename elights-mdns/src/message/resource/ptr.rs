use std::any::Any;

use super::*;
use shared::error::*;

// A PtrPayload is a PTR resource record body: the target instance name.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct PtrPayload {
    pub(crate) ptr: Name,
}

impl Payload for PtrPayload {
    fn real_type(&self) -> DnsType {
        DnsType::Ptr
    }

    fn pack(&self, msg: Vec<u8>) -> Result<Vec<u8>> {
        self.ptr.pack(msg)
    }

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize> {
        if off + length > msg.len() {
            return Err(Error::ErrResourceLen);
        }
        let (ptr, _) = Name::unpack(msg, off);
        self.ptr = ptr;
        // The record ends where RDLENGTH says it does, regardless of how
        // far a compressed name may have pointed.
        Ok(off + length)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
