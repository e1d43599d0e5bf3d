use std::any::Any;

use super::*;
use shared::error::*;

// An APayload is an A (IPv4) resource record body: 4 raw address octets.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct APayload {
    pub(crate) a: [u8; 4],
}

impl Payload for APayload {
    fn real_type(&self) -> DnsType {
        DnsType::A
    }

    fn pack(&self, msg: Vec<u8>) -> Result<Vec<u8>> {
        Ok(pack_bytes(msg, &self.a))
    }

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize> {
        if length != 4 || off + length > msg.len() {
            return Err(Error::ErrResourceLen);
        }
        self.a.copy_from_slice(&msg[off..off + 4]);
        Ok(off + 4)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
