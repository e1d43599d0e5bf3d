use std::any::Any;

use super::*;
use shared::error::*;

// An SrvPayload is an SRV resource record body: priority, weight, port
// and the target hostname.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct SrvPayload {
    pub(crate) priority: u16,
    pub(crate) weight: u16,
    pub(crate) port: u16,
    pub(crate) target: Name,
}

impl Payload for SrvPayload {
    fn real_type(&self) -> DnsType {
        DnsType::Srv
    }

    fn pack(&self, mut msg: Vec<u8>) -> Result<Vec<u8>> {
        msg = pack_uint16(msg, self.priority);
        msg = pack_uint16(msg, self.weight);
        msg = pack_uint16(msg, self.port);
        self.target.pack(msg)
    }

    fn unpack(&mut self, msg: &[u8], off: usize, length: usize) -> Result<usize> {
        if off + length > msg.len() {
            return Err(Error::ErrResourceLen);
        }
        let (priority, o) = unpack_uint16(msg, off)?;
        let (weight, o) = unpack_uint16(msg, o)?;
        let (port, o) = unpack_uint16(msg, o)?;
        let (target, _) = Name::unpack(msg, o);
        self.priority = priority;
        self.weight = weight;
        self.port = port;
        self.target = target;
        Ok(off + length)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
