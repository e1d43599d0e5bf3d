use std::fmt;

use shared::error::*;

// Longest label permitted by RFC 1035 (the top two bits of the length
// byte are reserved for compression pointers).
const MAX_LABEL_LEN: usize = 63;

/// A domain name as a dot-separated string, e.g. `"_elg._tcp.local"`.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Name {
    pub(crate) data: String,
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

impl Name {
    pub(crate) fn new(data: &str) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::ErrNameEmpty);
        }
        Ok(Name {
            data: data.to_owned(),
        })
    }

    /// The form used for all business-logic matching: lowercase, with a
    /// trailing root dot stripped.
    pub(crate) fn normalized(&self) -> String {
        normalize(&self.data)
    }

    // pack appends the wire format of the name to msg: each non-empty
    // dot-separated segment as a length-prefixed label, then a zero
    // terminator. Compression pointers are never emitted.
    pub(crate) fn pack(&self, mut msg: Vec<u8>) -> Result<Vec<u8>> {
        for label in self.data.split('.') {
            if label.is_empty() {
                continue;
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::ErrLabelTooLong);
            }
            msg.push(label.len() as u8);
            msg.extend_from_slice(label.as_bytes());
        }
        msg.push(0);
        Ok(msg)
    }

    // unpack reads a name starting at off, following compression pointers.
    //
    // The returned offset is the external cursor: it advances past the two
    // pointer bytes exactly once (the first time a pointer is taken), or
    // past the terminating zero label when no pointer was taken, even
    // though internal parsing may keep jumping through further pointers.
    //
    // Decoding is lenient. On truncated input, a pointer past the end of
    // the message, or a pointer cycle (jumps are capped at the message
    // length), the name assembled so far is returned without error and the
    // cursor stays at the last consistent position. A bad packet must
    // never take the receive loop down.
    pub(crate) fn unpack(msg: &[u8], off: usize) -> (Self, usize) {
        let mut data = String::new();
        let mut new_off = off;
        let mut i = off;
        let mut jumped = false;
        let mut jumps = 0usize;

        while i < msg.len() && jumps < msg.len() {
            let len = msg[i] as usize;

            if len & 0xC0 == 0xC0 {
                if i + 1 >= msg.len() {
                    break;
                }
                let pointer = ((len & 0x3F) << 8) | msg[i + 1] as usize;
                if pointer >= msg.len() {
                    break;
                }
                if !jumped {
                    new_off = i + 2;
                }
                i = pointer;
                jumped = true;
                jumps += 1;
                continue;
            }

            if len == 0 {
                if !jumped {
                    new_off = i + 1;
                }
                break;
            }

            if i + 1 + len > msg.len() {
                break;
            }
            if !data.is_empty() {
                data.push('.');
            }
            // Labels are treated as opaque bytes; lossy conversion is fine
            // for matching purposes.
            data.push_str(&String::from_utf8_lossy(&msg[i + 1..i + 1 + len]));
            if !jumped {
                new_off = i + 1 + len;
            }
            i += 1 + len;
        }

        (Name { data }, new_off)
    }

    // skip advances past a name without keeping its contents.
    pub(crate) fn skip(msg: &[u8], off: usize) -> usize {
        Self::unpack(msg, off).1
    }
}

/// Normalize a DNS name for matching: lowercase, trailing root dot removed.
pub(crate) fn normalize(s: &str) -> String {
    s.strip_suffix('.').unwrap_or(s).to_ascii_lowercase()
}
