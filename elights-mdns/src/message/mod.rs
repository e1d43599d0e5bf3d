
pub(crate) mod builder;
pub(crate) mod header;
pub(crate) mod name;
pub(crate) mod packer;
pub(crate) mod question;
pub(crate) mod resource;

use std::fmt;

use header::*;
use packer::*;
use question::*;
use resource::*;

use shared::error::*;

// Message formats

// A DnsType is a type of DNS request and response.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DnsType {
    // ResourceHeader.typ and Question.typ
    A = 1,
    Ptr = 12,
    Txt = 16,
    Srv = 33,

    // Question.typ only
    All = 255,

    #[default]
    Unsupported = 0,
}

impl From<u16> for DnsType {
    fn from(v: u16) -> Self {
        match v {
            1 => DnsType::A,
            12 => DnsType::Ptr,
            16 => DnsType::Txt,
            33 => DnsType::Srv,
            255 => DnsType::All,
            _ => DnsType::Unsupported,
        }
    }
}

impl fmt::Display for DnsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            DnsType::A => "A",
            DnsType::Ptr => "PTR",
            DnsType::Txt => "TXT",
            DnsType::Srv => "SRV",
            DnsType::All => "ALL",
            _ => "Unsupported",
        };
        write!(f, "{s}")
    }
}

impl DnsType {
    // pack appends the wire format of the type to msg.
    pub(crate) fn pack(&self, msg: Vec<u8>) -> Vec<u8> {
        pack_uint16(msg, *self as u16)
    }

    pub(crate) fn unpack(msg: &[u8], off: usize) -> Result<(Self, usize)> {
        let (t, o) = unpack_uint16(msg, off)?;
        Ok((DnsType::from(t), o))
    }
}

/// DNS class for a question or resource record.
///
/// In mDNS the high bit of the class field is the cache-flush flag; the
/// remaining 15 bits carry the class proper (always IN here).
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct DnsClass(pub(crate) u16);

/// Internet class (IN).
pub(crate) const CLASS_INET: DnsClass = DnsClass(1);

/// Any class (*) - valid in questions only.
pub(crate) const CLASS_ANY: DnsClass = DnsClass(255);

/// The mDNS cache-flush bit, set on top of the class value in responses.
pub(crate) const CACHE_FLUSH: u16 = 0x8000;

/// Internet class with the cache-flush bit set (0x8001).
pub(crate) const CLASS_INET_FLUSH: DnsClass = DnsClass(CLASS_INET.0 | CACHE_FLUSH);

impl DnsClass {
    /// True for IN with or without the cache-flush bit.
    pub(crate) fn is_inet(&self) -> bool {
        self.0 & !CACHE_FLUSH == CLASS_INET.0
    }

    // pack appends the wire format of the class to msg.
    pub(crate) fn pack(&self, msg: Vec<u8>) -> Vec<u8> {
        pack_uint16(msg, self.0)
    }

    pub(crate) fn unpack(msg: &[u8], off: usize) -> Result<(Self, usize)> {
        let (c, o) = unpack_uint16(msg, off)?;
        Ok((DnsClass(c), o))
    }
}

impl fmt::Display for DnsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CLASS_INET => write!(f, "ClassINET"),
            CLASS_INET_FLUSH => write!(f, "ClassINET+flush"),
            CLASS_ANY => write!(f, "ClassANY"),
            DnsClass(other) => write!(f, "{other}"),
        }
    }
}

// A Message is a representation of a DNS message.
#[derive(Default, Debug)]
pub(crate) struct Message {
    pub(crate) header: Header,
    pub(crate) questions: Vec<Question>,
    pub(crate) answers: Vec<Resource>,
    pub(crate) authorities: Vec<Resource>,
    pub(crate) additionals: Vec<Resource>,
}

impl Message {
    // unpack parses a full Message.
    pub(crate) fn unpack(msg: &[u8]) -> Result<Self> {
        let (header, mut off) = Header::unpack(msg)?;

        let mut questions = Vec::with_capacity(header.questions as usize);
        for _ in 0..header.questions {
            let (q, new_off) = Question::unpack(msg, off)?;
            questions.push(q);
            off = new_off;
        }

        let mut sections = [
            Vec::with_capacity(header.answers as usize),
            Vec::with_capacity(header.authorities as usize),
            Vec::with_capacity(header.additionals as usize),
        ];
        for (section, count) in sections
            .iter_mut()
            .zip([header.answers, header.authorities, header.additionals])
        {
            for _ in 0..count {
                let (r, new_off) = Resource::unpack(msg, off)?;
                section.push(r);
                off = new_off;
            }
        }
        let [answers, authorities, additionals] = sections;

        Ok(Message {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    // pack packs a full Message.
    pub(crate) fn pack(&mut self) -> Result<Vec<u8>> {
        self.append_pack(vec![])
    }

    // append_pack is like pack but appends the full Message to b and returns
    // the extended buffer.
    pub(crate) fn append_pack(&mut self, b: Vec<u8>) -> Result<Vec<u8>> {
        // It is very unlikely that anyone will try to pack more than 65535
        // of any particular section, but it is possible and we should fail
        // gracefully.
        if self.questions.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyQuestions);
        }
        if self.answers.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyAnswers);
        }
        if self.authorities.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyAuthorities);
        }
        if self.additionals.len() > u16::MAX as usize {
            return Err(Error::ErrTooManyAdditionals);
        }

        self.header.questions = self.questions.len() as u16;
        self.header.answers = self.answers.len() as u16;
        self.header.authorities = self.authorities.len() as u16;
        self.header.additionals = self.additionals.len() as u16;

        let mut msg = self.header.pack(b);

        for question in &self.questions {
            msg = question.pack(msg)?;
        }
        for answer in &mut self.answers {
            msg = answer.pack(msg)?;
        }
        for authority in &mut self.authorities {
            msg = authority.pack(msg)?;
        }
        for additional in &mut self.additionals {
            msg = additional.pack(msg)?;
        }

        Ok(msg)
    }
}
