use std::io;
use std::num::ParseIntError;
use std::string::FromUtf8Error;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("connection closed")]
    ErrConnectionClosed,
    #[error("name must not be empty")]
    ErrNameEmpty,
    #[error("failed to parse IP address")]
    ErrFailedToParseIpaddr,
    #[error("label exceeds 63 octets")]
    ErrLabelTooLong,
    #[error("insufficient data for base length type")]
    ErrBaseLen,
    #[error("insufficient data for resource body length")]
    ErrResourceLen,
    #[error("resource length too long")]
    ErrResTooLong,
    #[error("nil resource body")]
    ErrNilResourceBody,
    #[error("too many Questions")]
    ErrTooManyQuestions,
    #[error("too many Answers")]
    ErrTooManyAnswers,
    #[error("too many Authorities")]
    ErrTooManyAuthorities,
    #[error("too many Additionals")]
    ErrTooManyAdditionals,
    #[error("character string exceeds maximum length (255)")]
    ErrStringTooLong,

    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}
