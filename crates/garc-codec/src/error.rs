use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The input ended before a value was complete.
    #[error("truncated input while reading {0}")]
    Truncated(&'static str),

    #[error("varint does not fit in 64 bits")]
    Overflow,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Map an I/O error from a read, turning EOF into [`CodecError::Truncated`].
    pub(crate) fn from_read(err: std::io::Error, what: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Truncated(what)
        } else {
            Self::Io(err)
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
