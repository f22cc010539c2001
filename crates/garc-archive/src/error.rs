//! Error types for archive construction, stream I/O, and reconstruction.

use garc_codec::CodecError;
use thiserror::Error;

use crate::ids::NodeId;

/// Errors that can occur while building, reading, or unarchiving an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The stream does not start with the `GARC` signature.
    #[error("not a GARC archive: expected signature \"GARC\", found {found:?}")]
    InvalidSignature {
        /// The four bytes actually found, lossily decoded.
        found: String,
    },

    /// The stream's format version lies outside the supported window.
    #[error(
        "archive version {found} cannot be read by this library \
         (supports versions {min} through {max})"
    )]
    UnsupportedVersion { found: u64, min: u32, max: u32 },

    /// No root carries the requested name.
    #[error("expression with name '{0}' not found in archive")]
    ExpressionNotFound(String),

    #[error("node id {id} out of range (archive has {len} nodes)")]
    NodeOutOfRange { id: u64, len: usize },

    #[error("atom id {id} out of range (archive has {len} atoms)")]
    AtomOutOfRange { id: u64, len: usize },

    #[error("expression index {index} out of range (archive has {len} expressions)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A node has no `class` string property.
    #[error("archive node {node} contains no class name")]
    MissingClass { node: NodeId },

    /// No factory is registered for a node's class tag.
    #[error("no unarchive function registered for class '{0}'")]
    UnknownClass(String),

    /// A factory needed a property the node does not carry.
    #[error("node of class '{class}' is missing required property '{property}'")]
    MissingProperty { class: String, property: String },

    #[error("invalid property type code {code}")]
    InvalidPropertyType { code: u8 },

    #[error("invalid atom: {0}")]
    InvalidAtom(String),

    /// The byte source ended before a field was complete.
    #[error("truncated archive stream while reading {0}")]
    Truncated(&'static str),

    /// The stream is well-formed at the byte level but structurally invalid.
    #[error("corrupt archive: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for ArchiveError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Truncated(what) => Self::Truncated(what),
            CodecError::Overflow => Self::Corrupt("varint overflow".into()),
            CodecError::Io(e) => Self::Io(e),
        }
    }
}

/// Convenience alias for archive results.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
