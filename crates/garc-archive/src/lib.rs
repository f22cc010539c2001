//! Expression graph archive.
//!
//! Stores immutable, possibly shared expression graphs in a compact,
//! self-contained binary format and rebuilds them later with sharing intact.
//!
//! # Architecture
//!
//! - [`AtomTable`]: interns property names and string values; dedup by value
//! - [`Node`]: ordered typed properties plus a write-once expression cache
//! - [`NodeStore`]: dense node list; dedup by *instance identity*
//! - [`Archive`]: atoms, nodes, and named roots; archive/unarchive and stream I/O
//! - [`Registry`]: class tag -> reconstruction factory, passed per call
//!
//! Expression types plug in through the [`Expression`] trait (type tag,
//! identity, `write` hook) and through factories that read a [`NodeReader`].
//!
//! # Example
//!
//! ```ignore
//! let mut archive = Archive::new();
//! archive.archive_ex(&expr, "result");
//! let bytes = archive.to_bytes()?;
//!
//! let archive = Archive::from_bytes(&bytes)?;
//! let ctx = UnarchiveContext::new(&registry).with_symbols(&symbols);
//! let expr = archive.unarchive_ex(ctx, "result")?;
//! ```

pub mod archive;
pub mod atom;
pub mod dump;
pub mod error;
pub mod expression;
pub mod ids;
pub mod node;
pub mod reader;
pub mod registry;
pub mod store;
pub mod stream;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{Archive, Root};
pub use atom::AtomTable;
pub use dump::{ArchiveSummary, NodeSummary, PropertySummary, RootSummary};
pub use error::{ArchiveError, ArchiveResult};
pub use expression::Expression;
pub use ids::{AtomId, InstanceKey, NodeId};
pub use node::{Node, Property, PropertyType, CLASS_PROPERTY};
pub use reader::NodeReader;
pub use registry::{Registry, UnarchiveContext, UnarchiveFn};
pub use store::NodeStore;
pub use stream::{VersionWindow, ARCHIVE_AGE, ARCHIVE_SIGNATURE, ARCHIVE_VERSION};
pub use writer::NodeWriter;
