//! Reference expression model for GARC archives.
//!
//! [`Ex`] is a reference-counted handle onto an immutable expression tree:
//! symbols, integers, sums, products, powers, indices, and a few tensor kinds
//! (Minkowski metric, Levi-Civita epsilon, Dirac gamma). It performs no
//! simplification; it exists so that archives have real expression kinds to
//! store and rebuild.
//!
//! [`registry`] returns a [`Registry`](garc_archive::Registry) with a factory
//! for every kind. Archived symbols are reconciled by name against the symbol
//! list passed in the unarchive context.

pub mod archiving;
pub mod ex;
pub mod symbol;

pub use archiving::{class, registry};
pub use ex::{Ex, Kind};
pub use symbol::Symbol;

/// Archive of reference-model expressions.
pub type ExArchive = garc_archive::Archive<Ex>;
