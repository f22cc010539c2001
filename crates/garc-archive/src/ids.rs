//! Dense identifiers used inside an archive.
//!
//! [`AtomId`] and [`NodeId`] are zero-based indices into the archive's atom
//! table and node store. They are assigned in insertion order and never reused
//! while the owning archive lives. [`InstanceKey`] identifies an in-memory
//! expression instance for identity deduplication.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from its raw value.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            /// Returns the id as a table index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Id of the entry that will be appended to a table of length `len`.
            ///
            /// # Panics
            ///
            /// Panics if `len` does not fit in 32 bits; ids would otherwise wrap
            /// onto existing entries.
            #[inline]
            pub(crate) fn from_index(len: usize) -> Self {
                match u32::try_from(len) {
                    Ok(raw) => Self(raw),
                    Err(_) => panic!("{} space exhausted at {len} entries", $what),
                }
            }

            /// Interpret a wire value as an id.
            pub(crate) fn from_value(value: u64) -> ArchiveResult<Self> {
                u32::try_from(value).map(Self).map_err(|_| {
                    ArchiveError::Corrupt(format!("{} {value} does not fit in 32 bits", $what))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                u64::from(id.0)
            }
        }
    };
}

dense_id!(
    /// Identifier of an interned string.
    AtomId,
    "atom id"
);

dense_id!(
    /// Identifier of a node in the node store.
    NodeId,
    "node id"
);

/// Identity of an in-memory expression instance.
///
/// Two handles yield the same key exactly when they refer to the same
/// allocation. Keys are only meaningful while the instance is alive; the
/// archive keeps every keyed instance alive in its node cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceKey(usize);

impl InstanceKey {
    /// Key for the allocation `ptr` points into.
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr as *const () as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn ids_are_ordered_by_raw_value() {
        assert!(NodeId::new(1) < NodeId::new(2));
        assert_eq!(AtomId::new(7).index(), 7);
        assert_eq!(u64::from(NodeId::new(9)), 9);
        assert_eq!(NodeId::new(3).to_string(), "3");
    }

    #[test]
    fn from_value_rejects_wide_ids() {
        assert_eq!(AtomId::from_value(5).unwrap(), AtomId::new(5));
        assert!(matches!(
            NodeId::from_value(u64::from(u32::MAX) + 1),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn from_index_covers_full_u32_range() {
        assert_eq!(NodeId::from_index(0), NodeId::new(0));
        assert_eq!(AtomId::from_index(u32::MAX as usize), AtomId::new(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "node id space exhausted")]
    fn from_index_refuses_to_wrap() {
        NodeId::from_index(u32::MAX as usize + 1);
    }

    #[test]
    fn instance_key_tracks_allocation_not_value() {
        let a = Rc::new(String::from("x"));
        let b = Rc::new(String::from("x"));
        let a2 = Rc::clone(&a);
        assert_eq!(InstanceKey::of(Rc::as_ptr(&a)), InstanceKey::of(Rc::as_ptr(&a2)));
        assert_ne!(InstanceKey::of(Rc::as_ptr(&a)), InstanceKey::of(Rc::as_ptr(&b)));
    }
}
