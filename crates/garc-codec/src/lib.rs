//! Wire primitives for the GARC expression archive format.
//!
//! Every numeric field of an archive (counts, ids, property keys and values)
//! is a base-128 varint; atoms are NUL-terminated byte strings. Nothing else
//! appears on the wire.
//!
//! # Varint layout
//!
//! Seven bits per byte, least-significant group first. Every byte except the
//! last has its top bit set:
//!
//! | value    | bytes          |
//! |----------|----------------|
//! | `0x00`   | `00`           |
//! | `0x7f`   | `7f`           |
//! | `0x80`   | `80 01`        |
//! | `0x3fff` | `ff 7f`        |
//! | `0x4000` | `80 80 01`     |

pub mod error;
pub mod string;
pub mod varint;

pub use error::{CodecError, CodecResult};
pub use string::{read_cstr, write_cstr};
pub use varint::{decode_varint, encode_varint, encoded_len, read_varint, write_varint};
