//! Binary stream format.
//!
//! ```text
//! signature:   "GARC"
//! version:     varint
//! atom_count:  varint, then atom_count NUL-terminated UTF-8 strings
//! expr_count:  varint, then expr_count × (name atom id, root node id)
//! node_count:  varint, then per node:
//!                prop_count, then prop_count × ((type | name << 3), value)
//! ```
//!
//! All integers are varints. Reading validates every id against the tables
//! it indexes and requires node references to point at earlier nodes, so a
//! successfully read archive can be unarchived without dangling ids or cycles.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use garc_codec::{read_cstr, read_varint, write_cstr, write_varint};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::archive::{Archive, Root};
use crate::atom::AtomTable;
use crate::error::{ArchiveError, ArchiveResult};
use crate::ids::{AtomId, NodeId};
use crate::node::{Node, Property, PropertyType};
use crate::store::NodeStore;

/// Leading signature of every archive stream.
pub const ARCHIVE_SIGNATURE: [u8; 4] = *b"GARC";

/// Format version written by this build.
pub const ARCHIVE_VERSION: u32 = 3;

/// How many versions back this build can still read.
pub const ARCHIVE_AGE: u32 = 1;

/// Upper bound on up-front allocation driven by counts read from a stream.
const PREALLOC_LIMIT: usize = 4096;

/// Inclusive range of format versions a reader accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionWindow {
    pub min: u32,
    pub max: u32,
}

impl VersionWindow {
    /// The window supported by this build.
    pub const fn current() -> Self {
        Self {
            min: ARCHIVE_VERSION - ARCHIVE_AGE,
            max: ARCHIVE_VERSION,
        }
    }

    pub fn contains(&self, version: u64) -> bool {
        u64::from(self.min) <= version && version <= u64::from(self.max)
    }
}

impl Default for VersionWindow {
    fn default() -> Self {
        Self::current()
    }
}

impl<E> Archive<E> {
    /// Serialize the archive. Node caches are not part of the format.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> ArchiveResult<()> {
        writer.write_all(&ARCHIVE_SIGNATURE)?;
        write_varint(writer, u64::from(ARCHIVE_VERSION))?;

        write_varint(writer, self.atoms.len() as u64)?;
        for (id, atom) in self.atoms.iter() {
            if atom.as_bytes().contains(&0) {
                return Err(ArchiveError::InvalidAtom(format!(
                    "atom {id} contains a NUL byte"
                )));
            }
            write_cstr(writer, atom.as_bytes())?;
        }

        write_varint(writer, self.roots.len() as u64)?;
        for root in &self.roots {
            write_varint(writer, root.name.into())?;
            write_varint(writer, root.root.into())?;
        }

        write_varint(writer, self.nodes.len() as u64)?;
        for (_, node) in self.nodes.iter() {
            let props = node.properties();
            write_varint(writer, props.len() as u64)?;
            for prop in props {
                write_varint(writer, prop.key())?;
                write_varint(writer, prop.value)?;
            }
        }
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> ArchiveResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        debug!(
            bytes = buf.len(),
            atoms = self.atoms.len(),
            nodes = self.nodes.len(),
            "archive serialized"
        );
        Ok(buf)
    }

    /// Write the archive to a file, replacing it if present.
    pub fn save(&self, path: &Path) -> ArchiveResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), "archive saved");
        Ok(())
    }

    /// Read a complete archive from `reader`.
    ///
    /// Either the whole archive is read and validated, or an error is
    /// returned; node caches of the result start empty.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> ArchiveResult<Self> {
        let mut signature = [0u8; 4];
        reader.read_exact(&mut signature).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ArchiveError::Truncated("signature"),
            _ => ArchiveError::Io(e),
        })?;
        if signature != ARCHIVE_SIGNATURE {
            return Err(ArchiveError::InvalidSignature {
                found: String::from_utf8_lossy(&signature).into_owned(),
            });
        }

        let found = read_varint(reader)?;
        let window = VersionWindow::current();
        let version = match u32::try_from(found) {
            Ok(version) if window.contains(found) => version,
            _ => {
                return Err(ArchiveError::UnsupportedVersion {
                    found,
                    min: window.min,
                    max: window.max,
                })
            }
        };

        let atom_count = read_count(reader)?;
        let mut atoms = Vec::with_capacity(atom_count.min(PREALLOC_LIMIT));
        for _ in 0..atom_count {
            let bytes = read_cstr(reader)?;
            let atom = String::from_utf8(bytes)
                .map_err(|e| ArchiveError::InvalidAtom(format!("atom is not UTF-8: {e}")))?;
            atoms.push(atom);
        }

        let root_count = read_count(reader)?;
        let mut roots = Vec::with_capacity(root_count.min(PREALLOC_LIMIT));
        for _ in 0..root_count {
            let name = atom_ref(read_varint(reader)?, atom_count)?;
            let root = NodeId::from_value(read_varint(reader)?)?;
            roots.push(Root { name, root });
        }

        let node_count = read_count(reader)?;
        let mut nodes = Vec::with_capacity(node_count.min(PREALLOC_LIMIT));
        for index in 0..node_count {
            nodes.push(read_node(reader, index, atom_count)?);
        }

        if let Some(root) = roots.iter().find(|r| r.root.index() >= node_count) {
            return Err(ArchiveError::NodeOutOfRange {
                id: root.root.into(),
                len: node_count,
            });
        }

        debug!(
            version,
            atoms = atom_count,
            expressions = root_count,
            nodes = node_count,
            "archive read"
        );
        Ok(Self::from_parts(
            version,
            AtomTable::from_atoms(atoms),
            NodeStore::from_nodes(nodes),
            roots,
        ))
    }

    pub fn from_bytes(mut data: &[u8]) -> ArchiveResult<Self> {
        Self::read_from(&mut data)
    }

    /// Read an archive from a file.
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let archive = Self::read_from(&mut reader)?;
        debug!(path = %path.display(), "archive opened");
        Ok(archive)
    }
}

fn read_count<R: Read + ?Sized>(reader: &mut R) -> ArchiveResult<usize> {
    let count = read_varint(reader)?;
    usize::try_from(count).map_err(|_| ArchiveError::Corrupt(format!("count {count} too large")))
}

fn atom_ref(value: u64, atom_count: usize) -> ArchiveResult<AtomId> {
    let id = AtomId::from_value(value)?;
    if id.index() >= atom_count {
        return Err(ArchiveError::AtomOutOfRange {
            id: value,
            len: atom_count,
        });
    }
    Ok(id)
}

fn read_node<R: Read + ?Sized, E>(
    reader: &mut R,
    index: usize,
    atom_count: usize,
) -> ArchiveResult<Node<E>> {
    let prop_count = read_count(reader)?;
    let mut props = Vec::with_capacity(prop_count.min(PREALLOC_LIMIT));
    for _ in 0..prop_count {
        let key = read_varint(reader)?;
        let value = read_varint(reader)?;

        let code = (key & 0b111) as u8;
        let kind =
            PropertyType::from_code(code).ok_or(ArchiveError::InvalidPropertyType { code })?;
        let name = atom_ref(key >> PropertyType::BITS, atom_count)?;
        match kind {
            PropertyType::String => {
                atom_ref(value, atom_count)?;
            }
            PropertyType::Node if value >= index as u64 => {
                return Err(ArchiveError::Corrupt(format!(
                    "node {index} references node {value}, which does not precede it"
                )));
            }
            _ => {}
        }
        props.push(Property::new(name, kind, value));
    }
    Ok(Node::from_properties(props))
}
