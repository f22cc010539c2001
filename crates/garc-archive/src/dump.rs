//! Diagnostic views of an archive: the raw text dump and a serializable
//! structural summary. Neither is part of the binary format.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::archive::Archive;
use crate::error::ArchiveResult;
use crate::ids::AtomId;
use crate::node::PropertyType;

/// Structural snapshot of an archive, suitable for JSON output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub version: u32,
    pub atoms: Vec<String>,
    pub expressions: Vec<RootSummary>,
    pub nodes: Vec<NodeSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSummary {
    pub index: usize,
    pub name: String,
    pub root: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: u32,
    pub cached: bool,
    pub properties: Vec<PropertySummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub name: String,
    pub kind: PropertyType,
    pub value: u64,
}

impl<E> Archive<E> {
    /// Structural summary with atom ids resolved to names.
    pub fn summary(&self) -> ArchiveResult<ArchiveSummary> {
        let expressions = self
            .roots
            .iter()
            .enumerate()
            .map(|(index, root)| {
                Ok(RootSummary {
                    index,
                    name: self.atoms.unatomize(root.name)?.to_owned(),
                    root: root.root.as_u32(),
                })
            })
            .collect::<ArchiveResult<Vec<_>>>()?;

        let nodes = self
            .nodes
            .iter()
            .map(|(id, node)| {
                let properties = node
                    .properties()
                    .iter()
                    .map(|p| {
                        Ok(PropertySummary {
                            name: self.atoms.unatomize(p.name)?.to_owned(),
                            kind: p.kind,
                            value: p.value,
                        })
                    })
                    .collect::<ArchiveResult<Vec<_>>>()?;
                Ok(NodeSummary {
                    id: id.as_u32(),
                    cached: node.has_expression(),
                    properties,
                })
            })
            .collect::<ArchiveResult<Vec<_>>>()?;

        Ok(ArchiveSummary {
            version: self.version,
            atoms: self.atoms.as_slice().to_vec(),
            expressions,
            nodes,
        })
    }
}

impl<E: fmt::Display> Archive<E> {
    /// Dump atoms, roots, and nodes in a raw line-oriented format.
    pub fn printraw<W: Write + ?Sized>(&self, out: &mut W) -> ArchiveResult<()> {
        writeln!(out, "Atoms:")?;
        for (id, atom) in self.atoms.iter() {
            writeln!(out, " {id} {atom}")?;
        }
        writeln!(out)?;

        writeln!(out, "Expressions:")?;
        for (index, root) in self.roots.iter().enumerate() {
            let name = self.atoms.unatomize(root.name)?;
            writeln!(out, " {index} \"{name}\" root node {}", root.root)?;
        }
        writeln!(out)?;

        writeln!(out, "Nodes:")?;
        for (id, node) in self.nodes.iter() {
            match node.cached() {
                Some(expr) => writeln!(out, " {id} (cached: {expr})")?,
                None => writeln!(out, " {id}")?,
            }
            for prop in node.properties() {
                let name = self.atoms.unatomize(prop.name)?;
                write!(out, "  {} \"{name}\" {}", prop.kind, prop.value)?;
                if prop.kind == PropertyType::String {
                    let value = self.atoms.unatomize(AtomId::from_value(prop.value)?)?;
                    write!(out, " \"{value}\"")?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// [`printraw`](Self::printraw) into a string.
    pub fn printraw_string(&self) -> ArchiveResult<String> {
        let mut buf = Vec::new();
        self.printraw(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
