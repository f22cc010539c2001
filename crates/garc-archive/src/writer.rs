use crate::archive::Archive;
use crate::expression::Expression;
use crate::ids::AtomId;
use crate::node::{Property, PropertyType};

/// Property sink handed to [`Expression::write`].
///
/// Names and string values are interned in the archive's atom table; nested
/// expressions are archived recursively and referenced by node id.
pub struct NodeWriter<'a, E> {
    archive: &'a mut Archive<E>,
    props: Vec<Property>,
}

impl<'a, E: Expression> NodeWriter<'a, E> {
    pub(crate) fn new(archive: &'a mut Archive<E>) -> Self {
        Self {
            archive,
            props: Vec::new(),
        }
    }

    pub fn add_bool(&mut self, name: &str, value: bool) -> &mut Self {
        let name = self.archive.atomize(name);
        self.push(name, PropertyType::Bool, u64::from(value))
    }

    pub fn add_unsigned(&mut self, name: &str, value: u64) -> &mut Self {
        let name = self.archive.atomize(name);
        self.push(name, PropertyType::Unsigned, value)
    }

    pub fn add_string(&mut self, name: &str, value: &str) -> &mut Self {
        let name = self.archive.atomize(name);
        let atom = self.archive.atomize(value);
        self.push(name, PropertyType::String, atom.into())
    }

    /// Archive `value` (or reuse its node if this instance is already
    /// archived) and reference it under `name`.
    pub fn add_ex(&mut self, name: &str, value: &E) -> &mut Self {
        let name = self.archive.atomize(name);
        let id = self.archive.archive_node(value);
        self.push(name, PropertyType::Node, id.into())
    }

    /// Properties written so far.
    pub fn properties(&self) -> &[Property] {
        &self.props
    }

    pub(crate) fn into_properties(self) -> Vec<Property> {
        self.props
    }

    fn push(&mut self, name: AtomId, kind: PropertyType, value: u64) -> &mut Self {
        self.props.push(Property::new(name, kind, value));
        self
    }
}
