use crate::ids::InstanceKey;
use crate::writer::NodeWriter;

/// An expression type that can be stored in an [`Archive`](crate::Archive).
///
/// Implementations are cheap handles (typically reference counted) onto
/// immutable expression objects. The archive never inspects expression state
/// itself: it asks for a type tag, an identity, and a `write` hook that emits
/// properties. Reconstruction goes the other way through a
/// [`Registry`](crate::Registry).
pub trait Expression: Clone {
    /// Type tag stored as the node's `class` property and used to find the
    /// reconstruction factory.
    fn class_name(&self) -> &str;

    /// Identity of the underlying instance. Clones of one handle must return
    /// the same key; distinct instances must not, even when value-equal.
    fn instance_key(&self) -> InstanceKey;

    /// Emit this expression's state into `node`. The `class` property has
    /// already been written.
    fn write(&self, node: &mut NodeWriter<'_, Self>);
}
