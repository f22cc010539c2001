//! Minimal two-kind expression type for exercising the archive in tests.

use std::fmt;
use std::rc::Rc;

use crate::{Expression, InstanceKey, NodeWriter, Registry};

#[derive(Clone, Debug)]
pub(crate) struct TestExpr(Rc<TestNode>);

#[derive(Debug)]
enum TestNode {
    Leaf(String),
    Pair(TestExpr, TestExpr),
}

impl TestExpr {
    pub(crate) fn leaf(label: &str) -> Self {
        Self(Rc::new(TestNode::Leaf(label.to_owned())))
    }

    pub(crate) fn pair(a: TestExpr, b: TestExpr) -> Self {
        Self(Rc::new(TestNode::Pair(a, b)))
    }

    pub(crate) fn label(&self) -> &str {
        match &*self.0 {
            TestNode::Leaf(label) => label,
            TestNode::Pair(..) => "",
        }
    }

    pub(crate) fn children(&self) -> (TestExpr, TestExpr) {
        match &*self.0 {
            TestNode::Pair(a, b) => (a.clone(), b.clone()),
            TestNode::Leaf(_) => panic!("leaf has no children"),
        }
    }

    pub(crate) fn same_instance(&self, other: &TestExpr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for TestExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            TestNode::Leaf(label) => f.write_str(label),
            TestNode::Pair(a, b) => write!(f, "({a}, {b})"),
        }
    }
}

impl Expression for TestExpr {
    fn class_name(&self) -> &str {
        match &*self.0 {
            TestNode::Leaf(_) => "leaf",
            TestNode::Pair(..) => "pair",
        }
    }

    fn instance_key(&self) -> InstanceKey {
        InstanceKey::of(Rc::as_ptr(&self.0))
    }

    fn write(&self, node: &mut NodeWriter<'_, Self>) {
        match &*self.0 {
            TestNode::Leaf(label) => {
                node.add_string("label", label);
            }
            TestNode::Pair(a, b) => {
                node.add_ex("op", a).add_ex("op", b);
            }
        }
    }
}

pub(crate) fn registry() -> Registry<TestExpr> {
    Registry::new()
        .with("leaf", |n| {
            let label = n.find_string("label").ok_or_else(|| n.missing("label"))?;
            Ok(TestExpr::leaf(label))
        })
        .with("pair", |n| {
            Ok(TestExpr::pair(n.require_ex("op", 0)?, n.require_ex("op", 1)?))
        })
}
