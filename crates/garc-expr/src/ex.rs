//! The expression handle and its kinds.

use std::fmt;
use std::rc::Rc;

use crate::symbol::Symbol;

/// Shared handle onto an immutable expression.
///
/// Cloning is cheap and keeps the same instance: [`Ex::is_same`] tells
/// instances apart, `==` compares structure.
#[derive(Clone, Debug)]
pub struct Ex(pub(crate) Rc<Kind>);

#[derive(Debug)]
pub enum Kind {
    Symbol(Symbol),
    Integer(i64),
    Add(Vec<Ex>),
    Mul(Vec<Ex>),
    Power {
        basis: Ex,
        exponent: Ex,
    },
    /// Tensor index with a value and a dimension. Variance is ignored unless
    /// the index is used in a Minkowski context.
    Idx {
        value: Ex,
        dim: Ex,
        covariant: bool,
    },
    MinkMetric {
        indices: Vec<Ex>,
        pos_sig: bool,
    },
    TensEpsilon {
        indices: Vec<Ex>,
        minkowski: bool,
        pos_sig: bool,
    },
    /// Dirac gamma matrix; `label` separates independent Clifford algebras.
    Clifford {
        index: Ex,
        label: u8,
    },
}

impl Ex {
    pub fn new(kind: Kind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(Kind::Symbol(Symbol::new(name)))
    }

    pub fn anonymous_symbol() -> Self {
        Self::new(Kind::Symbol(Symbol::anonymous()))
    }

    pub fn integer(value: i64) -> Self {
        Self::new(Kind::Integer(value))
    }

    pub fn add(ops: Vec<Ex>) -> Self {
        Self::new(Kind::Add(ops))
    }

    pub fn mul(ops: Vec<Ex>) -> Self {
        Self::new(Kind::Mul(ops))
    }

    pub fn pow(basis: Ex, exponent: Ex) -> Self {
        Self::new(Kind::Power { basis, exponent })
    }

    /// Contravariant index.
    pub fn idx(value: Ex, dim: Ex) -> Self {
        Self::varidx(value, dim, false)
    }

    pub fn varidx(value: Ex, dim: Ex, covariant: bool) -> Self {
        Self::new(Kind::Idx {
            value,
            dim,
            covariant,
        })
    }

    /// Minkowski metric with two indices.
    pub fn lorentz_g(i1: Ex, i2: Ex, pos_sig: bool) -> Self {
        Self::new(Kind::MinkMetric {
            indices: vec![i1, i2],
            pos_sig,
        })
    }

    pub fn epsilon(indices: Vec<Ex>, minkowski: bool, pos_sig: bool) -> Self {
        Self::new(Kind::TensEpsilon {
            indices,
            minkowski,
            pos_sig,
        })
    }

    pub fn dirac_gamma(index: Ex, label: u8) -> Self {
        Self::new(Kind::Clifford { index, label })
    }

    pub fn kind(&self) -> &Kind {
        &self.0
    }

    /// True if both handles refer to the same instance.
    pub fn is_same(&self, other: &Ex) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.kind() {
            Kind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Direct sub-expressions in archive order.
    pub fn ops(&self) -> Vec<&Ex> {
        match self.kind() {
            Kind::Symbol(_) | Kind::Integer(_) => Vec::new(),
            Kind::Add(ops) | Kind::Mul(ops) => ops.iter().collect(),
            Kind::Power { basis, exponent } => vec![basis, exponent],
            Kind::Idx { value, dim, .. } => vec![value, dim],
            Kind::MinkMetric { indices, .. } | Kind::TensEpsilon { indices, .. } => {
                indices.iter().collect()
            }
            Kind::Clifford { index, .. } => vec![index],
        }
    }

    pub fn nops(&self) -> usize {
        self.ops().len()
    }

    pub fn op(&self, i: usize) -> Option<&Ex> {
        self.ops().get(i).copied()
    }
}

impl PartialEq for Ex {
    fn eq(&self, other: &Self) -> bool {
        if self.is_same(other) {
            return true;
        }
        match (self.kind(), other.kind()) {
            (Kind::Symbol(a), Kind::Symbol(b)) => a == b,
            (Kind::Integer(a), Kind::Integer(b)) => a == b,
            (Kind::Add(a), Kind::Add(b)) | (Kind::Mul(a), Kind::Mul(b)) => a == b,
            (
                Kind::Power {
                    basis: b1,
                    exponent: e1,
                },
                Kind::Power {
                    basis: b2,
                    exponent: e2,
                },
            ) => b1 == b2 && e1 == e2,
            (
                Kind::Idx {
                    value: v1,
                    dim: d1,
                    covariant: c1,
                },
                Kind::Idx {
                    value: v2,
                    dim: d2,
                    covariant: c2,
                },
            ) => v1 == v2 && d1 == d2 && c1 == c2,
            (
                Kind::MinkMetric {
                    indices: i1,
                    pos_sig: p1,
                },
                Kind::MinkMetric {
                    indices: i2,
                    pos_sig: p2,
                },
            ) => i1 == i2 && p1 == p2,
            (
                Kind::TensEpsilon {
                    indices: i1,
                    minkowski: m1,
                    pos_sig: p1,
                },
                Kind::TensEpsilon {
                    indices: i2,
                    minkowski: m2,
                    pos_sig: p2,
                },
            ) => i1 == i2 && m1 == m2 && p1 == p2,
            (
                Kind::Clifford {
                    index: i1,
                    label: l1,
                },
                Kind::Clifford {
                    index: i2,
                    label: l2,
                },
            ) => i1 == i2 && l1 == l2,
            _ => false,
        }
    }
}

impl Eq for Ex {}

impl fmt::Display for Ex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Symbol(s) => write!(f, "{s}"),
            Kind::Integer(v) => write!(f, "{v}"),
            Kind::Add(ops) if ops.is_empty() => f.write_str("0"),
            Kind::Add(ops) => {
                f.write_str("(")?;
                write_joined(f, ops, "+")?;
                f.write_str(")")
            }
            Kind::Mul(ops) if ops.is_empty() => f.write_str("1"),
            Kind::Mul(ops) => write_joined(f, ops, "*"),
            Kind::Power { basis, exponent } => write!(f, "{basis}^{exponent}"),
            Kind::Idx {
                value, covariant, ..
            } => {
                let marker = if *covariant { '.' } else { '~' };
                write!(f, "{marker}{value}")
            }
            Kind::MinkMetric { indices, .. } => {
                f.write_str("eta")?;
                write_joined(f, indices, "")
            }
            Kind::TensEpsilon { indices, .. } => {
                f.write_str("eps")?;
                write_joined(f, indices, "")
            }
            Kind::Clifford { index, label: 0 } => write!(f, "gamma{index}"),
            Kind::Clifford { index, label } => write!(f, "gamma[{label}]{index}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, ops: &[Ex], sep: &str) -> fmt::Result {
    for (i, op) in ops.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{op}")?;
    }
    Ok(())
}
