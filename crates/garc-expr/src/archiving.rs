//! Archive hooks for [`Ex`]: the `write` side of [`Expression`] and one
//! reconstruction factory per kind.

use garc_archive::{
    ArchiveError, ArchiveResult, Expression, InstanceKey, NodeReader, NodeWriter, Registry,
};
use std::rc::Rc;
use tracing::trace;

use crate::ex::{Ex, Kind};

/// Class tags written to each node's `class` property.
pub mod class {
    pub const SYMBOL: &str = "symbol";
    pub const INTEGER: &str = "integer";
    pub const ADD: &str = "add";
    pub const MUL: &str = "mul";
    pub const POWER: &str = "power";
    pub const IDX: &str = "idx";
    pub const MINKMETRIC: &str = "minkmetric";
    pub const TENSEPSILON: &str = "tensepsilon";
    pub const CLIFFORD: &str = "clifford";
}

impl Expression for Ex {
    fn class_name(&self) -> &str {
        match self.kind() {
            Kind::Symbol(_) => class::SYMBOL,
            Kind::Integer(_) => class::INTEGER,
            Kind::Add(_) => class::ADD,
            Kind::Mul(_) => class::MUL,
            Kind::Power { .. } => class::POWER,
            Kind::Idx { .. } => class::IDX,
            Kind::MinkMetric { .. } => class::MINKMETRIC,
            Kind::TensEpsilon { .. } => class::TENSEPSILON,
            Kind::Clifford { .. } => class::CLIFFORD,
        }
    }

    fn instance_key(&self) -> InstanceKey {
        InstanceKey::of(Rc::as_ptr(&self.0))
    }

    fn write(&self, node: &mut NodeWriter<'_, Self>) {
        match self.kind() {
            Kind::Symbol(s) => {
                node.add_string("name", s.name());
            }
            Kind::Integer(v) => {
                node.add_unsigned("value", v.unsigned_abs())
                    .add_bool("negative", *v < 0);
            }
            Kind::Add(ops) | Kind::Mul(ops) => {
                for op in ops {
                    node.add_ex("op", op);
                }
            }
            Kind::Power { basis, exponent } => {
                node.add_ex("basis", basis).add_ex("exponent", exponent);
            }
            Kind::Idx {
                value,
                dim,
                covariant,
            } => {
                node.add_ex("value", value)
                    .add_ex("dim", dim)
                    .add_bool("covariant", *covariant);
            }
            Kind::MinkMetric { indices, pos_sig } => {
                for index in indices {
                    node.add_ex("index", index);
                }
                node.add_bool("pos_sig", *pos_sig);
            }
            Kind::TensEpsilon {
                indices,
                minkowski,
                pos_sig,
            } => {
                for index in indices {
                    node.add_ex("index", index);
                }
                node.add_bool("minkowski", *minkowski)
                    .add_bool("pos_sig", *pos_sig);
            }
            Kind::Clifford { index, label } => {
                node.add_ex("index", index)
                    .add_unsigned("label", u64::from(*label));
            }
        }
    }
}

/// Registry with a factory for every [`Kind`].
pub fn registry() -> Registry<Ex> {
    Registry::new()
        .with(class::SYMBOL, unarchive_symbol)
        .with(class::INTEGER, unarchive_integer)
        .with(class::ADD, |n: &NodeReader<'_, Ex>| {
            Ok(Ex::add(n.find_all_ex("op")?))
        })
        .with(class::MUL, |n: &NodeReader<'_, Ex>| {
            Ok(Ex::mul(n.find_all_ex("op")?))
        })
        .with(class::POWER, |n: &NodeReader<'_, Ex>| {
            Ok(Ex::pow(n.require_ex("basis", 0)?, n.require_ex("exponent", 0)?))
        })
        .with(class::IDX, |n: &NodeReader<'_, Ex>| {
            let covariant = n.find_bool("covariant").unwrap_or(false);
            Ok(Ex::varidx(
                n.require_ex("value", 0)?,
                n.require_ex("dim", 0)?,
                covariant,
            ))
        })
        .with(class::MINKMETRIC, |n: &NodeReader<'_, Ex>| {
            let pos_sig = n.find_bool("pos_sig").unwrap_or(false);
            Ok(Ex::new(Kind::MinkMetric {
                indices: n.find_all_ex("index")?,
                pos_sig,
            }))
        })
        .with(class::TENSEPSILON, |n: &NodeReader<'_, Ex>| {
            let minkowski = n.find_bool("minkowski").unwrap_or(false);
            let pos_sig = n.find_bool("pos_sig").unwrap_or(false);
            Ok(Ex::epsilon(n.find_all_ex("index")?, minkowski, pos_sig))
        })
        .with(class::CLIFFORD, unarchive_clifford)
}

/// Symbols are matched by name against the caller's symbol list so that
/// unarchived expressions share variables with code that already holds them.
fn unarchive_symbol(n: &NodeReader<'_, Ex>) -> ArchiveResult<Ex> {
    let Some(name) = n.find_string("name") else {
        return Ok(Ex::anonymous_symbol());
    };
    let existing = n
        .symbols()
        .iter()
        .find(|s| s.as_symbol().is_some_and(|s| s.name() == name));
    if let Some(sym) = existing {
        trace!(node = %n.id(), name, "reusing caller symbol");
        return Ok(sym.clone());
    }
    Ok(Ex::symbol(name))
}

fn unarchive_integer(n: &NodeReader<'_, Ex>) -> ArchiveResult<Ex> {
    let magnitude = n.find_unsigned("value").ok_or_else(|| n.missing("value"))?;
    let negative = n.find_bool("negative").unwrap_or(false);
    let signed = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    let value = i64::try_from(signed).map_err(|_| {
        ArchiveError::Corrupt(format!("integer {signed} in node {} exceeds 64 bits", n.id()))
    })?;
    Ok(Ex::integer(value))
}

fn unarchive_clifford(n: &NodeReader<'_, Ex>) -> ArchiveResult<Ex> {
    let label = n.find_unsigned("label").unwrap_or(0);
    let label = u8::try_from(label).map_err(|_| {
        ArchiveError::Corrupt(format!("clifford label {label} in node {} exceeds 255", n.id()))
    })?;
    Ok(Ex::dirac_gamma(n.require_ex("index", 0)?, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use garc_archive::{Archive, Property, PropertyType, UnarchiveContext, ARCHIVE_VERSION};
    use garc_codec::encode_varint;

    fn round_trip(ar: &Archive<Ex>) -> Archive<Ex> {
        Archive::from_bytes(&ar.to_bytes().unwrap()).unwrap()
    }

    fn sample() -> (Ex, Ex, Ex) {
        let x = Ex::symbol("x");
        let y = Ex::symbol("y");
        let e = Ex::add(vec![
            Ex::pow(x.clone(), Ex::integer(2)),
            Ex::mul(vec![Ex::integer(-3), y.clone()]),
        ]);
        (x, y, e)
    }

    #[test]
    fn registry_covers_every_kind() {
        let reg = registry();
        assert_eq!(
            reg.tags(),
            vec![
                "add",
                "clifford",
                "idx",
                "integer",
                "minkmetric",
                "mul",
                "power",
                "symbol",
                "tensepsilon",
            ]
        );
    }

    #[test]
    fn shared_operand_round_trips_as_one_instance() {
        let x = Ex::symbol("x");
        let sum = Ex::add(vec![x.clone(), x.clone()]);
        let mut ar = Archive::new();
        ar.archive_ex(&sum, "e");
        let ar = round_trip(&ar);

        let reg = registry();
        let back = ar.unarchive_ex(UnarchiveContext::new(&reg), "e").unwrap();
        assert_eq!(back.nops(), 2);
        let (a, b) = (back.op(0).unwrap(), back.op(1).unwrap());
        assert!(a.is_same(b));
        // Not reconciled: a fresh symbol with the archived name.
        assert_eq!(a.as_symbol().unwrap().name(), "x");
        assert_ne!(a, &x);
    }

    #[test]
    fn value_equal_instances_get_separate_nodes() {
        let mut ar = Archive::new();
        ar.archive_ex(&Ex::add(vec![Ex::integer(7), Ex::integer(7)]), "e");
        // add + two integers; atoms are shared.
        assert_eq!(ar.nodes().len(), 3);
        let value_atoms = ar.atoms().iter().filter(|(_, a)| *a == "value").count();
        assert_eq!(value_atoms, 1);
    }

    #[test]
    fn same_named_symbols_share_an_atom_but_not_a_node() {
        let (a, b) = (Ex::symbol("x"), Ex::symbol("x"));
        let mut ar = Archive::new();
        let na = ar.archive_ex(&a, "a");
        let nb = ar.archive_ex(&b, "b");
        assert_ne!(na, nb);
        assert_eq!(ar.atoms().iter().filter(|(_, s)| *s == "x").count(), 1);
        assert_eq!(ar.archive_ex(&a.clone(), "again"), na);
    }

    #[test]
    fn symbols_reconcile_with_caller_list() {
        let (x, y, e) = sample();
        let mut ar = Archive::new();
        ar.archive_ex(&e, "e");
        let ar = round_trip(&ar);

        let reg = registry();
        let symbols = [x.clone()];
        let ctx = UnarchiveContext::new(&reg).with_symbols(&symbols);
        let back = ar.unarchive_ex(ctx, "e").unwrap();

        let power = back.op(0).unwrap();
        assert!(power.op(0).unwrap().is_same(&x));
        let product = back.op(1).unwrap();
        let y2 = product.op(1).unwrap();
        assert_eq!(y2.as_symbol().unwrap().name(), "y");
        assert_ne!(y2, &y);
    }

    #[test]
    fn structure_survives_reconciled_round_trip() {
        let (x, y, e) = sample();
        let mut ar = Archive::new();
        ar.archive_ex(&e, "e");
        let ar = round_trip(&ar);

        let reg = registry();
        let symbols = [x, y];
        let ctx = UnarchiveContext::new(&reg).with_symbols(&symbols);
        assert_eq!(ar.unarchive_ex(ctx, "e").unwrap(), e);
        assert_eq!(e.to_string(), "(x^2+-3*y)");
    }

    #[test]
    fn tensor_kinds_round_trip() {
        let mu = Ex::symbol("mu");
        let nu = Ex::symbol("nu");
        let dim = Ex::integer(4);
        let i_mu = Ex::varidx(mu.clone(), dim.clone(), false);
        let i_nu = Ex::varidx(nu.clone(), dim.clone(), true);
        let exprs = [
            Ex::lorentz_g(i_mu.clone(), i_nu.clone(), true),
            Ex::epsilon(vec![i_mu.clone(), i_nu.clone()], true, false),
            Ex::dirac_gamma(i_mu.clone(), 0),
            Ex::dirac_gamma(i_nu.clone(), 3),
        ];

        let mut ar = Archive::new();
        for (i, e) in exprs.iter().enumerate() {
            ar.archive_ex(e, &format!("t{i}"));
        }
        let ar = round_trip(&ar);

        let reg = registry();
        let symbols = [mu, nu];
        let ctx = UnarchiveContext::new(&reg).with_symbols(&symbols);
        let back: Vec<Ex> = (0..exprs.len())
            .map(|i| ar.unarchive_ex_by_index(ctx, i).unwrap())
            .collect();
        assert_eq!(back, exprs);
        // The index object is shared between the expressions that use it.
        assert!(back[0].op(0).unwrap().is_same(back[1].op(0).unwrap()));
        assert!(back[0].op(0).unwrap().is_same(back[2].op(0).unwrap()));
    }

    #[test]
    fn extreme_integers_round_trip() {
        let mut ar = Archive::new();
        for (i, v) in [0, -1, i64::MAX, i64::MIN].into_iter().enumerate() {
            ar.archive_ex(&Ex::integer(v), &format!("n{i}"));
        }
        let ar = round_trip(&ar);
        let reg = registry();
        let ctx = UnarchiveContext::new(&reg);
        for (i, v) in [0, -1, i64::MAX, i64::MIN].into_iter().enumerate() {
            let back = ar.unarchive_ex_by_index(ctx, i).unwrap();
            assert!(matches!(back.kind(), Kind::Integer(n) if *n == v));
        }
    }

    /// Single-root archive whose one node carries exactly `props`.
    fn hand_built(props: impl FnOnce(&mut Archive<Ex>) -> Vec<Property>) -> Archive<Ex> {
        let mut ar: Archive<Ex> = Archive::new();
        let props = props(&mut ar);
        let name = ar.atomize("e");

        let mut out = b"GARC".to_vec();
        encode_varint(&mut out, u64::from(ARCHIVE_VERSION));
        encode_varint(&mut out, ar.atoms().len() as u64);
        for (_, atom) in ar.atoms().iter() {
            out.extend_from_slice(atom.as_bytes());
            out.push(0);
        }
        for v in [1, u64::from(name), 0, 1, props.len() as u64] {
            encode_varint(&mut out, v);
        }
        for p in &props {
            let header = u64::from(p.kind.code()) | (u64::from(p.name) << PropertyType::BITS);
            encode_varint(&mut out, header);
            encode_varint(&mut out, p.value);
        }
        Archive::from_bytes(&out).unwrap()
    }

    #[test]
    fn missing_required_property_is_reported() {
        let ar = hand_built(|ar| {
            let class = ar.atomize("class");
            let power = ar.atomize("power");
            vec![Property::new(class, PropertyType::String, u64::from(power))]
        });
        let reg = registry();
        let err = ar.unarchive_ex(UnarchiveContext::new(&reg), "e").unwrap_err();
        assert!(
            matches!(
                &err,
                ArchiveError::MissingProperty { class, property }
                    if class == "power" && property == "basis"
            ),
            "{err}"
        );
    }

    #[test]
    fn anonymous_symbol_gets_generated_name() {
        let ar = hand_built(|ar| {
            let class = ar.atomize("class");
            let symbol = ar.atomize("symbol");
            vec![Property::new(class, PropertyType::String, u64::from(symbol))]
        });
        let reg = registry();
        let e = ar.unarchive_ex(UnarchiveContext::new(&reg), "e").unwrap();
        let sym = e.as_symbol().unwrap();
        assert_eq!(sym.name(), format!("symbol{}", sym.serial()));
    }

    #[test]
    fn oversized_clifford_label_is_corrupt() {
        let ar = hand_built(|ar| {
            let class = ar.atomize("class");
            let clifford = ar.atomize("clifford");
            let label = ar.atomize("label");
            vec![
                Property::new(class, PropertyType::String, u64::from(clifford)),
                Property::new(label, PropertyType::Unsigned, 256),
            ]
        });
        let reg = registry();
        let err = ar.unarchive_ex(UnarchiveContext::new(&reg), "e").unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(_)), "{err}");
    }

    #[test]
    fn forget_then_unarchive_builds_fresh_instances() {
        let (_, _, e) = sample();
        let mut ar = Archive::new();
        ar.archive_ex(&e, "e");
        let reg = registry();
        let ctx = UnarchiveContext::new(&reg);

        // Nodes written by archive_ex already carry their source expression.
        assert!(ar.unarchive_ex(ctx, "e").unwrap().is_same(&e));
        ar.forget();
        assert!(ar.nodes().iter().all(|(_, n)| !n.has_expression()));
        let first = ar.unarchive_ex(ctx, "e").unwrap();
        assert!(!first.is_same(&e));
        assert!(ar.unarchive_ex(ctx, "e").unwrap().is_same(&first));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exprs.garc");
        let (x, y, e) = sample();
        let mut ar = Archive::new();
        ar.archive_ex(&e, "poly");
        ar.archive_ex(&x, "x");
        ar.save(&path).unwrap();

        let loaded: Archive<Ex> = Archive::open(&path).unwrap();
        assert_eq!(loaded.num_expressions(), 2);
        let reg = registry();
        let symbols = [x.clone(), y];
        let ctx = UnarchiveContext::new(&reg).with_symbols(&symbols);
        let (name, back) = loaded.unarchive_ex_with_name(ctx, 0).unwrap();
        assert_eq!(name, "poly");
        assert_eq!(back, e);
        assert!(loaded.unarchive_ex(ctx, "x").unwrap().is_same(&x));
    }
}
