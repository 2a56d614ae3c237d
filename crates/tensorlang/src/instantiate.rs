//! Storage declaration.
//!
//! A symbol receives storage at most once per namespace. Rank 0 symbols are
//! constants that stand for themselves; higher ranks get an [Array] of
//! component symbols shaped by a symmetry. A metric also stores its inverse
//! and determinant.

use crate::error::ErrorKind;
use crate::session::{Session, Value};
use crate::tensor::{self, Variance};
use indexedexp::{Array, Symmetry};
use symexpr::Expr;

/// The storage kind named in a `define` or `assign` directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Const,
    Metric,
    Permutation,
    Kronecker,
    Symmetric(Symmetry),
}

impl Storage {
    pub fn from_lexeme(lexeme: &str) -> Result<Storage, ErrorKind> {
        Ok(match lexeme {
            "const" => Storage::Const,
            "metric" => Storage::Metric,
            "permutation" => Storage::Permutation,
            "kronecker" => Storage::Kronecker,
            other => Storage::Symmetric(other.parse()?),
        })
    }
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Symmetric(Symmetry::none())
    }
}

/// Declares storage for `symbol` unless it already has some.
///
/// Returns the names that were given values, or [None] if the symbol was
/// already defined and nothing changed. Without retention, storage from an
/// earlier parse is allocated again.
pub(crate) fn instantiate(
    session: &mut Session,
    symbol: &str,
    storage: &Storage,
    dimension: Option<usize>,
) -> Result<Option<Vec<String>>, ErrorKind> {
    if session.namespace.contains_key(symbol)
        && (session.retention() || session.declared.contains(symbol))
    {
        return Ok(None);
    }
    let names = allocate(session, symbol, storage, dimension)?;
    session.declared.extend(names.iter().cloned());
    Ok(Some(names))
}

fn allocate(
    session: &mut Session,
    symbol: &str,
    storage: &Storage,
    dimension: Option<usize>,
) -> Result<Vec<String>, ErrorKind> {
    let rank = tensor::variance_of(symbol).len();
    if rank == 0 {
        session
            .namespace
            .insert(symbol.to_string(), Value::Constant(symbol.to_string()));
        return Ok(vec![symbol.to_string()]);
    }
    let dimension = dimension.ok_or_else(|| ErrorKind::DimensionRequired(symbol.to_string()))?;
    tracing::trace!(symbol, rank, dimension, "declaring storage");
    let array = match storage {
        Storage::Permutation => Array::from_fn(rank, dimension, |index| {
            Expr::integer(parity(index))
        }),
        Storage::Kronecker => {
            if rank != 2 {
                return Err(ErrorKind::InvalidRank {
                    construction: "instantiate kronecker delta of",
                    rank,
                });
            }
            Array::from_fn(rank, dimension, |index| {
                if index[0] == index[1] {
                    Expr::one()
                } else {
                    Expr::zero()
                }
            })
        }
        Storage::Metric => {
            if rank != 2 {
                return Err(ErrorKind::InvalidRank {
                    construction: "invert",
                    rank,
                });
            }
            let array = indexedexp::declare(symbol, rank, &Symmetry::symmetric(0, 1), dimension)?;
            session
                .namespace
                .insert(symbol.to_string(), Value::Array(array));
            return update_metric(session, symbol);
        }
        Storage::Const => indexedexp::declare(symbol, rank, &Symmetry::none(), dimension)?,
        Storage::Symmetric(symmetry) => indexedexp::declare(symbol, rank, symmetry, dimension)?,
    };
    session
        .namespace
        .insert(symbol.to_string(), Value::Array(array));
    Ok(vec![symbol.to_string()])
}

/// Recomputes the inverse and determinant of a metric from its current
/// components.
///
/// The inverse of `gDD` is stored as `gUU` and the other way round. The
/// determinant is stored as `gdet`; for an upper metric that is the
/// reciprocal of the determinant of the stored matrix.
pub(crate) fn update_metric(session: &mut Session, symbol: &str) -> Result<Vec<String>, ErrorKind> {
    let Some(Value::Array(array)) = session.namespace.get(symbol) else {
        return Err(ErrorKind::UndefinedTensor(symbol.to_string()));
    };
    if array.rank() != 2 {
        return Err(ErrorKind::InvalidRank {
            construction: "invert",
            rank: array.rank(),
        });
    }
    let (inverse, determinant) = indexedexp::symm_matrix_inverter(array)?;
    let determinant = match tensor::variance_of(symbol).first() {
        Some(Variance::Upper) => Expr::recip(determinant),
        _ => determinant,
    };
    let inverse_symbol = tensor::flip_variance(symbol);
    let determinant_symbol = format!("{}det", tensor::base_name(symbol));
    session
        .namespace
        .insert(inverse_symbol.clone(), Value::Array(inverse));
    session
        .namespace
        .insert(determinant_symbol.clone(), Value::Scalar(determinant));
    Ok(vec![symbol.to_string(), inverse_symbol, determinant_symbol])
}

// Sign of the permutation, or 0 if an index repeats.
fn parity(index: &[usize]) -> i64 {
    let mut inversions = 0;
    for (n, i) in index.iter().enumerate() {
        for j in &index[n + 1..] {
            if i == j {
                return 0;
            }
            if i > j {
                inversions += 1;
            }
        }
    }
    if inversions % 2 == 0 {
        1
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array<'a>(session: &'a Session, symbol: &str) -> &'a Array {
        session.get(symbol).and_then(Value::as_array).unwrap()
    }

    #[test]
    fn parities() {
        assert_eq!(parity(&[0, 1, 2]), 1);
        assert_eq!(parity(&[1, 0, 2]), -1);
        assert_eq!(parity(&[2, 0, 1]), 1);
        assert_eq!(parity(&[0, 0, 1]), 0);
    }

    #[test]
    fn storage_lexemes() {
        assert_eq!(Storage::from_lexeme("const"), Ok(Storage::Const));
        assert_eq!(
            Storage::from_lexeme("sym01"),
            Ok(Storage::Symmetric(Symmetry::symmetric(0, 1)))
        );
        assert_eq!(
            Storage::from_lexeme("sym0"),
            Err(ErrorKind::InvalidSymmetry("sym0".into()))
        );
    }

    #[test]
    fn scalar_is_constant() {
        let mut session = Session::new();
        let defined = instantiate(&mut session, "c", &Storage::Const, None).unwrap();
        assert_eq!(defined, Some(vec!["c".to_string()]));
        assert_eq!(session.get("c"), Some(&Value::Constant("c".into())));
    }

    #[test]
    fn second_declaration_keeps_storage() {
        let mut session = Session::new();
        instantiate(&mut session, "vU", &Storage::default(), Some(3)).unwrap();
        let before = session.get("vU").cloned();
        let defined = instantiate(&mut session, "vU", &Storage::default(), Some(4)).unwrap();
        assert_eq!(defined, None);
        assert_eq!(session.get("vU").cloned(), before);
    }

    #[test]
    fn without_retention_earlier_storage_is_reallocated() {
        let mut session = Session::new();
        session.set_retention(false);
        instantiate(&mut session, "vU", &Storage::default(), Some(3)).unwrap();
        let defined = instantiate(&mut session, "vU", &Storage::default(), Some(3)).unwrap();
        assert_eq!(defined, None);

        session.declared.clear();
        let defined = instantiate(&mut session, "vU", &Storage::default(), Some(2)).unwrap();
        assert_eq!(defined, Some(vec!["vU".to_string()]));
        let array = session.get("vU").and_then(Value::as_array).unwrap();
        assert_eq!(array.dimension(), 2);
    }

    #[test]
    fn dimension_is_required_above_rank_zero() {
        let mut session = Session::new();
        let err = instantiate(&mut session, "vU", &Storage::default(), None);
        assert_eq!(err, Err(ErrorKind::DimensionRequired("vU".into())));
    }

    #[test]
    fn levi_civita() {
        let mut session = Session::new();
        instantiate(&mut session, "epsilonDDD", &Storage::Permutation, Some(3)).unwrap();
        let epsilon = array(&session, "epsilonDDD");
        assert_eq!(epsilon.get(&[0, 1, 2]), Some(&Expr::one()));
        assert_eq!(epsilon.get(&[2, 1, 0]), Some(&Expr::integer(-1)));
        assert_eq!(epsilon.get(&[0, 0, 2]), Some(&Expr::zero()));
    }

    #[test]
    fn kronecker_delta() {
        let mut session = Session::new();
        instantiate(&mut session, "deltaUD", &Storage::Kronecker, Some(2)).unwrap();
        let delta = array(&session, "deltaUD");
        assert_eq!(delta.get(&[1, 1]), Some(&Expr::one()));
        assert_eq!(delta.get(&[0, 1]), Some(&Expr::zero()));
        let err = instantiate(&mut session, "deltaUDD", &Storage::Kronecker, Some(2));
        assert_eq!(
            err,
            Err(ErrorKind::InvalidRank {
                construction: "instantiate kronecker delta of",
                rank: 3
            })
        );
    }

    #[test]
    fn metric_stores_inverse_and_determinant() {
        let mut session = Session::new();
        let defined = instantiate(&mut session, "gDD", &Storage::Metric, Some(2)).unwrap();
        assert_eq!(
            defined,
            Some(vec!["gDD".to_string(), "gUU".to_string(), "gdet".to_string()])
        );
        let g = array(&session, "gDD");
        assert_eq!(g.get(&[0, 1]), g.get(&[1, 0]));
        assert!(session.get("gUU").and_then(Value::as_array).is_some());
        let det = session.get("gdet").and_then(Value::as_scalar).unwrap();
        assert_eq!(det.to_string(), "gDD00*gDD11 - gDD01^2");
    }

    #[test]
    fn metric_dimension_must_be_invertible() {
        let mut session = Session::new();
        let err = instantiate(&mut session, "gDD", &Storage::Metric, Some(5));
        assert_eq!(err, Err(ErrorKind::UnsupportedDimension(5)));
    }

    #[test]
    fn update_undefined_metric() {
        let mut session = Session::new();
        assert_eq!(
            update_metric(&mut session, "gDD"),
            Err(ErrorKind::UndefinedTensor("gDD".into()))
        );
    }
}
