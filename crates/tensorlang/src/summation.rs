//! Implied summation.
//!
//! An indexed assignment is compiled into a [Summation]: the free indices of
//! the left-hand side, and for every additive term of the right-hand side the
//! indices bound in that term. An index is bound when it appears exactly twice
//! in a term, once upper and once lower. Every other repeated index is an
//! error, and every term must have the same free indices as the left-hand
//! side.
//!
//! Evaluation walks the free index ranges, sums each term over its bound
//! index ranges, and replaces tensor references with the stored components.

use crate::error::ErrorKind;
use crate::session::{Session, Value};
use crate::tensor::{self, Index, Tensor, Variance, TENSOR};
use indexedexp::Array;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use symexpr::Expr;

type Binding = HashMap<String, usize>;

/// A compiled indexed assignment.
#[derive(Debug)]
pub(crate) struct Summation {
    lhs: Tensor,
    free: Vec<(String, Range<usize>)>,
    terms: Vec<Term>,
    dimension: Option<usize>,
}

#[derive(Debug)]
struct Term {
    expr: Expr,
    bound: Vec<(String, Range<usize>)>,
}

impl Summation {
    /// Checks the index structure of `lhs = rhs` and resolves index ranges.
    ///
    /// `rhs` should already be expanded so that every term is a product.
    pub(crate) fn compile(lhs: &Tensor, rhs: &Expr, session: &Session) -> Result<Summation, ErrorKind> {
        let mut expected: Vec<(String, Variance)> = vec![];
        for (index, variance) in &lhs.indexing {
            if let Index::Letter(letter) = index {
                if !expected.iter().any(|(l, _)| l == letter) {
                    expected.push((letter.clone(), *variance));
                }
            }
        }
        let terms: Vec<&Expr> = match rhs {
            Expr::Add(terms) => terms.iter().collect(),
            _ if rhs.is_zero() => vec![],
            _ => vec![rhs],
        };
        let mut classified = vec![];
        for term in terms {
            let mut occurrences = vec![];
            collect(term, 1, &session.basis, &mut occurrences)?;
            let (free, bound) = classify(&occurrences)?;
            let mut want = expected.clone();
            want.sort();
            if free != want {
                return Err(ErrorKind::UnbalancedFreeIndex {
                    expected: describe(&want),
                    found: describe(&free),
                });
            }
            classified.push((term.clone(), bound));
        }
        let existing = session
            .namespace
            .get(&lhs.symbol)
            .and_then(Value::as_array)
            .filter(|array| array.rank() == lhs.rank())
            .map(Array::dimension);
        let used_ranges = || {
            classified
                .iter()
                .flat_map(|(_, bound)| bound.iter())
                .chain(expected.iter().map(|(letter, _)| letter))
                .filter_map(|letter| session.ranges.get(letter))
                .map(|(_, stop)| *stop)
                .max()
        };
        let dimension = session
            .dimension
            .or(existing)
            .or((!session.basis.is_empty()).then_some(session.basis.len()))
            .or_else(used_ranges);
        let range = |letter: &str| -> Result<Range<usize>, ErrorKind> {
            match session.ranges.get(letter) {
                Some((start, stop)) => Ok(*start..*stop),
                None => dimension
                    .map(|dimension| 0..dimension)
                    .ok_or_else(|| ErrorKind::DimensionRequired(lhs.symbol.clone())),
            }
        };
        let free = expected
            .iter()
            .map(|(letter, _)| Ok((letter.clone(), range(letter)?)))
            .collect::<Result<_, ErrorKind>>()?;
        let terms = classified
            .into_iter()
            .map(|(expr, bound)| {
                let bound = bound
                    .into_iter()
                    .map(|letter| {
                        let range = range(&letter)?;
                        Ok((letter, range))
                    })
                    .collect::<Result<_, ErrorKind>>()?;
                Ok(Term { expr, bound })
            })
            .collect::<Result<_, ErrorKind>>()?;
        Ok(Summation {
            lhs: lhs.clone(),
            free,
            terms,
            dimension,
        })
    }

    /// Evaluates the summation against the session's storage.
    ///
    /// Components of existing storage with the same rank and dimension are
    /// kept unless the left-hand side overwrites them.
    pub(crate) fn evaluate(&self, session: &Session) -> Result<Value, ErrorKind> {
        let rank = self.lhs.rank();
        if rank == 0 {
            return Ok(Value::Scalar(self.sum(&Binding::new(), session)?));
        }
        let dimension = self
            .dimension
            .ok_or_else(|| ErrorKind::DimensionRequired(self.lhs.symbol.clone()))?;
        let mut array = match session.namespace.get(&self.lhs.symbol) {
            Some(Value::Array(array)) if array.rank() == rank && array.dimension() == dimension => {
                array.clone()
            }
            _ => Array::zeros(rank, dimension),
        };
        let mut binding = Binding::new();
        for_each_binding(&self.free, &mut binding, &mut |binding| {
            let index = self
                .lhs
                .indices()
                .map(|index| match index {
                    Index::Fixed(n) => *n,
                    Index::Letter(letter) => binding.get(letter).copied().unwrap_or_default(),
                })
                .collect::<Vec<_>>();
            let value = self.sum(binding, session)?;
            array
                .set(&index, value)
                .map_err(|_| ErrorKind::IndexOutOfRange {
                    symbol: self.lhs.symbol.clone(),
                    index,
                })
        })?;
        Ok(Value::Array(array))
    }

    // Sum of every term at one assignment of the free indices.
    fn sum(&self, free: &Binding, session: &Session) -> Result<Expr, ErrorKind> {
        let mut values = vec![];
        for term in &self.terms {
            let mut binding = free.clone();
            for_each_binding(&term.bound, &mut binding, &mut |binding| {
                values.push(substitute(&term.expr, binding, session)?);
                Ok(())
            })?;
        }
        Ok(Expr::add(values))
    }
}

// Collects the index letters of a term with their variance. A tensor raised to
// a positive integer power contributes its indices once per factor.
fn collect(
    expr: &Expr,
    multiplicity: usize,
    basis: &[String],
    out: &mut Vec<(String, Variance)>,
) -> Result<(), ErrorKind> {
    match expr {
        Expr::Apply(name, _) if name == TENSOR => {
            if let Some(tensor) = Tensor::from_node(expr) {
                for (index, variance) in &tensor.indexing {
                    if let Index::Letter(letter) = index {
                        for _ in 0..multiplicity {
                            out.push((letter.clone(), *variance));
                        }
                    }
                }
            }
        }
        Expr::Pow(base, exponent) => {
            match exponent
                .as_number()
                .and_then(|n| n.as_integer())
                .filter(|n| *n > 0)
            {
                Some(n) => collect(base, multiplicity * n as usize, basis, out)?,
                None => {
                    collect(base, multiplicity, basis, out)?;
                    collect(exponent, multiplicity, basis, out)?;
                }
            }
        }
        Expr::Derivative(inner, variables) => {
            collect(inner, multiplicity, basis, out)?;
            for variable in variables {
                if basis.contains(variable) {
                    continue;
                }
                if basis.is_empty() {
                    return Err(ErrorKind::NoBasis);
                }
                for _ in 0..multiplicity {
                    out.push((variable.clone(), Variance::Lower));
                }
            }
        }
        Expr::Add(children) | Expr::Mul(children) | Expr::Apply(_, children) => {
            for child in children {
                collect(child, multiplicity, basis, out)?;
            }
        }
        Expr::Func(_, arg) => collect(arg, multiplicity, basis, out)?,
        Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => {}
    }
    Ok(())
}

// Splits the index occurrences of a term into sorted free indices and bound
// letters.
fn classify(
    occurrences: &[(String, Variance)],
) -> Result<(Vec<(String, Variance)>, Vec<String>), ErrorKind> {
    let mut letters: Vec<&String> = occurrences.iter().map(|(letter, _)| letter).collect();
    letters.sort();
    letters.dedup();
    let mut free = vec![];
    let mut bound = vec![];
    for letter in letters {
        let variances: Vec<Variance> = occurrences
            .iter()
            .filter(|(l, _)| l == letter)
            .map(|(_, variance)| *variance)
            .collect();
        match variances.as_slice() {
            [variance] => free.push((letter.clone(), *variance)),
            [a, b] if a != b => bound.push(letter.clone()),
            _ => return Err(ErrorKind::IllegalBoundIndex(letter.clone())),
        }
    }
    Ok((free, bound))
}

fn describe(indices: &[(String, Variance)]) -> String {
    if indices.is_empty() {
        return "none".to_string();
    }
    indices
        .iter()
        .map(|(letter, variance)| match variance {
            Variance::Upper => format!("^{letter}"),
            Variance::Lower => format!("_{letter}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Calls `f` with every assignment of values to the indices.
fn for_each_binding<F>(
    indices: &[(String, Range<usize>)],
    binding: &mut Binding,
    f: &mut F,
) -> Result<(), ErrorKind>
where
    F: FnMut(&Binding) -> Result<(), ErrorKind>,
{
    let Some(((letter, range), rest)) = indices.split_first() else {
        return f(binding);
    };
    for value in range.clone() {
        binding.insert(letter.clone(), value);
        for_each_binding(rest, binding, f)?;
    }
    binding.remove(letter);
    Ok(())
}

// Replaces tensor references with stored components and evaluates
// derivatives against the basis.
fn substitute(expr: &Expr, binding: &Binding, session: &Session) -> Result<Expr, ErrorKind> {
    expr.try_map(&mut |e| {
        if let Some(symbol) = tensor::constant_of(e) {
            return Ok(Some(Expr::symbol(symbol)));
        }
        if let Some(tensor) = Tensor::from_node(e) {
            return component(&tensor, binding, session).map(Some);
        }
        if let Expr::Derivative(inner, variables) = e {
            let mut result = substitute(inner, binding, session)?;
            for variable in variables {
                let coordinate = if session.basis.contains(variable) {
                    variable.as_str()
                } else {
                    let value = binding
                        .get(variable)
                        .copied()
                        .ok_or(ErrorKind::NoBasis)?;
                    session
                        .basis
                        .get(value)
                        .map(String::as_str)
                        .ok_or_else(|| ErrorKind::IndexOutOfRange {
                            symbol: "basis".to_string(),
                            index: vec![value],
                        })?
                };
                result = result.diff(coordinate);
            }
            return Ok(Some(result));
        }
        Ok(None)
    })
}

fn component(tensor: &Tensor, binding: &Binding, session: &Session) -> Result<Expr, ErrorKind> {
    let index = tensor
        .indices()
        .map(|index| match index {
            Index::Fixed(n) => Ok(*n),
            Index::Letter(letter) => binding
                .get(letter)
                .copied()
                .ok_or_else(|| ErrorKind::IllegalBoundIndex(letter.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let out_of_range = || ErrorKind::IndexOutOfRange {
        symbol: tensor.symbol.clone(),
        index: index.clone(),
    };
    match session.namespace.get(&tensor.symbol) {
        Some(Value::Array(array)) => array.get(&index).cloned().ok_or_else(out_of_range),
        Some(Value::Scalar(expr)) if index.is_empty() => Ok(expr.clone()),
        Some(Value::Scalar(_)) => Err(out_of_range()),
        Some(Value::Constant(symbol)) => Ok(Expr::symbol(symbol.as_str())),
        None if index.is_empty() => Ok(Expr::symbol(tensor.symbol.as_str())),
        None => Err(ErrorKind::MissingStorage(tensor.symbol.clone())),
    }
}

// Renders a term with tensor references in array form.
fn code(expr: &Expr) -> Expr {
    expr.map(&mut |e| {
        if let Some(symbol) = tensor::constant_of(e) {
            return Some(Expr::symbol(symbol));
        }
        Tensor::from_node(e).map(|tensor| Expr::symbol(tensor.array_format()))
    })
}

impl fmt::Display for Summation {
    /// Host code for the summation, e.g.
    /// `vU[a] = [sum(gUU[a][b]*wD[b] for b in range(0, 3)) for a in range(0, 3)]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rhs = self
            .terms
            .iter()
            .map(|term| {
                let mut text = code(&term.expr).to_string();
                for (letter, range) in term.bound.iter().rev() {
                    text = format!(
                        "sum({text} for {letter} in range({}, {}))",
                        range.start, range.end
                    );
                }
                text
            })
            .collect::<Vec<_>>()
            .join(" + ");
        if rhs.is_empty() {
            rhs = "0".to_string();
        }
        for (letter, range) in self.free.iter().rev() {
            rhs = format!(
                "[{rhs} for {letter} in range({}, {})]",
                range.start, range.end
            );
        }
        write!(f, "{} = {rhs}", self.lhs.array_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instantiate::{instantiate, Storage};

    fn reference(symbol: &str, indices: &[&str]) -> Expr {
        Tensor::new(
            symbol,
            indices.iter().map(|index| Index::letter(*index)).collect(),
        )
        .to_node()
    }

    fn lhs(symbol: &str, indices: &[&str]) -> Tensor {
        Tensor::new(symbol, indices.iter().map(|index| Index::letter(*index)).collect())
    }

    fn session() -> Session {
        let mut session = Session::new();
        session.dimension = Some(3);
        instantiate(&mut session, "gUU", &Storage::Metric, Some(3)).unwrap();
        instantiate(&mut session, "wD", &Storage::default(), Some(3)).unwrap();
        session
    }

    #[test]
    fn contraction() {
        let session = session();
        let rhs = reference("gUU", &["a", "b"]) * reference("wD", &["b"]);
        let summation = Summation::compile(&lhs("vU", &["a"]), &rhs, &session).unwrap();
        assert_eq!(
            summation.to_string(),
            "vU[a] = [sum(gUU[a][b]*wD[b] for b in range(0, 3)) for a in range(0, 3)]"
        );
        let Value::Array(v) = summation.evaluate(&session).unwrap() else {
            panic!("expected an array");
        };
        let want = Expr::add(
            (0..3)
                .map(|b| {
                    let g = session.get("gUU").and_then(Value::as_array).unwrap();
                    g.get(&[1, b]).unwrap().clone() * Expr::symbol(format!("wD{b}"))
                })
                .collect(),
        );
        assert_eq!(v.get(&[1]), Some(&want));
    }

    #[test]
    fn illegal_bound_index() {
        let session = session();
        let rhs = reference("wD", &["b"]) * reference("wD", &["b"]);
        let err = Summation::compile(&lhs("s", &[]), &rhs, &session).unwrap_err();
        assert_eq!(err, ErrorKind::IllegalBoundIndex("b".into()));
    }

    #[test]
    fn squared_reference_repeats_its_indices() {
        let session = session();
        let rhs = Expr::pow(reference("wD", &["b"]), Expr::integer(2));
        let err = Summation::compile(&lhs("s", &[]), &rhs, &session).unwrap_err();
        assert_eq!(err, ErrorKind::IllegalBoundIndex("b".into()));
    }

    #[test]
    fn unbalanced_free_index() {
        let session = session();
        let rhs = reference("gUU", &["i", "j"]) * reference("wD", &["j"]) + reference("wD", &["i"]);
        let err = Summation::compile(&lhs("vD", &["i"]), &rhs, &session).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::UnbalancedFreeIndex {
                expected: "_i".into(),
                found: "^i".into(),
            }
        );
    }

    #[test]
    fn index_ranges_come_from_the_session() {
        let mut session = session();
        session.ranges.insert("a".into(), (1, 3));
        let rhs = reference("wD", &["a"]);
        let summation = Summation::compile(&lhs("uD", &["a"]), &rhs, &session).unwrap();
        assert_eq!(summation.to_string(), "uD[a] = [wD[a] for a in range(1, 3)]");
        let Value::Array(u) = summation.evaluate(&session).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(u.get(&[0]), Some(&Expr::zero()));
        assert_eq!(u.get(&[2]), Some(&Expr::symbol("wD2")));
    }

    #[test]
    fn derivative_without_basis() {
        let session = session();
        let rhs = Expr::derivative(reference("wD", &["b"]), vec!["a".into()]);
        let err = Summation::compile(&lhs("uDD", &["b", "a"]), &rhs, &session).unwrap_err();
        assert_eq!(err, ErrorKind::NoBasis);
    }

    #[test]
    fn derivative_against_basis() {
        let mut session = Session::new();
        session.basis = vec!["x".into(), "y".into()];
        session.ranges.clear();
        session.namespace.insert(
            "f".into(),
            Value::Scalar(Expr::symbol("x") * Expr::symbol("y")),
        );
        let rhs = Expr::derivative(reference("f", &[]), vec!["i".into()]);
        let summation = Summation::compile(&lhs("TD", &["i"]), &rhs, &session).unwrap();
        let Value::Array(t) = summation.evaluate(&session).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(t.get(&[0]), Some(&Expr::symbol("y")));
        assert_eq!(t.get(&[1]), Some(&Expr::symbol("x")));
    }

    #[test]
    fn missing_storage() {
        let session = session();
        let rhs = reference("uD", &["a"]);
        let summation = Summation::compile(&lhs("vD", &["a"]), &rhs, &session).unwrap();
        assert_eq!(
            summation.evaluate(&session),
            Err(ErrorKind::MissingStorage("uD".into()))
        );
    }
}
