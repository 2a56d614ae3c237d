use crate::{Array, Error};
use std::str::FromStr;
use symexpr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    Symmetric,
    Antisymmetric,
}

/// Two index slots related by a symmetry. Always `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pair {
    pub kind: Kind,
    pub first: usize,
    pub second: usize,
}

/// Symmetries of an array under exchange of index slots.
///
/// The textual form is `nosym`, or `_`-separated parts like `sym01` and
/// `anti23`. A part with more than two digits relates each consecutive pair
/// of slots, so `sym012` is fully symmetric in the first three slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symmetry {
    pairs: Vec<Pair>,
}

impl Symmetry {
    pub fn none() -> Symmetry {
        Symmetry::default()
    }

    pub fn symmetric(first: usize, second: usize) -> Symmetry {
        Symmetry {
            pairs: vec![Pair {
                kind: Kind::Symmetric,
                first: first.min(second),
                second: first.max(second),
            }],
        }
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Maps an index tuple to the representative tuple whose component it
    /// shares, together with the sign relating the two.
    ///
    /// Returns [None] if the component vanishes by antisymmetry.
    pub fn canonicalize(&self, index: &[usize]) -> Option<(Vec<usize>, i64)> {
        let mut index = index.to_vec();
        let mut sign = 1;
        loop {
            let mut changed = false;
            for pair in &self.pairs {
                let (a, b) = (index[pair.first], index[pair.second]);
                if a == b && pair.kind == Kind::Antisymmetric {
                    return None;
                }
                if a > b {
                    index.swap(pair.first, pair.second);
                    if pair.kind == Kind::Antisymmetric {
                        sign = -sign;
                    }
                    changed = true;
                }
            }
            if !changed {
                return Some((index, sign));
            }
        }
    }
}

impl FromStr for Symmetry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "nosym" {
            return Ok(Symmetry::none());
        }
        let invalid = || Error::InvalidSymmetry(s.to_string());
        let mut pairs = vec![];
        for part in s.split('_') {
            let (kind, digits) = if let Some(digits) = part.strip_prefix("sym") {
                (Kind::Symmetric, digits)
            } else if let Some(digits) = part.strip_prefix("anti") {
                (Kind::Antisymmetric, digits)
            } else {
                return Err(invalid());
            };
            let slots: Vec<usize> = digits
                .chars()
                .map(|c| c.to_digit(10).map(|d| d as usize))
                .collect::<Option<_>>()
                .ok_or_else(invalid)?;
            if slots.len() < 2 {
                return Err(invalid());
            }
            for window in slots.windows(2) {
                if window[0] == window[1] {
                    return Err(invalid());
                }
                pairs.push(Pair {
                    kind,
                    first: window[0].min(window[1]),
                    second: window[0].max(window[1]),
                });
            }
        }
        Ok(Symmetry { pairs })
    }
}

impl std::fmt::Display for Symmetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pairs.is_empty() {
            return write!(f, "nosym");
        }
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, "_")?;
            }
            let kind = match pair.kind {
                Kind::Symmetric => "sym",
                Kind::Antisymmetric => "anti",
            };
            write!(f, "{kind}{}{}", pair.first, pair.second)?;
        }
        Ok(())
    }
}

/// Allocates an array of fresh symbols.
///
/// The component at index tuple `(i, j, …)` is the symbol `symbol` followed by
/// the digits of the tuple's canonical representative under `symmetry`, so
/// `declare("hDD", 2, &"sym01".parse()?, 3)` stores `hDD01` at both `[0][1]`
/// and `[1][0]`.
pub fn declare(
    symbol: &str,
    rank: usize,
    symmetry: &Symmetry,
    dimension: usize,
) -> Result<Array, Error> {
    if let Some(pair) = symmetry.pairs.iter().find(|p| p.second >= rank) {
        return Err(Error::SymmetrySlotOutOfRange {
            slot: pair.second,
            rank,
        });
    }
    Ok(Array::from_fn(rank, dimension, |index| {
        match symmetry.canonicalize(index) {
            None => Expr::zero(),
            Some((canonical, sign)) => {
                let digits: String = canonical.iter().map(|i| i.to_string()).collect();
                Expr::integer(sign) * Expr::symbol(format!("{symbol}{digits}"))
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        for s in ["nosym", "sym01", "anti23_sym45", "sym01_sym12"] {
            assert_eq!(s.parse::<Symmetry>().unwrap().to_string(), s);
        }
        assert_eq!("sym012".parse::<Symmetry>().unwrap().to_string(), "sym01_sym12");
        for s in ["sym", "sym0", "sym00", "foo01", "sym0x"] {
            assert_eq!(s.parse::<Symmetry>(), Err(Error::InvalidSymmetry(s.into())));
        }
    }

    #[test]
    fn symmetric_components_are_shared() {
        let t = declare("hDD", 2, &"sym01".parse().unwrap(), 3).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(t.get(&[i, j]), t.get(&[j, i]));
            }
        }
        assert_eq!(t.get(&[2, 0]), Some(&Expr::symbol("hDD02")));
    }

    #[test]
    fn antisymmetric_components_flip_sign() {
        let t = declare("FDD", 2, &"anti01".parse().unwrap(), 4).unwrap();
        for i in 0..4 {
            assert_eq!(t.get(&[i, i]), Some(&Expr::zero()));
            for j in 0..4 {
                let (a, b) = (t.get(&[i, j]).unwrap(), t.get(&[j, i]).unwrap());
                assert_eq!(a.clone(), -b.clone());
            }
        }
    }

    #[test]
    fn chained_symmetry_is_total() {
        let t = declare("TDDD", 3, &"sym012".parse().unwrap(), 3).unwrap();
        assert_eq!(t.get(&[2, 0, 1]), Some(&Expr::symbol("TDDD012")));
        assert_eq!(t.get(&[1, 2, 0]), Some(&Expr::symbol("TDDD012")));
    }

    #[test]
    fn slot_out_of_range() {
        let err = declare("vU", 1, &"sym01".parse().unwrap(), 3).unwrap_err();
        assert_eq!(err, Error::SymmetrySlotOutOfRange { slot: 1, rank: 1 });
    }
}
