use crate::Error;
use symexpr::Expr;

/// A nested array of expressions.
///
/// Every nesting level has the same length, the dimension of the array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Array {
    Scalar(Expr),
    Nested(Vec<Array>),
}

impl Array {
    /// Array of the given rank and dimension whose components are all zero.
    pub fn zeros(rank: usize, dimension: usize) -> Array {
        Array::from_fn(rank, dimension, |_| Expr::zero())
    }

    /// Array whose component at each index tuple is `f(index)`.
    ///
    /// Components are generated in lexicographic index order.
    pub fn from_fn<F: FnMut(&[usize]) -> Expr>(rank: usize, dimension: usize, mut f: F) -> Array {
        fn build<F: FnMut(&[usize]) -> Expr>(
            prefix: &mut Vec<usize>,
            rank: usize,
            dimension: usize,
            f: &mut F,
        ) -> Array {
            if prefix.len() == rank {
                return Array::Scalar(f(prefix));
            }
            let mut children = Vec::with_capacity(dimension);
            for i in 0..dimension {
                prefix.push(i);
                children.push(build(prefix, rank, dimension, f));
                prefix.pop();
            }
            Array::Nested(children)
        }
        build(&mut Vec::with_capacity(rank), rank, dimension, &mut f)
    }

    pub fn rank(&self) -> usize {
        match self {
            Array::Scalar(_) => 0,
            Array::Nested(children) => 1 + children.first().map_or(0, Array::rank),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Array::Scalar(_) => 0,
            Array::Nested(children) => children.len(),
        }
    }

    pub fn get(&self, index: &[usize]) -> Option<&Expr> {
        match (self, index.split_first()) {
            (Array::Scalar(e), None) => Some(e),
            (Array::Nested(children), Some((i, rest))) => children.get(*i)?.get(rest),
            _ => None,
        }
    }

    pub fn set(&mut self, index: &[usize], value: Expr) -> Result<(), Error> {
        let (rank, dimension) = (self.rank(), self.dimension());
        let out_of_range = || Error::IndexOutOfRange {
            index: index.to_vec(),
            rank,
            dimension,
        };
        let mut node = self;
        for i in index {
            node = match node {
                Array::Nested(children) => children.get_mut(*i).ok_or_else(out_of_range)?,
                Array::Scalar(_) => return Err(out_of_range()),
            };
        }
        match node {
            Array::Scalar(e) => {
                *e = value;
                Ok(())
            }
            Array::Nested(_) => Err(out_of_range()),
        }
    }

    /// All components with their index tuples, in lexicographic index order.
    pub fn components(&self) -> Vec<(Vec<usize>, &Expr)> {
        fn walk<'a>(array: &'a Array, prefix: &mut Vec<usize>, out: &mut Vec<(Vec<usize>, &'a Expr)>) {
            match array {
                Array::Scalar(e) => out.push((prefix.clone(), e)),
                Array::Nested(children) => {
                    for (i, child) in children.iter().enumerate() {
                        prefix.push(i);
                        walk(child, prefix, out);
                        prefix.pop();
                    }
                }
            }
        }
        let mut out = vec![];
        walk(self, &mut vec![], &mut out);
        out
    }

    /// Applies `f` to every component.
    pub fn map<F: FnMut(&Expr) -> Expr>(&self, f: &mut F) -> Array {
        match self {
            Array::Scalar(e) => Array::Scalar(f(e)),
            Array::Nested(children) => Array::Nested(children.iter().map(|c| c.map(f)).collect()),
        }
    }
}

impl std::fmt::Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Array::Scalar(e) => write!(f, "{e}"),
            Array::Nested(children) => {
                write!(f, "[")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, "]")
            }
        }
    }
}
