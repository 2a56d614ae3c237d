//! Symmetry-aware nested arrays of symbolic expressions.
//!
//! An [Array] of rank `r` and dimension `n` is an `n × n × … × n` nested list
//! of [symexpr::Expr] values. [declare] allocates an array whose components
//! are fresh symbols, sharing components between slots related by a
//! [Symmetry]. [symm_matrix_inverter] inverts symmetric rank-2 arrays of
//! dimension 2, 3 or 4.

mod array;
mod inverse;
mod symmetry;

pub use array::Array;
pub use inverse::inverter_2x2;
pub use inverse::inverter_3x3;
pub use inverse::inverter_4x4;
pub use inverse::symm_matrix_inverter;
pub use symmetry::declare;
pub use symmetry::Kind;
pub use symmetry::Pair;
pub use symmetry::Symmetry;

/// Error returned by the operations in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A symmetry specification could not be parsed.
    InvalidSymmetry(String),
    /// A symmetry pair refers to a slot the array does not have.
    SymmetrySlotOutOfRange { slot: usize, rank: usize },
    /// An index tuple does not address a component of the array.
    IndexOutOfRange { index: Vec<usize>, rank: usize, dimension: usize },
    /// A matrix operation was requested on an array that is not rank 2.
    NotAMatrix { rank: usize },
    /// Matrix inversion is only implemented in dimensions 2, 3 and 4.
    UnsupportedDimension(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidSymmetry(s) => write!(f, "invalid symmetry '{s}'"),
            Error::SymmetrySlotOutOfRange { slot, rank } => {
                write!(f, "symmetry refers to slot {slot} of a rank {rank} array")
            }
            Error::IndexOutOfRange {
                index,
                rank,
                dimension,
            } => write!(
                f,
                "index {index:?} out of range for a rank {rank} array of dimension {dimension}"
            ),
            Error::NotAMatrix { rank } => write!(f, "expected a rank 2 array, got rank {rank}"),
            Error::UnsupportedDimension(dimension) => {
                write!(f, "unsupported dimension {dimension} for matrix inversion")
            }
        }
    }
}

impl std::error::Error for Error {}
