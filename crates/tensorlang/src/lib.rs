//! # Tensorlang
//!
//! Tensorlang translates tensor equations written in a restricted LaTeX
//!     dialect into explicit component arrays of symbolic expressions.
//! Indices follow the Einstein convention:
//!     an index that appears once upper and once lower in a term is summed,
//!     every other index is free and becomes an array dimension.
//!
//! Statements are run against a [Session], which remembers declared tensors,
//!     the coordinate basis and other settings from one parse to the next:
//!
//! ```
//! use tensorlang::{Session, Value};
//!
//! let mut session = Session::new();
//! let defined = session
//!     .parse(r"
//!         % define metric gUU (3);
//!         % define nosym wD (3);
//!         v^a = g^{ab} w_b
//!     ")
//!     .unwrap();
//! assert_eq!(defined, vec!["gUU", "gDD", "gdet", "wD", "vU"]);
//!
//! let Some(Value::Array(v)) = session.get("vU") else { panic!() };
//! assert_eq!(
//!     v.get(&[0]).unwrap().to_string(),
//!     "gUU00*wD0 + gUU01*wD1 + gUU02*wD2",
//! );
//! ```
//!
//! Lines starting with `%` are directives.
//! `% define` declares storage (`metric`, `const`, `permutation`, `kronecker`
//!     or a symmetry like `sym01`) and global settings (`basis`, `deriv`, `index`).
//! Covariant derivatives and Christoffel symbols are expanded into their
//!     definitions in terms of partial derivatives and the metric.
//!
//! Errors point at the failing position of the input:
//!
//! ```
//! let mut session = tensorlang::Session::new();
//! let err = session.parse(r"v^a = \foo").unwrap_err();
//! assert_eq!(err.to_string(), "\
//! ParseError:  v^a = \\foo
//!                    ^
//! unsupported command '\\foo' at position 6");
//! ```

mod error;
mod generate;
mod instantiate;
mod lexer;
mod parser;
mod prepass;
mod session;
mod spellcheck;
mod summation;
mod tensor;
mod token;

pub use error::{Class, Error, ErrorKind, Notice};
pub use instantiate::Storage;
pub use lexer::{Lexer, Mark};
pub use prepass::desugar;
pub use session::{DerivType, Session, Value, SPATIAL_INDICES};
pub use tensor::{Index, Tensor, Variance};
pub use token::Kind;
