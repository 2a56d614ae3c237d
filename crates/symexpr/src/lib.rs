//! A small symbolic expression engine.
//!
//! This crate is the host evaluator used by the `tensorlang` translator. It
//! provides exact rational arithmetic, symbols, elementary functions,
//! uninterpreted function applications and unevaluated derivatives, together
//! with the handful of algebraic operations the translator needs:
//! canonicalising construction, [Expr::expand], [Expr::diff] and [Expr::doit].
//!
//! ```
//! use symexpr::Expr;
//! let x = Expr::symbol("x");
//! let e = Expr::pow(x.clone(), Expr::integer(3)) + x;
//! assert_eq!(e.diff("x").to_string(), "1 + 3*x^2");
//! ```

mod calculus;
mod display;
mod eval;
mod expand;
mod expr;
mod number;

pub use expr::canonical_cmp;
pub use expr::Constant;
pub use expr::Expr;
pub use expr::Func;
pub use number::Number;

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip() {
        let e = Expr::func(Func::Sin, Expr::symbol("x")) * Expr::rational(1, 2);
        let serialized = serde_json::to_string(&e).unwrap();
        let deserialized: Expr = serde_json::from_str(&serialized).unwrap();
        assert_eq!(e, deserialized);
    }
}
