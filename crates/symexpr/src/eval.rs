//! Numeric evaluation.

use crate::Expr;
use std::collections::HashMap;

impl Expr {
    /// Evaluates the expression to a float given values for its symbols.
    ///
    /// Returns [None] if a symbol is unbound or the expression contains an
    /// uninterpreted function or an unevaluated derivative.
    pub fn evalf(&self, values: &HashMap<&str, f64>) -> Option<f64> {
        Some(match self {
            Expr::Number(n) => n.to_f64(),
            Expr::Symbol(s) => *values.get(s.as_str())?,
            Expr::Constant(c) => c.value(),
            Expr::Add(terms) => {
                let mut sum = 0.0;
                for term in terms {
                    sum += term.evalf(values)?;
                }
                sum
            }
            Expr::Mul(factors) => {
                let mut product = 1.0;
                for factor in factors {
                    product *= factor.evalf(values)?;
                }
                product
            }
            Expr::Pow(base, exponent) => base.evalf(values)?.powf(exponent.evalf(values)?),
            Expr::Func(func, arg) => func.evalf(arg.evalf(values)?),
            Expr::Apply(..) | Expr::Derivative(..) => return None,
        })
    }

    /// Replaces every occurrence of the symbol `name` by `value`.
    pub fn subs(&self, name: &str, value: &Expr) -> Expr {
        self.map(&mut |e| match e {
            Expr::Symbol(s) if s == name => Some(value.clone()),
            _ => None,
        })
    }
}
