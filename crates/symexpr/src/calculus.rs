//! Differentiation.

use crate::{Expr, Func};

impl Expr {
    /// Derivative with respect to the symbol `var`.
    ///
    /// Uninterpreted function applications and unevaluated derivatives that
    /// depend on `var` stay unevaluated; all other nodes are differentiated
    /// with the usual product, power and chain rules.
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Number(_) | Expr::Constant(_) => Expr::zero(),
            Expr::Symbol(name) => {
                if name == var {
                    Expr::one()
                } else {
                    Expr::zero()
                }
            }
            Expr::Add(terms) => Expr::add(terms.iter().map(|t| t.diff(var)).collect()),
            Expr::Mul(factors) => {
                let mut terms = Vec::with_capacity(factors.len());
                for (i, factor) in factors.iter().enumerate() {
                    let d = factor.diff(var);
                    if d.is_zero() {
                        continue;
                    }
                    let mut product = factors.clone();
                    product[i] = d;
                    terms.push(Expr::mul(product));
                }
                Expr::add(terms)
            }
            Expr::Pow(base, exponent) => {
                let db = base.diff(var);
                let de = exponent.diff(var);
                if de.is_zero() {
                    if db.is_zero() {
                        return Expr::zero();
                    }
                    let lowered = Expr::add(vec![(**exponent).clone(), Expr::integer(-1)]);
                    return Expr::mul(vec![
                        (**exponent).clone(),
                        Expr::pow((**base).clone(), lowered),
                        db,
                    ]);
                }
                // d(b^e) = b^e (e' log b + e b'/b)
                Expr::mul(vec![
                    self.clone(),
                    Expr::add(vec![
                        Expr::mul(vec![de, Expr::log((**base).clone())]),
                        Expr::mul(vec![(**exponent).clone(), db, Expr::recip((**base).clone())]),
                    ]),
                ])
            }
            Expr::Func(func, arg) => {
                let da = arg.diff(var);
                if da.is_zero() {
                    return Expr::zero();
                }
                Expr::mul(vec![outer_derivative(*func, arg), da])
            }
            Expr::Apply(..) => {
                if self.contains_symbol(var) {
                    Expr::derivative(self.clone(), vec![var.to_string()])
                } else {
                    Expr::zero()
                }
            }
            Expr::Derivative(inner, variables) => {
                if inner.contains_symbol(var) {
                    let mut variables = variables.clone();
                    variables.push(var.to_string());
                    Expr::Derivative(inner.clone(), variables)
                } else {
                    Expr::zero()
                }
            }
        }
    }

    /// Evaluates every unevaluated [Expr::Derivative] node.
    pub fn doit(&self) -> Expr {
        self.map(&mut |e| match e {
            Expr::Derivative(inner, variables) => Some(
                variables
                    .iter()
                    .fold(inner.doit(), |acc, variable| acc.diff(variable)),
            ),
            _ => None,
        })
    }
}

fn outer_derivative(func: Func, x: &Expr) -> Expr {
    use Func::*;
    let x = x.clone();
    let square = || Expr::pow(x.clone(), Expr::integer(2));
    let inverse_sqrt = |e: Expr| Expr::pow(e, Expr::rational(-1, 2));
    match func {
        Sin => Expr::func(Cos, x),
        Cos => -Expr::func(Sin, x),
        Tan => Expr::one() + Expr::pow(Expr::func(Tan, x), Expr::integer(2)),
        Sinh => Expr::func(Cosh, x),
        Cosh => Expr::func(Sinh, x),
        Tanh => Expr::one() - Expr::pow(Expr::func(Tanh, x), Expr::integer(2)),
        Asin => inverse_sqrt(Expr::one() - square()),
        Acos => -inverse_sqrt(Expr::one() - square()),
        Atan => Expr::recip(Expr::one() + square()),
        Asinh => inverse_sqrt(square() + Expr::one()),
        Acosh => inverse_sqrt(square() - Expr::one()),
        Atanh => Expr::recip(Expr::one() - square()),
        Exp => Expr::exp(x),
        Log => Expr::recip(x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::symbol("x")
    }

    fn y() -> Expr {
        Expr::symbol("y")
    }

    #[test]
    fn polynomial() {
        let e = Expr::pow(x(), Expr::integer(3)) * y() + x();
        let want = Expr::integer(3) * Expr::pow(x(), Expr::integer(2)) * y() + Expr::one();
        assert_eq!(e.diff("x"), want);
        assert_eq!(e.diff("z"), Expr::zero());
    }

    #[test]
    fn chain_rule() {
        let e = Expr::func(Func::Sin, x() * y());
        assert_eq!(e.diff("x"), Expr::func(Func::Cos, x() * y()) * y());
    }

    #[test]
    fn quotient() {
        let e = Expr::one() / x();
        assert_eq!(e.diff("x"), -Expr::pow(x(), Expr::integer(-2)));
    }

    #[test]
    fn uninterpreted_functions_stay_unevaluated() {
        let f = Expr::apply("f", vec![x()]);
        let g = Expr::apply("g", vec![x()]);
        let d = (f.clone() * g.clone()).diff("x");
        let want = Expr::derivative(f.clone(), vec!["x".into()]) * g.clone()
            + f.clone() * Expr::derivative(g.clone(), vec!["x".into()]);
        assert_eq!(d, want);
        assert_eq!(f.diff("y"), Expr::zero());
    }

    #[test]
    fn doit_evaluates_derivatives() {
        let e = Expr::derivative(Expr::pow(x(), Expr::integer(2)) * y(), vec!["x".into(), "y".into()]);
        assert_eq!(e.doit(), Expr::integer(2) * x());
    }
}
