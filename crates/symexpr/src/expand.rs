//! Algebraic expansion.

use crate::Expr;

/// Sums raised to integer powers above this bound are left unexpanded.
const MAX_EXPANDED_POWER: i64 = 8;

impl Expr {
    /// Distributes products over sums.
    ///
    /// Sums raised to small positive integer powers are multiplied out, and
    /// unevaluated derivatives are distributed over sums and numeric
    /// coefficients so that every resulting term is a product.
    pub fn expand(&self) -> Expr {
        match self {
            Expr::Add(terms) => Expr::add(terms.iter().map(Expr::expand).collect()),
            Expr::Mul(factors) => distribute(factors.iter().map(Expr::expand).collect()),
            Expr::Pow(base, exponent) => {
                let base = base.expand();
                let exponent = exponent.expand();
                match (&base, exponent.as_number().and_then(|n| n.as_integer())) {
                    (Expr::Add(_), Some(n)) if (2..=MAX_EXPANDED_POWER).contains(&n) => {
                        distribute(vec![base; n as usize])
                    }
                    _ => Expr::pow(base, exponent),
                }
            }
            Expr::Func(func, arg) => Expr::func(*func, arg.expand()),
            Expr::Apply(name, args) => {
                Expr::Apply(name.clone(), args.iter().map(Expr::expand).collect())
            }
            Expr::Derivative(inner, variables) => match inner.expand() {
                Expr::Add(terms) => Expr::add(
                    terms
                        .into_iter()
                        .map(|t| derivative_of_term(t, variables))
                        .collect(),
                ),
                term => derivative_of_term(term, variables),
            },
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => self.clone(),
        }
    }
}

fn derivative_of_term(term: Expr, variables: &[String]) -> Expr {
    let (coefficient, rest) = term.split_coefficient();
    Expr::mul(vec![
        Expr::Number(coefficient),
        Expr::derivative(rest, variables.to_vec()),
    ])
}

fn distribute(factors: Vec<Expr>) -> Expr {
    let mut products: Vec<Vec<Expr>> = vec![vec![]];
    for factor in factors {
        let terms = match factor {
            Expr::Add(terms) => terms,
            other => vec![other],
        };
        products = products
            .into_iter()
            .flat_map(|product| {
                terms.iter().map(move |term| {
                    let mut product = product.clone();
                    product.push(term.clone());
                    product
                })
            })
            .collect();
    }
    Expr::add(products.into_iter().map(Expr::mul).collect())
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
    fn distributes_products() {
        let e = (x() + y()) * (x() - y());
        assert_eq!(
            e.expand(),
            Expr::pow(x(), Expr::integer(2)) - Expr::pow(y(), Expr::integer(2))
        );
    }

    #[test]
    fn expands_small_powers() {
        let e = Expr::pow(x() + Expr::one(), Expr::integer(2));
        assert_eq!(
            e.expand(),
            Expr::pow(x(), Expr::integer(2)) + Expr::integer(2) * x() + Expr::one()
        );
    }

    #[test]
    fn distributes_derivatives() {
        let f = Expr::apply("f", vec![x()]);
        let g = Expr::apply("g", vec![x()]);
        let e = Expr::derivative(f.clone() + Expr::integer(2) * g.clone(), vec!["x".into()]);
        let want = Expr::derivative(f, vec!["x".into()])
            + Expr::integer(2) * Expr::derivative(g, vec!["x".into()]);
        assert_eq!(e.expand(), want);
    }
}
