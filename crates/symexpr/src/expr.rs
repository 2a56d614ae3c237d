//! The expression tree and its canonicalising constructors.
//!
//! Expressions are always built through the constructors on [Expr]
//! ([Expr::add], [Expr::mul], [Expr::pow], ...) rather than the enum variants
//! directly. The constructors flatten nested sums and products, fold numeric
//! parts, collect like terms and like powers, and sort operands with
//! [canonical_cmp]. Two expressions that are equal after these rewrites are
//! structurally equal, which is what term collection relies on.

use crate::Number;
use std::cmp::Ordering;

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Number(Number),
    Symbol(String),
    Constant(Constant),
    /// Sum of at least two terms; a numeric term, if any, comes first.
    Add(Vec<Expr>),
    /// Product of at least two factors; a numeric coefficient, if any, comes first.
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
    /// Application of an uninterpreted function.
    Apply(String, Vec<Expr>),
    /// Unevaluated derivative. A variable appearing `n` times denotes an
    /// `n`-th derivative.
    Derivative(Box<Expr>, Vec<String>),
}

/// Named mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}

/// Elementary functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    Log,
}

impl Func {
    pub fn name(self) -> &'static str {
        use Func::*;
        match self {
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Sinh => "sinh",
            Cosh => "cosh",
            Tanh => "tanh",
            Asin => "asin",
            Acos => "acos",
            Atan => "atan",
            Asinh => "asinh",
            Acosh => "acosh",
            Atanh => "atanh",
            Exp => "exp",
            Log => "log",
        }
    }

    /// Looks up a trigonometric or hyperbolic function by name, e.g. `"sinh"`.
    pub fn trigonometric(name: &str) -> Option<Func> {
        use Func::*;
        Some(match name {
            "sin" => Sin,
            "cos" => Cos,
            "tan" => Tan,
            "sinh" => Sinh,
            "cosh" => Cosh,
            "tanh" => Tanh,
            _ => return None,
        })
    }

    /// The functional inverse of a trigonometric or hyperbolic function.
    pub fn inverse(self) -> Option<Func> {
        use Func::*;
        Some(match self {
            Sin => Asin,
            Cos => Acos,
            Tan => Atan,
            Sinh => Asinh,
            Cosh => Acosh,
            Tanh => Atanh,
            Asin => Sin,
            Acos => Cos,
            Atan => Tan,
            Asinh => Sinh,
            Acosh => Cosh,
            Atanh => Tanh,
            Exp => Log,
            Log => Exp,
        })
    }

    pub fn evalf(self, x: f64) -> f64 {
        use Func::*;
        match self {
            Sin => x.sin(),
            Cos => x.cos(),
            Tan => x.tan(),
            Sinh => x.sinh(),
            Cosh => x.cosh(),
            Tanh => x.tanh(),
            Asin => x.asin(),
            Acos => x.acos(),
            Atan => x.atan(),
            Asinh => x.asinh(),
            Acosh => x.acosh(),
            Atanh => x.atanh(),
            Exp => x.exp(),
            Log => x.ln(),
        }
    }
}

impl Expr {
    pub fn zero() -> Expr {
        Expr::Number(Number::ZERO)
    }

    pub fn one() -> Expr {
        Expr::Number(Number::ONE)
    }

    pub fn integer(n: i64) -> Expr {
        Expr::Number(Number::integer(n))
    }

    pub fn rational(numerator: i64, denominator: i64) -> Expr {
        Expr::Number(Number::rational(numerator, denominator))
    }

    pub fn float(x: f64) -> Expr {
        Expr::Number(Number::Float(x))
    }

    pub fn symbol<S: Into<String>>(name: S) -> Expr {
        Expr::Symbol(name.into())
    }

    pub fn pi() -> Expr {
        Expr::Constant(Constant::Pi)
    }

    pub fn e() -> Expr {
        Expr::Constant(Constant::E)
    }

    pub fn apply<S: Into<String>>(name: S, args: Vec<Expr>) -> Expr {
        Expr::Apply(name.into(), args)
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_one())
    }

    /// Sum of the terms.
    pub fn add(terms: Vec<Expr>) -> Expr {
        let mut constant = Number::ZERO;
        let mut collected: Vec<(Number, Expr)> = Vec::new();
        let mut stack = terms;
        while let Some(term) = stack.pop() {
            match term {
                Expr::Add(inner) => stack.extend(inner),
                Expr::Number(n) => constant = constant + n,
                term => {
                    let (coefficient, rest) = term.split_coefficient();
                    match collected.iter_mut().find(|(_, r)| *r == rest) {
                        Some((c, _)) => *c = *c + coefficient,
                        None => collected.push((coefficient, rest)),
                    }
                }
            }
        }
        let mut terms: Vec<Expr> = collected
            .into_iter()
            .filter(|(c, _)| !c.is_zero())
            .map(|(c, rest)| Expr::scale(c, rest))
            .collect();
        terms.sort_by(cmp_terms);
        if !constant.is_zero() {
            terms.insert(0, Expr::Number(constant));
        }
        match terms.len() {
            0 => Expr::zero(),
            1 => terms.remove(0),
            _ => Expr::Add(terms),
        }
    }

    /// Product of the factors.
    pub fn mul(factors: Vec<Expr>) -> Expr {
        let mut coefficient = Number::ONE;
        let mut powers: Vec<(Expr, Expr)> = Vec::new();
        let mut stack = factors;
        while let Some(factor) = stack.pop() {
            match factor {
                Expr::Mul(inner) => stack.extend(inner),
                Expr::Number(n) => coefficient = coefficient * n,
                factor => {
                    let (base, exponent) = factor.split_power();
                    match powers.iter_mut().find(|(b, _)| *b == base) {
                        Some((_, e)) => {
                            let previous = std::mem::replace(e, Expr::zero());
                            *e = Expr::add(vec![previous, exponent]);
                        }
                        None => powers.push((base, exponent)),
                    }
                }
            }
        }
        if coefficient.is_zero() {
            return Expr::zero();
        }
        let mut factors = Vec::with_capacity(powers.len());
        for (base, exponent) in powers {
            match Expr::pow(base, exponent) {
                Expr::Number(n) => coefficient = coefficient * n,
                Expr::Mul(inner) => {
                    for factor in inner {
                        match factor {
                            Expr::Number(n) => coefficient = coefficient * n,
                            factor => factors.push(factor),
                        }
                    }
                }
                factor => factors.push(factor),
            }
        }
        if coefficient.is_zero() {
            return Expr::zero();
        }
        factors.sort_by(cmp_factors);
        if factors.is_empty() {
            return Expr::Number(coefficient);
        }
        if !coefficient.is_one() {
            factors.insert(0, Expr::Number(coefficient));
        }
        if factors.len() == 1 {
            factors.remove(0)
        } else {
            Expr::Mul(factors)
        }
    }

    /// `base` raised to `exponent`.
    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        if exponent.is_zero() {
            return Expr::one();
        }
        if exponent.is_one() || base.is_one() {
            return base;
        }
        match (&base, &exponent) {
            (Expr::Number(b), Expr::Number(e)) => {
                if let Some(n) = b.pow(*e) {
                    return Expr::Number(n);
                }
            }
            (Expr::Pow(inner_base, inner_exponent), Expr::Number(e)) if e.as_integer().is_some() => {
                return Expr::pow(
                    (**inner_base).clone(),
                    Expr::mul(vec![(**inner_exponent).clone(), exponent.clone()]),
                );
            }
            (Expr::Mul(factors), Expr::Number(e)) if e.as_integer().is_some() => {
                return Expr::mul(
                    factors
                        .iter()
                        .map(|f| Expr::pow(f.clone(), exponent.clone()))
                        .collect(),
                );
            }
            _ => {}
        }
        Expr::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn sqrt(x: Expr) -> Expr {
        Expr::pow(x, Expr::rational(1, 2))
    }

    pub fn recip(x: Expr) -> Expr {
        Expr::pow(x, Expr::integer(-1))
    }

    /// Application of an elementary function.
    pub fn func(func: Func, arg: Expr) -> Expr {
        use Func::*;
        if arg.is_zero() {
            match func {
                Sin | Tan | Sinh | Tanh | Asin | Atan | Asinh | Atanh => return Expr::zero(),
                Cos | Cosh | Exp => return Expr::one(),
                _ => {}
            }
        }
        match (func, &arg) {
            (Log, a) if a.is_one() => return Expr::zero(),
            (Log, Expr::Constant(Constant::E)) => return Expr::one(),
            (Exp, Expr::Func(Log, inner)) | (Log, Expr::Func(Exp, inner)) => return (**inner).clone(),
            (_, Expr::Number(Number::Float(x))) => return Expr::float(func.evalf(*x)),
            _ => {}
        }
        Expr::Func(func, Box::new(arg))
    }

    pub fn exp(x: Expr) -> Expr {
        Expr::func(Func::Exp, x)
    }

    pub fn log(x: Expr) -> Expr {
        Expr::func(Func::Log, x)
    }

    /// Unevaluated derivative of `expr` with respect to each variable in turn.
    pub fn derivative(expr: Expr, variables: Vec<String>) -> Expr {
        if variables.is_empty() {
            return expr;
        }
        match expr {
            Expr::Number(_) | Expr::Constant(_) => Expr::zero(),
            Expr::Derivative(inner, mut previous) => {
                previous.extend(variables);
                Expr::Derivative(inner, previous)
            }
            expr => Expr::Derivative(Box::new(expr), variables),
        }
    }

    /// Splits off the numeric coefficient: `3*x*y` becomes `(3, x*y)`.
    pub fn split_coefficient(self) -> (Number, Expr) {
        match self {
            Expr::Mul(mut factors) => match factors.first() {
                Some(Expr::Number(n)) => {
                    let n = *n;
                    factors.remove(0);
                    let rest = if factors.len() == 1 {
                        factors.remove(0)
                    } else {
                        Expr::Mul(factors)
                    };
                    (n, rest)
                }
                _ => (Number::ONE, Expr::Mul(factors)),
            },
            Expr::Number(n) => (n, Expr::one()),
            other => (Number::ONE, other),
        }
    }

    /// Splits a power into base and exponent; other expressions have exponent 1.
    pub fn split_power(self) -> (Expr, Expr) {
        match self {
            Expr::Pow(base, exponent) => (*base, *exponent),
            other => (other, Expr::one()),
        }
    }

    // Inverse of split_coefficient for an already canonical remainder.
    fn scale(coefficient: Number, rest: Expr) -> Expr {
        if coefficient.is_one() {
            return rest;
        }
        match rest {
            Expr::Mul(mut factors) => {
                factors.insert(0, Expr::Number(coefficient));
                Expr::Mul(factors)
            }
            rest if rest.is_one() => Expr::Number(coefficient),
            rest => Expr::Mul(vec![Expr::Number(coefficient), rest]),
        }
    }

    /// Visits every node in pre-order.
    pub fn visit<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match self {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => {}
            Expr::Add(children) | Expr::Mul(children) | Expr::Apply(_, children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Expr::Pow(base, exponent) => {
                base.visit(f);
                exponent.visit(f);
            }
            Expr::Func(_, arg) | Expr::Derivative(arg, _) => arg.visit(f),
        }
    }

    /// Rebuilds the tree top-down.
    ///
    /// The callback is offered every node before its children. If it returns a
    /// replacement, the replacement is used as is and the node's children are not
    /// visited. Otherwise the children are mapped and the node is rebuilt through
    /// the canonicalising constructors.
    pub fn try_map<E, F>(&self, f: &mut F) -> Result<Expr, E>
    where
        F: FnMut(&Expr) -> Result<Option<Expr>, E>,
    {
        if let Some(replacement) = f(self)? {
            return Ok(replacement);
        }
        Ok(match self {
            Expr::Number(_) | Expr::Symbol(_) | Expr::Constant(_) => self.clone(),
            Expr::Add(terms) => Expr::add(
                terms
                    .iter()
                    .map(|t| t.try_map(f))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Mul(factors) => Expr::mul(
                factors
                    .iter()
                    .map(|t| t.try_map(f))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Pow(base, exponent) => Expr::pow(base.try_map(f)?, exponent.try_map(f)?),
            Expr::Func(func, arg) => Expr::func(*func, arg.try_map(f)?),
            Expr::Apply(name, args) => Expr::Apply(
                name.clone(),
                args.iter()
                    .map(|t| t.try_map(f))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Derivative(inner, variables) => {
                Expr::derivative(inner.try_map(f)?, variables.clone())
            }
        })
    }

    /// Infallible version of [Expr::try_map].
    pub fn map<F>(&self, f: &mut F) -> Expr
    where
        F: FnMut(&Expr) -> Option<Expr>,
    {
        let result: Result<Expr, std::convert::Infallible> = self.try_map(&mut |e| Ok(f(e)));
        match result {
            Ok(expr) => expr,
            Err(never) => match never {},
        }
    }

    pub fn contains_symbol(&self, name: &str) -> bool {
        let mut found = false;
        self.visit(&mut |e| {
            if let Expr::Symbol(s) = e {
                found |= s == name;
            }
        });
        found
    }

    /// Whether any node satisfies the predicate.
    pub fn any<F: FnMut(&Expr) -> bool>(&self, mut predicate: F) -> bool {
        let mut found = false;
        self.visit(&mut |e| found = found || predicate(e));
        found
    }
}

fn variant_rank(e: &Expr) -> u8 {
    match e {
        Expr::Number(_) => 0,
        Expr::Constant(_) => 1,
        Expr::Symbol(_) => 2,
        Expr::Apply(..) => 3,
        Expr::Derivative(..) => 4,
        Expr::Func(..) => 5,
        Expr::Pow(..) => 6,
        Expr::Mul(_) => 7,
        Expr::Add(_) => 8,
    }
}

/// Total order used to sort the operands of sums and products.
pub fn canonical_cmp(a: &Expr, b: &Expr) -> Ordering {
    match (a, b) {
        (Expr::Number(x), Expr::Number(y)) => x.total_cmp(y),
        (Expr::Constant(x), Expr::Constant(y)) => x.cmp(y),
        (Expr::Symbol(x), Expr::Symbol(y)) => x.cmp(y),
        (Expr::Apply(f, xs), Expr::Apply(g, ys)) => f.cmp(g).then_with(|| cmp_slices(xs, ys)),
        (Expr::Derivative(x, u), Expr::Derivative(y, v)) => {
            canonical_cmp(x, y).then_with(|| u.cmp(v))
        }
        (Expr::Func(f, x), Expr::Func(g, y)) => f.cmp(g).then_with(|| canonical_cmp(x, y)),
        (Expr::Pow(b1, e1), Expr::Pow(b2, e2)) => {
            canonical_cmp(b1, b2).then_with(|| canonical_cmp(e1, e2))
        }
        (Expr::Mul(xs), Expr::Mul(ys)) | (Expr::Add(xs), Expr::Add(ys)) => cmp_slices(xs, ys),
        _ => variant_rank(a).cmp(&variant_rank(b)),
    }
}

// Terms are ordered by their monomial, so `3*x` sorts next to `x`.
fn cmp_terms(a: &Expr, b: &Expr) -> Ordering {
    fn monomial(e: &Expr) -> &[Expr] {
        match e {
            Expr::Mul(factors) if matches!(factors.first(), Some(Expr::Number(_))) => &factors[1..],
            Expr::Mul(factors) => factors,
            e => std::slice::from_ref(e),
        }
    }
    cmp_slices(monomial(a), monomial(b)).then_with(|| canonical_cmp(a, b))
}

// Factors are ordered by their base, so `x^2` sorts next to `x`.
fn cmp_factors(a: &Expr, b: &Expr) -> Ordering {
    fn base(e: &Expr) -> &Expr {
        match e {
            Expr::Pow(base, _) => base,
            e => e,
        }
    }
    canonical_cmp(base(a), base(b)).then_with(|| canonical_cmp(a, b))
}

fn cmp_slices(xs: &[Expr], ys: &[Expr]) -> Ordering {
    for (x, y) in xs.iter().zip(ys) {
        match canonical_cmp(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    xs.len().cmp(&ys.len())
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::integer(n)
    }
}

impl From<Number> for Expr {
    fn from(n: Number) -> Self {
        Expr::Number(n)
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::add(vec![self, rhs])
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::add(vec![self, -rhs])
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::mul(vec![self, rhs])
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::mul(vec![self, Expr::recip(rhs)])
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::mul(vec![Expr::Number(Number::MINUS_ONE), self])
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
    fn like_terms_are_collected() {
        let e = x() + y() + x() * Expr::integer(2);
        assert_eq!(
            e,
            Expr::Add(vec![Expr::Mul(vec![Expr::integer(3), x()]), y()])
        );
    }

    #[test]
    fn cancellation_gives_zero() {
        assert_eq!(x() - x(), Expr::zero());
        assert_eq!((x() * y()) - (y() * x()), Expr::zero());
    }

    #[test]
    fn like_powers_are_collected() {
        assert_eq!(x() * x(), Expr::pow(x(), Expr::integer(2)));
        assert_eq!(x() / x(), Expr::one());
        assert_eq!(
            Expr::sqrt(x()) * Expr::sqrt(x()),
            x()
        );
    }

    #[test]
    fn numbers_fold() {
        assert_eq!(
            Expr::rational(1, 2) + Expr::rational(1, 3),
            Expr::rational(5, 6)
        );
        assert_eq!(Expr::pow(Expr::integer(2), Expr::integer(-2)), Expr::rational(1, 4));
        assert_eq!(Expr::integer(0) * x(), Expr::zero());
    }

    #[test]
    fn operand_order_is_canonical() {
        assert_eq!(x() * y(), y() * x());
        assert_eq!(x() + y() + Expr::integer(1), Expr::integer(1) + y() + x());
    }

    #[test]
    fn power_of_power() {
        let e = Expr::pow(Expr::pow(x(), Expr::integer(2)), Expr::integer(3));
        assert_eq!(e, Expr::pow(x(), Expr::integer(6)));
    }

    #[test]
    fn elementary_function_identities() {
        assert_eq!(Expr::func(Func::Sin, Expr::zero()), Expr::zero());
        assert_eq!(Expr::exp(Expr::log(x())), x());
        assert_eq!(Expr::log(Expr::e()), Expr::one());
    }

    #[test]
    fn map_replaces_nodes() {
        let e = x() * y() + x();
        let replaced = e.map(&mut |node| match node {
            Expr::Symbol(s) if s == "x" => Some(Expr::integer(2)),
            _ => None,
        });
        assert_eq!(replaced, Expr::integer(2) * y() + Expr::integer(2));
    }

    #[test]
    fn nested_derivatives_merge() {
        let f = Expr::apply("f", vec![x()]);
        let d = Expr::derivative(Expr::derivative(f.clone(), vec!["x".into()]), vec!["y".into()]);
        assert_eq!(d, Expr::Derivative(Box::new(f), vec!["x".into(), "y".into()]));
    }
}
