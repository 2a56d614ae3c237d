use crate::{Expr, Number};
use std::fmt;

#[derive(PartialEq, PartialOrd, Clone, Copy)]
enum Precedence {
    Sum,
    Product,
    Power,
    Atom,
}

fn precedence(e: &Expr) -> Precedence {
    match e {
        Expr::Add(_) => Precedence::Sum,
        Expr::Mul(_) => Precedence::Product,
        Expr::Number(Number::Rational(_, d)) if *d != 1 => Precedence::Product,
        Expr::Number(n) if n.is_negative() => Precedence::Sum,
        Expr::Pow(..) => Precedence::Power,
        _ => Precedence::Atom,
    }
}

struct Wrapped<'a>(&'a Expr, Precedence);

impl fmt::Display for Wrapped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if precedence(self.0) <= self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Constant(c) => match c {
                crate::Constant::Pi => write!(f, "pi"),
                crate::Constant::E => write!(f, "E"),
            },
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    let (coefficient, rest) = term.clone().split_coefficient();
                    if i == 0 {
                        write!(f, "{term}")?;
                    } else if coefficient.is_negative() {
                        let positive = Expr::mul(vec![Expr::Number(-coefficient), rest]);
                        write!(f, " - {}", Wrapped(&positive, Precedence::Sum))?;
                    } else {
                        write!(f, " + {term}")?;
                    }
                }
                Ok(())
            }
            Expr::Mul(factors) => write_product(f, factors),
            Expr::Pow(base, exponent) => match exponent.as_number() {
                Some(Number::Rational(1, 2)) => write!(f, "sqrt({base})"),
                Some(n) if n.is_negative() => {
                    let positive = Expr::pow((**base).clone(), Expr::Number(-n));
                    write!(f, "1/{}", Wrapped(&positive, Precedence::Product))
                }
                _ => write!(
                    f,
                    "{}^{}",
                    Wrapped(base, Precedence::Power),
                    Wrapped(exponent, Precedence::Power)
                ),
            },
            Expr::Func(func, arg) => write!(f, "{}({arg})", func.name()),
            Expr::Apply(name, args) => {
                write!(f, "{name}(")?;
                write_list(f, args.iter())?;
                write!(f, ")")
            }
            Expr::Derivative(inner, variables) => {
                write!(f, "Derivative({inner}, ")?;
                write_list(f, variables.iter())?;
                write!(f, ")")
            }
        }
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_product(f: &mut fmt::Formatter<'_>, factors: &[Expr]) -> fmt::Result {
    let mut coefficient = Number::ONE;
    let mut numerator = vec![];
    let mut denominator = vec![];
    for factor in factors {
        match factor {
            Expr::Number(n) => coefficient = coefficient * *n,
            Expr::Pow(base, exponent) if exponent.as_number().is_some_and(Number::is_negative) => {
                let flipped = exponent.as_number().map(|n| -n).unwrap_or(Number::ONE);
                denominator.push(Expr::pow((**base).clone(), Expr::Number(flipped)));
            }
            factor => numerator.push(factor.clone()),
        }
    }
    if coefficient.is_negative() {
        write!(f, "-")?;
        coefficient = -coefficient;
    }
    let (top, bottom) = match coefficient {
        Number::Rational(n, d) => (Number::integer(n), d),
        float => (float, 1),
    };
    let mut first = true;
    if !top.is_one() || numerator.is_empty() {
        write!(f, "{top}")?;
        first = false;
    }
    for factor in &numerator {
        if !first {
            write!(f, "*")?;
        }
        write!(f, "{}", Wrapped(factor, Precedence::Sum))?;
        first = false;
    }
    if bottom != 1 {
        denominator.insert(0, Expr::integer(bottom));
    }
    match denominator.len() {
        0 => Ok(()),
        1 => write!(f, "/{}", Wrapped(&denominator[0], Precedence::Product)),
        _ => {
            write!(f, "/(")?;
            for (i, factor) in denominator.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                write!(f, "{}", Wrapped(factor, Precedence::Sum))?;
            }
            write!(f, ")")
        }
    }
}
