//! Exact rational numbers with a floating point fallback.

use std::cmp::Ordering;
use std::fmt;

/// A number appearing in an expression.
///
/// Arithmetic is exact while the numerator and denominator fit in an `i64`.
/// On overflow the result silently degrades to a float.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Number {
    /// A reduced fraction with a strictly positive denominator.
    Rational(i64, i64),
    Float(f64),
}

impl Number {
    pub const ZERO: Number = Number::Rational(0, 1);
    pub const ONE: Number = Number::Rational(1, 1);
    pub const MINUS_ONE: Number = Number::Rational(-1, 1);

    pub fn integer(n: i64) -> Number {
        Number::Rational(n, 1)
    }

    /// Builds the reduced fraction `numerator/denominator`.
    ///
    /// A zero denominator produces a NaN float.
    pub fn rational(numerator: i64, denominator: i64) -> Number {
        Self::from_i128(numerator as i128, denominator as i128)
    }

    fn from_i128(numerator: i128, denominator: i128) -> Number {
        if denominator == 0 {
            return Number::Float(f64::NAN);
        }
        let (mut n, mut d) = if denominator < 0 {
            (-numerator, -denominator)
        } else {
            (numerator, denominator)
        };
        let g = gcd(n.abs(), d);
        if g > 1 {
            n /= g;
            d /= g;
        }
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(n), Ok(d)) => Number::Rational(n, d),
            _ => Number::Float(n as f64 / d as f64),
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Rational(n, d) => n as f64 / d as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Rational(n, _) => n == 0,
            Number::Float(x) => x == 0.0,
        }
    }

    pub fn is_one(self) -> bool {
        self == Number::ONE
    }

    pub fn is_negative(self) -> bool {
        self.to_f64() < 0.0
    }

    /// Returns the value if this number is an exact integer.
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Rational(n, 1) => Some(n),
            _ => None,
        }
    }

    pub fn abs(self) -> Number {
        if self.is_negative() {
            -self
        } else {
            self
        }
    }

    pub fn recip(self) -> Number {
        match self {
            Number::Rational(n, d) => Self::from_i128(d as i128, n as i128),
            Number::Float(x) => Number::Float(1.0 / x),
        }
    }

    /// Raises the number to an integer power, exactly when possible.
    pub fn pow_int(self, exponent: i64) -> Number {
        match self {
            Number::Float(x) => Number::Float(x.powf(exponent as f64)),
            Number::Rational(n, d) => {
                if exponent < 0 {
                    return self.pow_int(-exponent).recip();
                }
                match (n, d) {
                    (0 | 1, 1) if exponent > 0 => return self,
                    (-1, 1) => return Number::integer(if exponent % 2 == 0 { 1 } else { -1 }),
                    _ => {}
                }
                let mut numerator: i128 = 1;
                let mut denominator: i128 = 1;
                for _ in 0..exponent {
                    match (
                        numerator.checked_mul(n as i128),
                        denominator.checked_mul(d as i128),
                    ) {
                        (Some(a), Some(b)) if a.abs() <= i64::MAX as i128 && b <= i64::MAX as i128 => {
                            numerator = a;
                            denominator = b;
                        }
                        _ => return Number::Float(self.to_f64().powf(exponent as f64)),
                    }
                }
                Self::from_i128(numerator, denominator)
            }
        }
    }

    /// Raises the number to an arbitrary numeric power.
    ///
    /// Returns [None] when the result cannot be represented exactly and
    /// neither operand is already a float.
    pub fn pow(self, exponent: Number) -> Option<Number> {
        if let Some(k) = exponent.as_integer() {
            return Some(self.pow_int(k));
        }
        match (self, exponent) {
            (Number::Float(_), _) | (_, Number::Float(_)) => {
                Some(Number::Float(self.to_f64().powf(exponent.to_f64())))
            }
            _ => None,
        }
    }

    /// A total order that agrees with the numeric order.
    pub fn total_cmp(&self, other: &Number) -> Ordering {
        self.to_f64().total_cmp(&other.to_f64())
    }
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl std::ops::Add for Number {
    type Output = Number;
    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Rational(a, b), Number::Rational(c, d)) => Number::from_i128(
                a as i128 * d as i128 + c as i128 * b as i128,
                b as i128 * d as i128,
            ),
            _ => Number::Float(self.to_f64() + rhs.to_f64()),
        }
    }
}

impl std::ops::Mul for Number {
    type Output = Number;
    fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Rational(a, b), Number::Rational(c, d)) => {
                Number::from_i128(a as i128 * c as i128, b as i128 * d as i128)
            }
            _ => Number::Float(self.to_f64() * rhs.to_f64()),
        }
    }
}

impl std::ops::Neg for Number {
    type Output = Number;
    fn neg(self) -> Number {
        match self {
            Number::Rational(n, d) => Number::from_i128(-(n as i128), d as i128),
            Number::Float(x) => Number::Float(-x),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Rational(n, 1) => write!(f, "{n}"),
            Number::Rational(n, d) => write!(f, "{n}/{d}"),
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}
