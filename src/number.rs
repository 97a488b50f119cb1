use std::cmp::Ordering;
use std::fmt;

/// A number in the language: exact integer or inexact float.
///
/// Derived equality is strict about exactness (`Integer(2) != Float(2.0)`);
/// use [`Number::numeric_eq`] to compare by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Classifies a token as a number. An exact integer parse is always tried
    /// before the float grammar, so `"3"` never becomes `3.0`.
    pub fn parse(token: &str) -> Option<Number> {
        if let Ok(i) = token.parse::<i64>() {
            Some(Number::Integer(i))
        } else if let Ok(f) = token.parse::<f64>() {
            Some(Number::Float(f))
        } else {
            None
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    // Integer results overflow into floats instead of wrapping.
    fn combine(
        self,
        other: Number,
        exact: fn(i64, i64) -> Option<i64>,
        inexact: fn(f64, f64) -> f64,
    ) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => match exact(a, b) {
                Some(n) => Number::Integer(n),
                None => Number::Float(inexact(a as f64, b as f64)),
            },
            (a, b) => Number::Float(inexact(a.as_f64(), b.as_f64())),
        }
    }

    pub fn add(self, other: Number) -> Number {
        self.combine(other, i64::checked_add, |a, b| a + b)
    }

    pub fn sub(self, other: Number) -> Number {
        self.combine(other, i64::checked_sub, |a, b| a - b)
    }

    pub fn mul(self, other: Number) -> Number {
        self.combine(other, i64::checked_mul, |a, b| a * b)
    }

    /// True division. Always inexact; `None` when the divisor is zero.
    pub fn div(self, other: Number) -> Option<Number> {
        if other.is_zero() {
            None
        } else {
            Some(Number::Float(self.as_f64() / other.as_f64()))
        }
    }

    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    pub fn numeric_eq(self, other: Number) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            // Debug keeps the decimal point: 2.0 rather than 2
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}
