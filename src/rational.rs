//! Exact rational numbers over `i128`.
//!
//! Every value is stored in lowest terms with a strictly positive
//! denominator, so derived equality is numeric equality. The operator impls
//! panic on overflow the same way std integer arithmetic does; the
//! `checked_*` methods report it as [`SpinError::Overflow`] instead.
//! Division is only available as [`Rational::checked_div`].

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SpinError, SpinResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i128,
    den: i128,
}

fn gcd(a: i128, b: i128) -> u128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Reduce `a` and `b` by their common divisor. The division happens on
/// magnitudes so a divisor of 2^127 (from `i128::MIN`) still cancels.
fn cancel(a: i128, b: i128) -> SpinResult<(i128, i128)> {
    let g = gcd(a, b);
    if g <= 1 {
        return Ok((a, b));
    }
    let reduce = |x: i128| -> SpinResult<i128> {
        let q = i128::try_from(x.unsigned_abs() / g).map_err(|_| SpinError::Overflow)?;
        Ok(if x < 0 { -q } else { q })
    };
    Ok((reduce(a)?, reduce(b)?))
}

fn overflow<T>(value: Option<T>) -> SpinResult<T> {
    value.ok_or(SpinError::Overflow)
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Build `num / den` in lowest terms. Fails on a zero denominator.
    pub fn new(num: i128, den: i128) -> SpinResult<Self> {
        if den == 0 {
            return Err(SpinError::ZeroDenominator);
        }
        if num == 0 {
            return Ok(Self::ZERO);
        }
        let (mut num, mut den) = cancel(num, den)?;
        if den < 0 {
            num = overflow(num.checked_neg())?;
            den = overflow(den.checked_neg())?;
        }
        Ok(Rational { num, den })
    }

    pub const fn from_integer(n: i128) -> Self {
        Rational { num: n, den: 1 }
    }

    /// `1 / n`, the weight of one outcome among `n`. `n` must be positive;
    /// use [`Rational::new`] when it may not be.
    pub fn unit_fraction(n: u32) -> Self {
        debug_assert!(n > 0, "unit fraction of zero outcomes");
        Rational {
            num: 1,
            den: i128::from(n),
        }
    }

    /// Nearest multiple of `1 / resolution` to `p`, clamped to `[0, 1]`.
    /// Keeps denominators of float-derived probabilities bounded.
    pub fn from_probability(p: f64, resolution: u32) -> Self {
        debug_assert!(resolution > 0, "probability resolution must be positive");
        let den = i128::from(resolution.max(1));
        let num = (p.clamp(0.0, 1.0) * den as f64).round() as i128;
        if num == 0 {
            return Self::ZERO;
        }
        // 0 < num <= den, so the common divisor fits and never overflows.
        let g = gcd(num, den) as i128;
        Rational {
            num: num / g,
            den: den / g,
        }
    }

    pub fn numerator(&self) -> i128 {
        self.num
    }

    pub fn denominator(&self) -> i128 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    /// True for values in the closed interval `[0, 1]`.
    pub fn is_probability(&self) -> bool {
        self.num >= 0 && self.num <= self.den
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn checked_add(self, rhs: Self) -> SpinResult<Self> {
        let g = i128::try_from(gcd(self.den, rhs.den)).map_err(|_| SpinError::Overflow)?;
        let lhs_scale = rhs.den / g;
        let rhs_scale = self.den / g;
        let num = overflow(
            self.num
                .checked_mul(lhs_scale)
                .zip(rhs.num.checked_mul(rhs_scale))
                .and_then(|(a, b)| a.checked_add(b)),
        )?;
        let den = overflow(self.den.checked_mul(lhs_scale))?;
        Self::new(num, den)
    }

    pub fn checked_sub(self, rhs: Self) -> SpinResult<Self> {
        self.checked_add(rhs.checked_neg()?)
    }

    pub fn checked_neg(self) -> SpinResult<Self> {
        Ok(Rational {
            num: overflow(self.num.checked_neg())?,
            den: self.den,
        })
    }

    pub fn checked_mul(self, rhs: Self) -> SpinResult<Self> {
        // Cross-cancel first so intermediate products stay as small as the result.
        let (a_num, b_den) = cancel(self.num, rhs.den)?;
        let (b_num, a_den) = cancel(rhs.num, self.den)?;
        let num = overflow(a_num.checked_mul(b_num))?;
        let den = overflow(a_den.checked_mul(b_den))?;
        Self::new(num, den)
    }

    pub fn checked_div(self, rhs: Self) -> SpinResult<Self> {
        if rhs.is_zero() {
            return Err(SpinError::DivisionByZero);
        }
        self.checked_mul(Self::new(rhs.den, rhs.num)?)
    }

    /// `1 - self`.
    pub fn complement(self) -> Self {
        Self::ONE - self
    }
}

fn or_panic(result: SpinResult<Rational>) -> Rational {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{}", e),
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i128> for Rational {
    fn from(n: i128) -> Self {
        Self::from_integer(n)
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Self) -> Self {
        or_panic(self.checked_add(rhs))
    }
}

impl AddAssign for Rational {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Self) -> Self {
        or_panic(self.checked_sub(rhs))
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Self) -> Self {
        or_panic(self.checked_mul(rhs))
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Self {
        or_panic(self.checked_neg())
    }
}

impl Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Compare `a_num/a_den` with `b_num/b_den` (positive denominators) by
/// expanding both as continued fractions, for operands whose cross products
/// do not fit in i128.
fn cmp_continued(
    mut a_num: i128,
    mut a_den: i128,
    mut b_num: i128,
    mut b_den: i128,
) -> Ordering {
    loop {
        let (qa, ra) = (a_num.div_euclid(a_den), a_num.rem_euclid(a_den));
        let (qb, rb) = (b_num.div_euclid(b_den), b_num.rem_euclid(b_den));
        if qa != qb {
            return qa.cmp(&qb);
        }
        match (ra == 0, rb == 0) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            // ra/a_den < rb/b_den  <=>  b_den/rb < a_den/ra
            (false, false) => (a_num, a_den, b_num, b_den) = (b_den, rb, a_den, ra),
        }
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (
            self.num.checked_mul(other.den),
            other.num.checked_mul(self.den),
        ) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => cmp_continued(self.num, self.den, other.num, other.den),
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Text and serde
// ---------------------------------------------------------------------------

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl FromStr for Rational {
    type Err = SpinError;

    /// Parse `n` or `n/d`.
    fn from_str(s: &str) -> SpinResult<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i128>()
                .map_err(|_| SpinError::InvalidRational(s.to_string()))
        };
        match s.split_once('/') {
            Some((num, den)) => Self::new(parse(num)?, parse(den)?),
            None => Ok(Self::from_integer(parse(s)?)),
        }
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rational {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
