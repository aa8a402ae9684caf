//! Wheel outcome model: spin faces, bust rule and spin-off splits.
//!
//! A total of 0 means the player busted (or never spun). It can only win
//! through the all-bust spin-off.

use std::fmt;
use std::ops::{Add, AddAssign, Index};

use serde::Serialize;

use crate::error::SpinResult;
use crate::rational::Rational;

/// A spin face or a player's running total.
pub type Score = u32;

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

/// Turn order. Each seat observes the final totals of every earlier seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    First,
    Second,
    Third,
}

impl Seat {
    pub const ALL: [Seat; 3] = [Seat::First, Seat::Second, Seat::Third];

    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
            Seat::Third => 2,
        }
    }

    /// Number of earlier totals this seat sees when it acts.
    pub fn observed(self) -> usize {
        self.index()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Seat::First => "first",
            Seat::Second => "second",
            Seat::Third => "third",
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Win probability triple
// ---------------------------------------------------------------------------

/// Exact win probability of each seat, indexed by [`Seat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WinProbs(pub [Rational; 3]);

impl WinProbs {
    pub const ZERO: WinProbs = WinProbs([Rational::ZERO; 3]);

    pub fn get(&self, seat: Seat) -> Rational {
        self.0[seat.index()]
    }

    pub fn total(&self) -> Rational {
        self.0.iter().sum()
    }

    pub fn is_normalized(&self) -> bool {
        self.total().is_one()
    }

    pub fn scale(&self, weight: Rational) -> WinProbs {
        WinProbs(self.0.map(|p| p * weight))
    }

    /// `weight * a + (1 - weight) * b`. Panics on overflow like the
    /// `Rational` operators; [`WinProbs::checked_mix`] reports it instead.
    pub fn mix(weight: Rational, a: &WinProbs, b: &WinProbs) -> WinProbs {
        if weight.is_zero() {
            return *b;
        }
        if weight.is_one() {
            return *a;
        }
        a.scale(weight) + b.scale(weight.complement())
    }

    /// Sum of the three entries, reporting overflow instead of panicking.
    pub fn checked_total(&self) -> SpinResult<Rational> {
        self.0
            .iter()
            .try_fold(Rational::ZERO, |acc, &p| acc.checked_add(p))
    }

    pub fn checked_scale(&self, weight: Rational) -> SpinResult<WinProbs> {
        let [a, b, c] = self.0;
        Ok(WinProbs([
            a.checked_mul(weight)?,
            b.checked_mul(weight)?,
            c.checked_mul(weight)?,
        ]))
    }

    pub fn checked_add(&self, rhs: &WinProbs) -> SpinResult<WinProbs> {
        Ok(WinProbs([
            self.0[0].checked_add(rhs.0[0])?,
            self.0[1].checked_add(rhs.0[1])?,
            self.0[2].checked_add(rhs.0[2])?,
        ]))
    }

    /// Checked form of [`WinProbs::mix`].
    pub fn checked_mix(weight: Rational, a: &WinProbs, b: &WinProbs) -> SpinResult<WinProbs> {
        if weight.is_zero() {
            return Ok(*b);
        }
        if weight.is_one() {
            return Ok(*a);
        }
        let rest = Rational::ONE.checked_sub(weight)?;
        a.checked_scale(weight)?.checked_add(&b.checked_scale(rest)?)
    }

    pub fn to_f64(&self) -> [f64; 3] {
        self.0.map(|p| p.to_f64())
    }

    /// Largest absolute per-seat gap to `other`, in floating point.
    pub fn max_abs_diff(&self, other: &WinProbs) -> f64 {
        let (a, b) = (self.to_f64(), other.to_f64());
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }
}

impl Add for WinProbs {
    type Output = WinProbs;

    fn add(self, rhs: WinProbs) -> WinProbs {
        WinProbs([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl AddAssign for WinProbs {
    fn add_assign(&mut self, rhs: WinProbs) {
        *self = *self + rhs;
    }
}

impl Index<Seat> for WinProbs {
    type Output = Rational;

    fn index(&self, seat: Seat) -> &Rational {
        &self.0[seat.index()]
    }
}

impl fmt::Display for WinProbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

// ---------------------------------------------------------------------------
// Outcome functions
// ---------------------------------------------------------------------------

/// Every face of one spin with its probability, uniform over `1..=range_max`.
/// The iterator is `Clone`, so a caller can restart it cheaply.
pub fn spin_outcomes(range_max: Score) -> impl Iterator<Item = (Score, Rational)> + Clone {
    let weight = Rational::unit_fraction(range_max);
    (1..=range_max).map(move |face| (face, weight))
}

/// Total after adding `face` to `current`; 0 when it exceeds `range_max`.
pub fn resolve_total(current: Score, face: Score, range_max: Score) -> Score {
    let total = current + face;
    if total > range_max {
        0
    } else {
        total
    }
}

/// Seats holding the maximum total. When everyone has 0 all three contend.
pub fn contenders(totals: [Score; 3]) -> Vec<Seat> {
    let best = totals.iter().copied().max().unwrap_or(0);
    Seat::ALL
        .into_iter()
        .filter(|seat| totals[seat.index()] == best)
        .collect()
}

/// Uniform spin-off among the contenders of `totals`.
pub fn spinoff_split(totals: [Score; 3]) -> WinProbs {
    let tied = contenders(totals);
    let share = Rational::unit_fraction(tied.len() as u32);
    let mut probs = WinProbs::ZERO;
    for seat in tied {
        probs.0[seat.index()] = share;
    }
    probs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
