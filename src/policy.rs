//! Spin-again policies.
//!
//! A policy maps one decision point to the probability of spinning again.
//! At a first spin of 0 the same question means "skip the first spin
//! entirely". Policies are queried mid-solve, so a [`Decision`] exposes the
//! raw table of the acting seat's own stage; every later seat has already
//! committed to its policy by then.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{SpinError, SpinResult};
use crate::outcome::{Score, Seat, WinProbs};
use crate::rational::Rational;
use crate::table::StageTable;

// ---------------------------------------------------------------------------
// Decision context
// ---------------------------------------------------------------------------

pub struct Decision<'a> {
    pub seat: Seat,
    /// Final totals of every earlier seat.
    pub observed: &'a [Score],
    /// First spin, or 0 when asking whether to skip it.
    pub spin: Score,
    pub max_spin: Score,
    table: &'a StageTable,
    first_spin_value: Option<&'a WinProbs>,
}

impl<'a> Decision<'a> {
    pub(crate) fn new(
        seat: Seat,
        observed: &'a [Score],
        spin: Score,
        max_spin: Score,
        table: &'a StageTable,
        first_spin_value: Option<&'a WinProbs>,
    ) -> Self {
        Decision {
            seat,
            observed,
            spin,
            max_spin,
            table,
            first_spin_value,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.spin == 0
    }

    /// Outcome if the seat stops at its current total.
    pub fn stand(&self) -> &WinProbs {
        self.table.get(self.observed, self.spin, false)
    }

    /// Outcome if the seat spins once more.
    pub fn spin_again(&self) -> &WinProbs {
        self.table.get(self.observed, self.spin, true)
    }

    /// Outcome of taking the first spin and following this same policy
    /// afterwards. Only present on skip decisions.
    pub fn first_spin_value(&self) -> Option<&WinProbs> {
        self.first_spin_value
    }

    /// Highest total among earlier seats, 0 for the first seat.
    pub fn leader(&self) -> Score {
        self.observed.iter().copied().max().unwrap_or(0)
    }
}

pub trait Policy {
    fn spin_probability(&self, decision: &Decision<'_>) -> Rational;

    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> Policy for F
where
    F: Fn(&Decision<'_>) -> Rational,
{
    fn spin_probability(&self, decision: &Decision<'_>) -> Rational {
        self(decision)
    }
}

fn choose(spin: bool) -> Rational {
    if spin {
        Rational::ONE
    } else {
        Rational::ZERO
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Spin again only when it strictly raises the seat's own win probability.
/// With `allow_skip`, the first spin is skipped only when standing at 0 is
/// strictly better than spinning.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalPolicy {
    pub allow_skip: bool,
}

impl Policy for OptimalPolicy {
    fn spin_probability(&self, d: &Decision<'_>) -> Rational {
        let seat = d.seat;
        if d.is_skip() {
            return match (self.allow_skip, d.first_spin_value()) {
                (true, Some(spun)) => choose(d.stand()[seat] > spun[seat]),
                _ => Rational::ZERO,
            };
        }
        choose(d.spin_again()[seat] > d.stand()[seat])
    }

    fn describe(&self) -> String {
        if self.allow_skip {
            "optimal-skip".to_string()
        } else {
            "optimal".to_string()
        }
    }
}

/// Spin again on any first spin below `stand_at`, regardless of opponents.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    pub stand_at: Score,
}

impl Policy for ThresholdPolicy {
    fn spin_probability(&self, d: &Decision<'_>) -> Rational {
        choose(!d.is_skip() && d.spin < self.stand_at)
    }

    fn describe(&self) -> String {
        format!("threshold:{}", self.stand_at)
    }
}

/// Chase the leader: spin when behind, stand when ahead, and on a tie spin
/// only if the tied total is in the lower half of the wheel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderPolicy;

impl Policy for LeaderPolicy {
    fn spin_probability(&self, d: &Decision<'_>) -> Rational {
        if d.is_skip() {
            return Rational::ZERO;
        }
        let leader = d.leader();
        if d.spin == leader {
            choose(d.spin * 2 <= d.max_spin)
        } else {
            choose(d.spin < leader)
        }
    }

    fn describe(&self) -> String {
        "leader".to_string()
    }
}

/// Spin again with the same probability after every first spin.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Rational);

impl Policy for FixedPolicy {
    fn spin_probability(&self, d: &Decision<'_>) -> Rational {
        if d.is_skip() {
            Rational::ZERO
        } else {
            self.0
        }
    }

    fn describe(&self) -> String {
        if self.0.is_one() {
            "always".to_string()
        } else if self.0.is_zero() {
            "never".to_string()
        } else {
            format!("mixed:{}", self.0)
        }
    }
}

/// Denominator grid for quantal-response probabilities.
pub const QRE_RESOLUTION: u32 = 10_000;

/// Logit quantal response around optimal play: take the better action with
/// probability `1 / (1 + exp(-lambda * gap))`, where `gap` is the seat's
/// win-probability difference between spinning again and standing.
/// `lambda = 0` is a coin flip and large `lambda` approaches optimal play.
/// An exact tie stays a coin flip at every `lambda`.
#[derive(Debug, Clone, Copy)]
pub struct QrePolicy {
    pub lambda: f64,
}

impl QrePolicy {
    pub fn new(lambda: f64) -> SpinResult<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(SpinError::InvalidPolicy(format!(
                "rationality must be a finite non-negative number, got {}",
                lambda
            )));
        }
        Ok(QrePolicy { lambda })
    }

    /// Probability of taking the better action when it is `gap` ahead.
    pub fn follow_probability(&self, gap: f64) -> f64 {
        1.0 / (1.0 + (-self.lambda * gap).exp())
    }
}

impl Policy for QrePolicy {
    fn spin_probability(&self, d: &Decision<'_>) -> Rational {
        if d.is_skip() {
            return Rational::ZERO;
        }
        let again = d.spin_again()[d.seat];
        let stand = d.stand()[d.seat];
        let gap = (again.to_f64() - stand.to_f64()).abs();
        let follow = Rational::from_probability(self.follow_probability(gap), QRE_RESOLUTION);
        if again > stand {
            follow
        } else {
            follow.complement()
        }
    }

    fn describe(&self) -> String {
        format!("qre:{}", self.lambda)
    }
}

/// Force specific first spins to a fixed probability, deferring to `inner`
/// everywhere else.
pub struct Override<P> {
    pub inner: P,
    pub forced: BTreeMap<Score, Rational>,
}

impl<P: Policy> Override<P> {
    pub fn new(inner: P) -> Self {
        Override {
            inner,
            forced: BTreeMap::new(),
        }
    }

    pub fn force(mut self, spin: Score, probability: Rational) -> Self {
        self.forced.insert(spin, probability);
        self
    }
}

impl<P: Policy> Policy for Override<P> {
    fn spin_probability(&self, d: &Decision<'_>) -> Rational {
        match self.forced.get(&d.spin) {
            Some(&p) => p,
            None => self.inner.spin_probability(d),
        }
    }

    fn describe(&self) -> String {
        let forced: Vec<String> = self
            .forced
            .iter()
            .map(|(spin, p)| format!("{}={}", spin, p))
            .collect();
        format!("{} [{}]", self.inner.describe(), forced.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Named policies
// ---------------------------------------------------------------------------

/// Textual policy selection used by the CLI and JSON output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicySpec {
    Optimal,
    OptimalSkip,
    Threshold(Score),
    Leader,
    Always,
    Never,
    Mixed(Rational),
    Qre(f64),
}

impl PolicySpec {
    pub fn build(&self) -> Box<dyn Policy> {
        match *self {
            PolicySpec::Optimal => Box::new(OptimalPolicy { allow_skip: false }),
            PolicySpec::OptimalSkip => Box::new(OptimalPolicy { allow_skip: true }),
            PolicySpec::Threshold(stand_at) => Box::new(ThresholdPolicy { stand_at }),
            PolicySpec::Leader => Box::new(LeaderPolicy),
            PolicySpec::Always => Box::new(FixedPolicy(Rational::ONE)),
            PolicySpec::Never => Box::new(FixedPolicy(Rational::ZERO)),
            PolicySpec::Mixed(p) => Box::new(FixedPolicy(p)),
            PolicySpec::Qre(lambda) => Box::new(QrePolicy { lambda }),
        }
    }
}

impl fmt::Display for PolicySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySpec::Optimal => write!(f, "optimal"),
            PolicySpec::OptimalSkip => write!(f, "optimal-skip"),
            PolicySpec::Threshold(n) => write!(f, "threshold:{}", n),
            PolicySpec::Leader => write!(f, "leader"),
            PolicySpec::Always => write!(f, "always"),
            PolicySpec::Never => write!(f, "never"),
            PolicySpec::Mixed(p) => write!(f, "mixed:{}", p),
            PolicySpec::Qre(lambda) => write!(f, "qre:{}", lambda),
        }
    }
}

impl FromStr for PolicySpec {
    type Err = SpinError;

    fn from_str(s: &str) -> SpinResult<Self> {
        let lower = s.trim().to_lowercase();
        let (kind, arg) = match lower.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (lower.as_str(), None),
        };
        let missing = || SpinError::InvalidPolicy(format!("'{}' needs an argument", s));
        match (kind, arg) {
            ("optimal", None) => Ok(PolicySpec::Optimal),
            ("optimal-skip", None) => Ok(PolicySpec::OptimalSkip),
            ("leader", None) => Ok(PolicySpec::Leader),
            ("always", None) => Ok(PolicySpec::Always),
            ("never", None) => Ok(PolicySpec::Never),
            ("threshold", Some(n)) => n
                .parse::<Score>()
                .map(PolicySpec::Threshold)
                .map_err(|_| SpinError::InvalidPolicy(format!("bad threshold in '{}'", s))),
            ("mixed", Some(p)) => {
                let p: Rational = p.parse()?;
                if !p.is_probability() {
                    return Err(SpinError::InvalidPolicy(format!(
                        "mixed probability {} is outside [0, 1]",
                        p
                    )));
                }
                Ok(PolicySpec::Mixed(p))
            }
            ("qre", Some(lambda)) => {
                let lambda: f64 = lambda
                    .parse()
                    .map_err(|_| SpinError::InvalidPolicy(format!("bad rationality in '{}'", s)))?;
                Ok(PolicySpec::Qre(QrePolicy::new(lambda)?.lambda))
            }
            ("threshold", None) | ("mixed", None) | ("qre", None) => Err(missing()),
            _ => Err(SpinError::InvalidPolicy(format!(
                "unknown policy '{}' (expected optimal, optimal-skip, threshold:N, leader, \
                 always, never, mixed:P, qre:L)",
                s
            ))),
        }
    }
}

impl Serialize for PolicySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Lineup
// ---------------------------------------------------------------------------

/// One policy per seat.
pub struct Lineup {
    pub first: Box<dyn Policy>,
    pub second: Box<dyn Policy>,
    pub third: Box<dyn Policy>,
}

impl Lineup {
    pub fn new(first: Box<dyn Policy>, second: Box<dyn Policy>, third: Box<dyn Policy>) -> Self {
        Lineup {
            first,
            second,
            third,
        }
    }

    /// Optimal play everywhere, always taking the first spin.
    pub fn optimal() -> Self {
        Self::from_specs([PolicySpec::Optimal; 3])
    }

    /// Optimal play with the skip decision optimized as well.
    pub fn optimal_with_skip() -> Self {
        Self::from_specs([PolicySpec::OptimalSkip; 3])
    }

    pub fn from_specs(specs: [PolicySpec; 3]) -> Self {
        let [first, second, third] = specs;
        Lineup::new(first.build(), second.build(), third.build())
    }

    pub fn for_seat(&self, seat: Seat) -> &dyn Policy {
        match seat {
            Seat::First => self.first.as_ref(),
            Seat::Second => self.second.as_ref(),
            Seat::Third => self.third.as_ref(),
        }
    }

    pub fn describe(&self) -> [String; 3] {
        Seat::ALL.map(|seat| self.for_seat(seat).describe())
    }
}

impl Default for Lineup {
    fn default() -> Self {
        Self::optimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_spec() {
        assert_eq!("optimal".parse::<PolicySpec>().unwrap(), PolicySpec::Optimal);
        assert_eq!(
            "Optimal-Skip".parse::<PolicySpec>().unwrap(),
            PolicySpec::OptimalSkip
        );
        assert_eq!(
            "threshold:14".parse::<PolicySpec>().unwrap(),
            PolicySpec::Threshold(14)
        );
        assert_eq!("leader".parse::<PolicySpec>().unwrap(), PolicySpec::Leader);
        assert_eq!(
            "mixed:9/10".parse::<PolicySpec>().unwrap(),
            PolicySpec::Mixed(Rational::new(9, 10).unwrap())
        );
    }

    #[test]
    fn rejects_bad_specs() {
        assert!("threshold".parse::<PolicySpec>().is_err());
        assert!("threshold:x".parse::<PolicySpec>().is_err());
        assert!("mixed:3/2".parse::<PolicySpec>().is_err());
        assert!("mixed:1/0".parse::<PolicySpec>().is_err());
        assert!("greedy".parse::<PolicySpec>().is_err());
        assert!("qre".parse::<PolicySpec>().is_err());
        assert!("qre:-1".parse::<PolicySpec>().is_err());
        assert!("qre:nan".parse::<PolicySpec>().is_err());
        assert!("qre:inf".parse::<PolicySpec>().is_err());
    }

    #[test]
    fn parses_quantal_response() {
        assert_eq!("qre:15".parse::<PolicySpec>().unwrap(), PolicySpec::Qre(15.0));
        assert_eq!(PolicySpec::Qre(0.5).to_string(), "qre:0.5");
        assert_eq!(PolicySpec::Qre(15.0).build().describe(), "qre:15");
    }

    #[test]
    fn follow_probability_rises_with_gap() {
        let policy = QrePolicy::new(11.0).unwrap();
        assert_eq!(policy.follow_probability(0.0), 0.5);
        let small = policy.follow_probability(0.05);
        let large = policy.follow_probability(0.3);
        assert!(0.5 < small && small < large && large < 1.0);
        assert_eq!(QrePolicy::new(0.0).unwrap().follow_probability(0.9), 0.5);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let spec = PolicySpec::Mixed(Rational::new(1, 3).unwrap());
        assert_eq!(spec.to_string(), "mixed:1/3");
        assert_eq!(spec.to_string().parse::<PolicySpec>().unwrap(), spec);
    }

    #[test]
    fn lineup_describes_each_seat() {
        let lineup = Lineup::from_specs([
            PolicySpec::Threshold(14),
            PolicySpec::Leader,
            PolicySpec::OptimalSkip,
        ]);
        assert_eq!(
            lineup.describe(),
            [
                "threshold:14".to_string(),
                "leader".to_string(),
                "optimal-skip".to_string()
            ]
        );
    }
}
