//! Backward-induction solver.
//!
//! Stages run last seat first. Each stage builds a raw table for every
//! hypothetical `(observed totals, first spin, spin again)` and then folds
//! the seat's own first spin and policy into a table keyed only by what
//! the previous seat leaves behind. The next stage down uses that folded
//! table as its terminal lookup, so earlier seats always face later seats
//! that have already committed to their policies.
//!
//! Every cell of every table must sum to exactly 1; a violation is a bug
//! in the recurrence and aborts the solve.

use std::time::Instant;

use serde::Serialize;

use crate::config::{FirstAction, GameConfig};
use crate::error::{SpinError, SpinResult};
use crate::outcome::{resolve_total, spin_outcomes, spinoff_split, Score, Seat, WinProbs};
use crate::policy::{Decision, Lineup, Policy};
use crate::rational::Rational;
use crate::strategy::Strategy;
use crate::table::{observed_states, DecisionTable, FoldedTable, StageTable};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tables produced for one seat.
#[derive(Debug, Clone)]
pub struct StageSolution {
    pub raw: StageTable,
    pub decisions: DecisionTable,
    pub folded: FoldedTable,
}

/// Everything one solve produced. Immutable; a different lineup needs a
/// fresh solve.
#[derive(Debug, Clone)]
pub struct Solution {
    config: GameConfig,
    policies: [String; 3],
    stages: [StageSolution; 3],
}

/// Serializable result of a solve.
#[derive(Debug, Clone, Serialize)]
pub struct SolveSummary {
    pub max_spin: Score,
    pub policies: [String; 3],
    pub win_probabilities: WinProbs,
    pub approximate: [f64; 3],
}

// ---------------------------------------------------------------------------
// Solve
// ---------------------------------------------------------------------------

/// Solve the game for `lineup`, building every table from scratch.
pub fn solve(config: &GameConfig, lineup: &Lineup) -> SpinResult<Solution> {
    config.validate()?;
    let start = Instant::now();

    let third = solve_stage(
        config,
        Seat::Third,
        lineup.for_seat(Seat::Third),
        |observed, total| spinoff_split([observed[0], observed[1], total]),
    )?;
    let second = solve_stage(
        config,
        Seat::Second,
        lineup.for_seat(Seat::Second),
        |observed, total| *third.folded.get(&[observed[0], total]),
    )?;
    let first = solve_stage(
        config,
        Seat::First,
        lineup.for_seat(Seat::First),
        |_, total| *second.folded.get(&[total]),
    )?;

    let solution = Solution {
        config: *config,
        policies: lineup.describe(),
        stages: [first, second, third],
    };
    log::info!(
        "solved {}-face wheel in {:.2?}: {}",
        config.max_spin,
        start.elapsed(),
        solution.win_probabilities()
    );
    Ok(solution)
}

fn checked_probability(seat: Seat, spin: Score, value: Rational) -> SpinResult<Rational> {
    if value.is_probability() {
        Ok(value)
    } else {
        Err(SpinError::PolicyOutOfRange { seat, spin, value })
    }
}

/// Build the raw table for `seat` and fold its policy into it.
///
/// `terminal(observed, total)` is the outcome once the seat stops with
/// `total`: a direct spin-off for the last seat, the next seat's folded
/// table otherwise.
fn solve_stage<T>(
    config: &GameConfig,
    seat: Seat,
    policy: &dyn Policy,
    terminal: T,
) -> SpinResult<StageSolution>
where
    T: Fn(&[Score], Score) -> WinProbs,
{
    let start = Instant::now();
    let max = config.max_spin;
    let totals = config.totals();
    let outcomes = spin_outcomes(max);

    let raw = StageTable::build(seat, totals, |observed, spin, spin_again| {
        let probs = if spin_again {
            outcomes.clone().try_fold(WinProbs::ZERO, |acc, (face, weight)| {
                let landed = terminal(observed, resolve_total(spin, face, max));
                acc.checked_add(&landed.checked_scale(weight)?)
            })?
        } else {
            terminal(observed, spin)
        };
        let total = probs.checked_total()?;
        assert!(
            total.is_one(),
            "{} seat raw cell {:?} spin {} again {} sums to {}",
            seat,
            observed,
            spin,
            spin_again,
            total
        );
        Ok(probs)
    })?;

    let mut decisions = Vec::with_capacity(raw.len() / 2);
    let mut folded = Vec::new();
    for observed in observed_states(seat.observed(), totals) {
        let mut row = vec![Rational::ZERO; totals];

        let mut spun = WinProbs::ZERO;
        for (spin, weight) in outcomes.clone() {
            let decision = Decision::new(seat, &observed, spin, max, &raw, None);
            let p = checked_probability(seat, spin, policy.spin_probability(&decision))?;
            row[spin as usize] = p;
            let cell = WinProbs::checked_mix(
                p,
                raw.get(&observed, spin, true),
                raw.get(&observed, spin, false),
            )?;
            spun = spun.checked_add(&cell.checked_scale(weight)?)?;
        }

        // Skipping is weighed against the spin distribution, never taken outright.
        let decision = Decision::new(seat, &observed, 0, max, &raw, Some(&spun));
        let skip = checked_probability(seat, 0, policy.spin_probability(&decision))?;
        row[0] = skip;
        let cell = WinProbs::checked_mix(skip, raw.get(&observed, 0, false), &spun)?;
        let total = cell.checked_total()?;
        assert!(
            total.is_one(),
            "{} seat folded cell {:?} sums to {}",
            seat,
            observed,
            total
        );

        decisions.extend(row);
        folded.push(cell);
    }

    log::debug!(
        "{} seat: {} raw cells, {} observed states in {:.2?}",
        seat,
        raw.len(),
        folded.len(),
        start.elapsed()
    );

    Ok(StageSolution {
        decisions: DecisionTable::from_cells(seat, totals, decisions),
        folded: FoldedTable::from_cells(seat, totals, folded),
        raw,
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Solution {
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn policies(&self) -> &[String; 3] {
        &self.policies
    }

    pub fn stage(&self, seat: Seat) -> &StageSolution {
        &self.stages[seat.index()]
    }

    pub fn raw(&self, seat: Seat) -> &StageTable {
        &self.stage(seat).raw
    }

    pub fn folded(&self, seat: Seat) -> &FoldedTable {
        &self.stage(seat).folded
    }

    pub fn decisions(&self, seat: Seat) -> &DecisionTable {
        &self.stage(seat).decisions
    }

    /// Unconditional win probability of each seat under the lineup.
    pub fn win_probabilities(&self) -> WinProbs {
        *self.folded(Seat::First).get(&[])
    }

    /// Win probabilities once the first seat's first spin is known; the
    /// first seat's policy still decides whether to spin again.
    pub fn given_first_spin(&self, spin: Score) -> SpinResult<WinProbs> {
        self.check_first_spin(spin)?;
        let raw = self.raw(Seat::First);
        let p = self.decisions(Seat::First).get(&[], spin);
        WinProbs::checked_mix(p, raw.get(&[], spin, true), raw.get(&[], spin, false))
    }

    /// Win probabilities when the first seat's first spin is `spin` and it
    /// then takes `action` regardless of its policy.
    pub fn given_first_action(&self, spin: Score, action: FirstAction) -> SpinResult<WinProbs> {
        self.check_first_spin(spin)?;
        Ok(*self.raw(Seat::First).get(&[], spin, action.spins_again()))
    }

    fn check_first_spin(&self, spin: Score) -> SpinResult<()> {
        if spin == 0 || spin > self.config.max_spin {
            return Err(SpinError::InvalidConfig(format!(
                "first spin must be between 1 and {}, got {}",
                self.config.max_spin, spin
            )));
        }
        Ok(())
    }

    /// The decisions recorded during the solve, detached from the win tables.
    pub fn strategy(&self) -> Strategy {
        Strategy::new(
            self.config,
            Seat::ALL.map(|seat| self.decisions(seat).clone()),
        )
    }

    pub fn summary(&self) -> SolveSummary {
        let probs = self.win_probabilities();
        SolveSummary {
            max_spin: self.config.max_spin,
            policies: self.policies.clone(),
            win_probabilities: probs,
            approximate: probs.to_f64(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FixedPolicy, PolicySpec};

    fn r(n: i128, d: i128) -> Rational {
        Rational::new(n, d).unwrap()
    }

    #[test]
    fn two_face_wheel_by_hand() {
        // Faces {1, 2}. Nobody ever spins again, so each seat ends on its
        // first spin and the game is a three-way uniform draw.
        let config = GameConfig::new(2).unwrap();
        let lineup = Lineup::from_specs([PolicySpec::Never; 3]);
        let solution = solve(&config, &lineup).unwrap();
        let probs = solution.win_probabilities();
        assert_eq!(probs, WinProbs([r(1, 3); 3]));
    }

    #[test]
    fn out_of_range_policy_is_an_error() {
        let config = GameConfig::new(4).unwrap();
        let lineup = Lineup::new(
            Box::new(FixedPolicy(Rational::from_integer(2))),
            PolicySpec::Optimal.build(),
            PolicySpec::Optimal.build(),
        );
        match solve(&config, &lineup) {
            Err(SpinError::PolicyOutOfRange { seat, .. }) => assert_eq!(seat, Seat::First),
            other => panic!("expected PolicyOutOfRange, got {:?}", other.map(|s| s.summary())),
        }
    }

    #[test]
    fn given_first_spin_rejects_zero() {
        let config = GameConfig::new(4).unwrap();
        let solution = solve(&config, &Lineup::optimal()).unwrap();
        assert!(solution.given_first_spin(0).is_err());
        assert!(solution.given_first_spin(5).is_err());
        assert!(solution.given_first_spin(4).is_ok());
    }

    #[test]
    fn forced_action_brackets_policy_choice() {
        let config = GameConfig::new(6).unwrap();
        let solution = solve(&config, &Lineup::optimal()).unwrap();
        for spin in 1..=6 {
            let stand = solution.given_first_action(spin, FirstAction::Stand).unwrap();
            let again = solution
                .given_first_action(spin, FirstAction::SpinAgain)
                .unwrap();
            let chosen = solution.given_first_spin(spin).unwrap();
            let best = stand[Seat::First].max(again[Seat::First]);
            assert_eq!(chosen[Seat::First], best, "spin {}", spin);
        }
        assert!(solution.given_first_action(7, FirstAction::Stand).is_err());
    }

    #[test]
    fn given_first_spin_averages_to_unconditional() {
        let config = GameConfig::new(6).unwrap();
        let solution = solve(&config, &Lineup::optimal()).unwrap();
        let mut avg = WinProbs::ZERO;
        for (spin, weight) in spin_outcomes(6) {
            avg += solution.given_first_spin(spin).unwrap().scale(weight);
        }
        assert_eq!(avg, solution.win_probabilities());
    }
}
