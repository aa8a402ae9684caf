//! Monte Carlo validator.
//!
//! Replays whole games by sampling the wheel and the recorded spin-again
//! probabilities. It never reads a win table, so agreement with the exact
//! solve is an independent check of the recurrence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::{FirstAction, SimulationConfig};
use crate::error::SpinResult;
use crate::outcome::{contenders, resolve_total, Score, Seat, WinProbs};
use crate::rational::Rational;
use crate::strategy::Strategy;

/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub trials: u64,
    pub seed: u64,
    pub first_spin: Option<Score>,
    pub first_action: Option<FirstAction>,
    pub wins: [u64; 3],
}

impl SimulationReport {
    /// Empirical win rates as exact fractions of the trial count.
    pub fn win_rates(&self) -> SpinResult<WinProbs> {
        let trials = i128::from(self.trials);
        let [a, b, c] = self.wins.map(i128::from);
        Ok(WinProbs([
            Rational::new(a, trials)?,
            Rational::new(b, trials)?,
            Rational::new(c, trials)?,
        ]))
    }

    /// Largest absolute gap between the empirical and `exact` rates.
    pub fn max_deviation(&self, exact: &WinProbs) -> SpinResult<f64> {
        Ok(self.win_rates()?.max_abs_diff(exact))
    }

    /// Binomial standard error of each seat's win rate.
    pub fn standard_errors(&self) -> SpinResult<[f64; 3]> {
        let n = self.trials as f64;
        Ok(self.win_rates()?.to_f64().map(|p| (p * (1.0 - p) / n).sqrt()))
    }

    /// Normal-approximation 95% interval per seat, clamped to `[0, 1]`.
    pub fn confidence_intervals(&self) -> SpinResult<[(f64, f64); 3]> {
        let rates = self.win_rates()?.to_f64();
        let errors = self.standard_errors()?;
        Ok([0, 1, 2].map(|i| {
            let half = Z_95 * errors[i];
            ((rates[i] - half).max(0.0), (rates[i] + half).min(1.0))
        }))
    }
}

/// Play `config.trials` independent games under `strategy`.
pub fn simulate(strategy: &Strategy, config: &SimulationConfig) -> SpinResult<SimulationReport> {
    config.validate(strategy.config())?;
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    log::info!(
        "simulating {} games (seed {}, first spin {:?})",
        config.trials,
        seed,
        config.first_spin
    );

    let first = config.first_spin.map(|spin| (spin, config.first_action));
    let mut wins = [0u64; 3];
    for _ in 0..config.trials {
        let winner = play_game(strategy, first, &mut rng);
        wins[winner.index()] += 1;
    }

    log::debug!("simulation wins: {:?}", wins);
    Ok(SimulationReport {
        trials: config.trials,
        seed,
        first_spin: config.first_spin,
        first_action: config.first_action,
        wins,
    })
}

/// One full game. Returns the winner after any spin-off.
///
/// `first` fixes the first player's first spin and, optionally, what they
/// do next instead of following the recorded decision.
pub fn play_game<R: Rng>(
    strategy: &Strategy,
    first: Option<(Score, Option<FirstAction>)>,
    rng: &mut R,
) -> Seat {
    let mut totals = [0 as Score; 3];
    for seat in Seat::ALL {
        let observed = totals;
        let fixed = if seat == Seat::First { first } else { None };
        totals[seat.index()] = take_turn(strategy, seat, &observed[..seat.index()], fixed, rng);
    }
    let tied = contenders(totals);
    tied[rng.gen_range(0..tied.len())]
}

fn take_turn<R: Rng>(
    strategy: &Strategy,
    seat: Seat,
    observed: &[Score],
    fixed: Option<(Score, Option<FirstAction>)>,
    rng: &mut R,
) -> Score {
    let max = strategy.config().max_spin;
    let (spin, forced) = match fixed {
        Some(fixed) => fixed,
        None => {
            if sample(rng, strategy.skip_probability(seat, observed)) {
                return 0;
            }
            (rng.gen_range(1..=max), None)
        }
    };
    let spin_again = match forced {
        Some(action) => action.spins_again(),
        None => sample(rng, strategy.spin_probability(seat, observed, spin)),
    };
    if spin_again {
        resolve_total(spin, rng.gen_range(1..=max), max)
    } else {
        spin
    }
}

/// Bernoulli draw with an exact rational success probability.
fn sample<R: Rng>(rng: &mut R, p: Rational) -> bool {
    if p.is_zero() {
        return false;
    }
    if p.is_one() {
        return true;
    }
    rng.gen_range(0..p.denominator()) < p.numerator()
}
