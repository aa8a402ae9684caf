//! Strategy lookup: the spin-again decisions a solve recorded, usable
//! without the win tables (the simulator samples from this).

use crate::config::GameConfig;
use crate::outcome::{Score, Seat};
use crate::rational::Rational;
use crate::table::{observed_states, DecisionTable};

#[derive(Debug, Clone)]
pub struct Strategy {
    config: GameConfig,
    tables: [DecisionTable; 3],
}

/// Shape of one seat's decisions at a single observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionShape {
    /// Spin again on every first spin below the value, stand from it up.
    Threshold(Score),
    /// Anything else: mixed probabilities or a non-monotone spin set.
    Irregular,
}

impl Strategy {
    pub(crate) fn new(config: GameConfig, tables: [DecisionTable; 3]) -> Self {
        Strategy { config, tables }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Probability `seat` spins again after `spin` (0: skips the first spin).
    pub fn spin_probability(&self, seat: Seat, observed: &[Score], spin: Score) -> Rational {
        self.tables[seat.index()].get(observed, spin)
    }

    pub fn skip_probability(&self, seat: Seat, observed: &[Score]) -> Rational {
        self.spin_probability(seat, observed, 0)
    }

    /// First spins on which `seat` spins again with positive probability.
    pub fn spin_set(&self, seat: Seat, observed: &[Score]) -> Vec<Score> {
        let row = self.tables[seat.index()].row(observed);
        (1..=self.config.max_spin)
            .filter(|&spin| !row[spin as usize].is_zero())
            .collect()
    }

    pub fn shape(&self, seat: Seat, observed: &[Score]) -> DecisionShape {
        let row = self.tables[seat.index()].row(observed);
        let pure = row[1..].iter().all(|p| p.is_zero() || p.is_one());
        let stand_at = row[1..]
            .iter()
            .position(|p| p.is_zero())
            .map(|i| i as Score + 1)
            .unwrap_or(self.config.max_spin + 1);
        let monotone = row[stand_at as usize..].iter().all(|p| p.is_zero());
        if pure && monotone {
            DecisionShape::Threshold(stand_at)
        } else {
            DecisionShape::Irregular
        }
    }

    /// Every observed state of `seat`, in table order.
    pub fn states(&self, seat: Seat) -> impl Iterator<Item = Vec<Score>> {
        observed_states(seat.observed(), self.config.totals())
    }
}
