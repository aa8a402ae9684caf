use serde::{Deserialize, Serialize};

use crate::error::{SpinError, SpinResult};
use crate::outcome::Score;

/// Wheel size of the modeled game.
pub const DEFAULT_MAX_SPIN: Score = 20;

/// Largest supported wheel. Bounds the O(N^3) third-seat table and the
/// denominators of every folded probability.
pub const MAX_SUPPORTED_SPIN: Score = 50;

pub const DEFAULT_TRIALS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Highest face on the wheel; totals above it bust.
    pub max_spin: Score,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_spin: DEFAULT_MAX_SPIN,
        }
    }
}

impl GameConfig {
    pub fn new(max_spin: Score) -> SpinResult<Self> {
        let config = GameConfig { max_spin };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SpinResult<()> {
        if self.max_spin == 0 || self.max_spin > MAX_SUPPORTED_SPIN {
            return Err(SpinError::InvalidConfig(format!(
                "max spin must be between 1 and {}, got {}",
                MAX_SUPPORTED_SPIN, self.max_spin
            )));
        }
        Ok(())
    }

    /// Number of distinct totals, `0..=max_spin`.
    pub fn totals(&self) -> usize {
        self.max_spin as usize + 1
    }
}

/// What the first player does after a fixed first spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstAction {
    Stand,
    SpinAgain,
}

impl FirstAction {
    pub fn spins_again(self) -> bool {
        self == FirstAction::SpinAgain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub trials: u64,
    /// Fixed RNG seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Condition every trial on the first player's first spin.
    pub first_spin: Option<Score>,
    /// Override the first player's policy after the fixed first spin.
    pub first_action: Option<FirstAction>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            trials: DEFAULT_TRIALS,
            seed: None,
            first_spin: None,
            first_action: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self, game: &GameConfig) -> SpinResult<()> {
        if self.trials == 0 {
            return Err(SpinError::InvalidConfig(
                "trial count must be positive".to_string(),
            ));
        }
        if let Some(spin) = self.first_spin {
            if spin == 0 || spin > game.max_spin {
                return Err(SpinError::InvalidConfig(format!(
                    "first spin must be between 1 and {}, got {}",
                    game.max_spin, spin
                )));
            }
        }
        if self.first_action.is_some() && self.first_spin.is_none() {
            return Err(SpinError::InvalidConfig(
                "a forced first action needs a fixed first spin".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_twenty_face_wheel() {
        let config = GameConfig::default();
        assert_eq!(config.max_spin, 20);
        assert_eq!(config.totals(), 21);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_wheels() {
        assert!(GameConfig::new(0).is_err());
        assert!(GameConfig::new(MAX_SUPPORTED_SPIN + 1).is_err());
        assert!(GameConfig::new(MAX_SUPPORTED_SPIN).is_ok());
    }

    #[test]
    fn simulation_rejects_out_of_range_first_spin() {
        let game = GameConfig::default();
        let mut sim = SimulationConfig {
            trials: 10,
            seed: Some(1),
            first_spin: Some(21),
            first_action: None,
        };
        assert!(sim.validate(&game).is_err());
        sim.first_spin = Some(0);
        assert!(sim.validate(&game).is_err());
        sim.first_spin = Some(20);
        assert!(sim.validate(&game).is_ok());
        sim.trials = 0;
        assert!(sim.validate(&game).is_err());
    }

    #[test]
    fn forced_action_needs_fixed_spin() {
        let game = GameConfig::default();
        let mut sim = SimulationConfig {
            first_action: Some(FirstAction::Stand),
            ..SimulationConfig::default()
        };
        assert!(sim.validate(&game).is_err());
        sim.first_spin = Some(13);
        assert!(sim.validate(&game).is_ok());
        assert!(FirstAction::SpinAgain.spins_again());
        assert!(!FirstAction::Stand.spins_again());
    }
}
