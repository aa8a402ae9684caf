use thiserror::Error;

use crate::outcome::{Score, Seat};
use crate::rational::Rational;

#[derive(Error, Debug)]
pub enum SpinError {
    #[error("Denominator cannot be zero")]
    ZeroDenominator,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Rational arithmetic overflowed i128")]
    Overflow,

    #[error("Invalid rational notation: {0}")]
    InvalidRational(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("{seat} player policy returned {value} at spin {spin}, outside [0, 1]")]
    PolicyOutOfRange {
        seat: Seat,
        spin: Score,
        value: Rational,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type SpinResult<T> = Result<T, SpinError>;
