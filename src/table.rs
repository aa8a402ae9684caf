//! Dense tables keyed by the totals a seat observes.
//!
//! Observed totals are laid out row-major (earliest seat most significant),
//! each state owning `width` consecutive cells.

use crate::error::SpinResult;
use crate::outcome::{Score, Seat, WinProbs};
use crate::rational::Rational;

#[derive(Debug, Clone)]
struct Grid<T> {
    observed: usize,
    totals: usize,
    width: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    fn state_count(observed: usize, totals: usize) -> usize {
        totals.pow(observed as u32)
    }

    fn offset(&self, observed: &[Score]) -> usize {
        debug_assert_eq!(observed.len(), self.observed, "wrong number of observed totals");
        let state = observed
            .iter()
            .fold(0usize, |acc, &total| acc * self.totals + total as usize);
        state * self.width
    }
}

/// Every combination of `observed` totals in `0..totals`, in table order.
pub fn observed_states(observed: usize, totals: usize) -> impl Iterator<Item = Vec<Score>> {
    (0..Grid::<()>::state_count(observed, totals)).map(move |mut state| {
        let mut digits = vec![0; observed];
        for slot in digits.iter_mut().rev() {
            *slot = (state % totals) as Score;
            state /= totals;
        }
        digits
    })
}

// ---------------------------------------------------------------------------
// Raw stage table
// ---------------------------------------------------------------------------

/// Win probabilities for a seat's hypothetical decision:
/// `(observed totals, own first spin, spin again) -> WinProbs`.
#[derive(Debug, Clone)]
pub struct StageTable {
    seat: Seat,
    grid: Grid<WinProbs>,
}

impl StageTable {
    /// Fill every cell in table order, stopping at the first error.
    pub(crate) fn build<F>(seat: Seat, totals: usize, mut cell: F) -> SpinResult<Self>
    where
        F: FnMut(&[Score], Score, bool) -> SpinResult<WinProbs>,
    {
        let states = Grid::<WinProbs>::state_count(seat.observed(), totals);
        let mut cells = Vec::with_capacity(states * totals * 2);
        for observed in observed_states(seat.observed(), totals) {
            for spin in 0..totals as Score {
                cells.push(cell(&observed, spin, false)?);
                cells.push(cell(&observed, spin, true)?);
            }
        }
        Ok(StageTable {
            seat,
            grid: Grid {
                observed: seat.observed(),
                totals,
                width: totals * 2,
                cells,
            },
        })
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn get(&self, observed: &[Score], spin: Score, spin_again: bool) -> &WinProbs {
        let base = self.grid.offset(observed);
        &self.grid.cells[base + spin as usize * 2 + usize::from(spin_again)]
    }

    pub fn len(&self) -> usize {
        self.grid.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &WinProbs> {
        self.grid.cells.iter()
    }
}

// ---------------------------------------------------------------------------
// Policy-folded table
// ---------------------------------------------------------------------------

/// Win probabilities with the seat's own spins and policy integrated out,
/// keyed only by the totals the seat observed.
#[derive(Debug, Clone)]
pub struct FoldedTable {
    seat: Seat,
    grid: Grid<WinProbs>,
}

impl FoldedTable {
    pub(crate) fn from_cells(seat: Seat, totals: usize, cells: Vec<WinProbs>) -> Self {
        debug_assert_eq!(
            cells.len(),
            Grid::<WinProbs>::state_count(seat.observed(), totals)
        );
        FoldedTable {
            seat,
            grid: Grid {
                observed: seat.observed(),
                totals,
                width: 1,
                cells,
            },
        }
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn get(&self, observed: &[Score]) -> &WinProbs {
        &self.grid.cells[self.grid.offset(observed)]
    }

    pub fn len(&self) -> usize {
        self.grid.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &WinProbs> {
        self.grid.cells.iter()
    }
}

// ---------------------------------------------------------------------------
// Recorded decisions
// ---------------------------------------------------------------------------

/// Spin-again probability the seat's policy chose at each
/// `(observed totals, first spin)`. Spin 0 holds the skip probability.
#[derive(Debug, Clone)]
pub struct DecisionTable {
    seat: Seat,
    grid: Grid<Rational>,
}

impl DecisionTable {
    pub(crate) fn from_cells(seat: Seat, totals: usize, cells: Vec<Rational>) -> Self {
        debug_assert_eq!(
            cells.len(),
            Grid::<Rational>::state_count(seat.observed(), totals) * totals
        );
        DecisionTable {
            seat,
            grid: Grid {
                observed: seat.observed(),
                totals,
                width: totals,
                cells,
            },
        }
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn get(&self, observed: &[Score], spin: Score) -> Rational {
        self.grid.cells[self.grid.offset(observed) + spin as usize]
    }

    /// Decisions for one observed state, indexed by first spin.
    pub fn row(&self, observed: &[Score]) -> &[Rational] {
        let base = self.grid.offset(observed);
        &self.grid.cells[base..base + self.grid.width]
    }
}
