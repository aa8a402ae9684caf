//! Tests for the backward-induction solver.
//!
//! Exact values for the 20-face wheel were cross-checked against an
//! independent fraction-based evaluation of the same recurrence.

use once_cell::sync::Lazy;

use showdown_solver::config::GameConfig;
use showdown_solver::error::SpinError;
use showdown_solver::outcome::{Seat, WinProbs};
use showdown_solver::policy::{Decision, Lineup, OptimalPolicy, Override, PolicySpec};
use showdown_solver::rational::Rational;
use showdown_solver::solver::{solve, Solution};
use showdown_solver::table::observed_states;

static OPTIMAL: Lazy<Solution> =
    Lazy::new(|| solve(&GameConfig::default(), &Lineup::optimal()).unwrap());

fn r(n: i128, d: i128) -> Rational {
    Rational::new(n, d).unwrap()
}

fn thirds() -> WinProbs {
    WinProbs([r(1, 3); 3])
}

// ---------------------------------------------------------------------------
// End-to-end values
// ---------------------------------------------------------------------------

#[test]
fn optimal_play_exact_probabilities() {
    let probs = OPTIMAL.win_probabilities();
    assert_eq!(probs.get(Seat::First), r(6311, 20480));
    assert_eq!(probs.get(Seat::Second), r(42188819, 128000000));
    assert_eq!(probs.get(Seat::Third), r(46367431, 128000000));
    assert!(probs.is_normalized());
}

#[test]
fn later_seats_are_advantaged() {
    let probs = OPTIMAL.win_probabilities();
    assert!(probs[Seat::Third] > probs[Seat::Second]);
    assert!(probs[Seat::Second] > probs[Seat::First]);
    assert_eq!(probs.total(), Rational::ONE);
}

#[test]
fn small_wheels_by_hand() {
    let one = solve(&GameConfig::new(1).unwrap(), &Lineup::optimal()).unwrap();
    assert_eq!(one.win_probabilities(), thirds());

    let two = solve(&GameConfig::new(2).unwrap(), &Lineup::optimal()).unwrap();
    assert_eq!(
        two.win_probabilities(),
        WinProbs([r(21, 64), r(21, 64), r(11, 32)])
    );

    let six = solve(&GameConfig::new(6).unwrap(), &Lineup::optimal()).unwrap();
    assert_eq!(
        six.win_probabilities(),
        WinProbs([r(87853, 279936), r(23113, 69984), r(99631, 279936)])
    );
}

#[test]
fn identical_heuristics_split_evenly() {
    for spec in [PolicySpec::Never, PolicySpec::Always, PolicySpec::Threshold(14)] {
        let solution = solve(&GameConfig::default(), &Lineup::from_specs([spec; 3])).unwrap();
        assert_eq!(solution.win_probabilities(), thirds(), "lineup {}", spec);
    }
}

#[test]
fn leader_chasing_lineup() {
    let lineup = Lineup::from_specs([
        PolicySpec::Threshold(14),
        PolicySpec::Leader,
        PolicySpec::Leader,
    ]);
    let solution = solve(&GameConfig::default(), &lineup).unwrap();
    assert_eq!(
        solution.win_probabilities(),
        WinProbs([r(14759951, 48000000), r(3604337, 12000000), r(18822701, 48000000)])
    );
}

#[test]
fn fixed_first_spin_value() {
    let probs = OPTIMAL.given_first_spin(10).unwrap();
    assert_eq!(
        probs,
        WinProbs([r(125959, 640000), r(48267, 128000), r(136353, 320000)])
    );
}

// ---------------------------------------------------------------------------
// Table invariants
// ---------------------------------------------------------------------------

#[test]
fn every_cell_sums_to_one() {
    for seat in Seat::ALL {
        for cell in OPTIMAL.raw(seat).cells() {
            assert!(cell.is_normalized(), "{} raw cell {}", seat, cell);
        }
        for cell in OPTIMAL.folded(seat).cells() {
            assert!(cell.is_normalized(), "{} folded cell {}", seat, cell);
        }
    }
}

#[test]
fn table_sizes_follow_observed_state() {
    assert_eq!(OPTIMAL.raw(Seat::Third).len(), 21 * 21 * 21 * 2);
    assert_eq!(OPTIMAL.raw(Seat::Second).len(), 21 * 21 * 2);
    assert_eq!(OPTIMAL.raw(Seat::First).len(), 21 * 2);
    assert_eq!(OPTIMAL.folded(Seat::Third).len(), 21 * 21);
    assert_eq!(OPTIMAL.folded(Seat::Second).len(), 21);
    assert_eq!(OPTIMAL.folded(Seat::First).len(), 1);
}

#[test]
fn ties_only_credit_contenders() {
    let raw = OPTIMAL.raw(Seat::Third);
    for state in observed_states(2, 21) {
        let (p1, p2) = (state[0], state[1]);
        let best = p1.max(p2);
        if best == 0 {
            continue;
        }
        let cell = raw.get(&state, best, false);
        let expected_share = if p1 == p2 { r(1, 3) } else { r(1, 2) };
        assert_eq!(cell[Seat::Third], expected_share, "state {:?}", state);
        if p1 != p2 {
            let loser = if p1 > p2 { Seat::Second } else { Seat::First };
            assert_eq!(cell[loser], Rational::ZERO, "state {:?}", state);
        }
    }
}

#[test]
fn all_bust_is_three_way_tie() {
    let raw = OPTIMAL.raw(Seat::Third);
    // Standing on zero behind two busted players.
    assert_eq!(*raw.get(&[0, 0], 0, false), thirds());
    // Spinning again from 20 always busts.
    assert_eq!(*raw.get(&[0, 0], 20, true), thirds());
}

#[test]
fn busted_third_seat_hands_win_to_leader() {
    let raw = OPTIMAL.raw(Seat::Third);
    let cell = raw.get(&[7, 3], 20, true);
    assert_eq!(*cell, WinProbs([Rational::ONE, Rational::ZERO, Rational::ZERO]));
}

#[test]
fn second_seat_stand_reads_third_seat_folded_table() {
    for p1 in 0..=20 {
        for spin in 0..=20 {
            assert_eq!(
                OPTIMAL.raw(Seat::Second).get(&[p1], spin, false),
                OPTIMAL.folded(Seat::Third).get(&[p1, spin])
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Policy folding
// ---------------------------------------------------------------------------

#[test]
fn indifferent_decision_stands() {
    // Tied with the leader at 10: standing and spinning both win exactly half.
    let raw = OPTIMAL.raw(Seat::Third);
    assert_eq!(raw.get(&[10, 5], 10, false)[Seat::Third], r(1, 2));
    assert_eq!(raw.get(&[10, 5], 10, true)[Seat::Third], r(1, 2));
    assert_eq!(OPTIMAL.decisions(Seat::Third).get(&[10, 5], 10), Rational::ZERO);
}

#[test]
fn explicit_zero_skip_matches_forced_first_spin() {
    let forced = |inner: OptimalPolicy| Box::new(Override::new(inner).force(0, Rational::ZERO));
    let lineup = Lineup::new(
        forced(OptimalPolicy { allow_skip: true }),
        forced(OptimalPolicy { allow_skip: true }),
        forced(OptimalPolicy { allow_skip: true }),
    );
    let solution = solve(&GameConfig::default(), &lineup).unwrap();
    assert_eq!(solution.win_probabilities(), OPTIMAL.win_probabilities());
}

#[test]
fn skipping_everywhere_is_an_all_bust_tie() {
    let skip = || Box::new(Override::new(OptimalPolicy::default()).force(0, Rational::ONE));
    let lineup = Lineup::new(skip(), skip(), skip());
    let solution = solve(&GameConfig::default(), &lineup).unwrap();
    assert_eq!(solution.win_probabilities(), thirds());
}

#[test]
fn option_to_skip_never_hurts() {
    let with_skip = solve(&GameConfig::default(), &Lineup::optimal_with_skip()).unwrap();
    let forced = OPTIMAL.win_probabilities();
    for seat in Seat::ALL {
        assert!(
            with_skip.win_probabilities()[seat] >= forced[seat],
            "{} seat lost value with the option to skip",
            seat
        );
    }
    // Skipping is never strictly better here, so the solve matches exactly.
    assert_eq!(with_skip.win_probabilities(), forced);
    for seat in Seat::ALL {
        for state in observed_states(seat.observed(), 21) {
            assert_eq!(with_skip.decisions(seat).get(&state, 0), Rational::ZERO);
        }
    }
}

#[test]
fn mixed_policy_is_linear_in_its_probability() {
    let p = r(1, 3);
    let solve_first = |spec: PolicySpec| {
        let lineup = Lineup::from_specs([spec, PolicySpec::Optimal, PolicySpec::Optimal]);
        solve(&GameConfig::default(), &lineup)
            .unwrap()
            .win_probabilities()
    };
    let mixed = solve_first(PolicySpec::Mixed(p));
    let always = solve_first(PolicySpec::Always);
    let never = solve_first(PolicySpec::Never);
    assert_eq!(mixed, WinProbs::mix(p, &always, &never));
    assert!(mixed.is_normalized());
}

/// Third seat spins again whenever it is not already ahead.
fn chase_leader(d: &Decision<'_>) -> Rational {
    if !d.is_skip() && d.spin <= d.leader() {
        Rational::ONE
    } else {
        Rational::ZERO
    }
}

#[test]
fn plain_functions_are_policies() {
    let lineup = Lineup::new(
        PolicySpec::Optimal.build(),
        PolicySpec::Optimal.build(),
        Box::new(chase_leader),
    );
    let solution = solve(&GameConfig::default(), &lineup).unwrap();
    let probs = solution.win_probabilities();
    assert!(probs.is_normalized());
    assert_eq!(solution.policies()[2], "custom");
    // Spinning on a tie at 20 throws away a share of the pot.
    assert!(probs[Seat::Third] < OPTIMAL.win_probabilities()[Seat::Third]);
}

#[test]
fn huge_mixed_denominators_report_overflow() {
    let p: Rational = "1/1000000000039".parse().unwrap();
    let lineup = Lineup::from_specs([PolicySpec::Mixed(p); 3]);
    match solve(&GameConfig::default(), &lineup) {
        Err(SpinError::Overflow) => {}
        other => panic!("expected Overflow, got {:?}", other.map(|s| s.summary())),
    }
}

#[test]
fn invalid_config_is_rejected() {
    let config = GameConfig { max_spin: 0 };
    assert!(solve(&config, &Lineup::optimal()).is_err());
}
