use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::config::{
    FirstAction, GameConfig, SimulationConfig, DEFAULT_MAX_SPIN, DEFAULT_TRIALS,
};
use crate::display::{
    chart_table, comparison_table, print_error, print_section, simulation_table, sweep_table,
    win_table, SweepRow,
};
use crate::outcome::{Score, Seat};
use crate::policy::{Lineup, PolicySpec, QrePolicy};
use crate::simulation::simulate;
use crate::solver::{solve, Solution};

#[derive(Parser)]
#[command(
    name = "showdown",
    version = "1.0.0",
    about = "Exact win probabilities and optimal spin-again policies \
             for the three-player wheel game."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeatArg {
    First,
    Second,
    Third,
}

impl SeatArg {
    fn seat(self) -> Seat {
        match self {
            SeatArg::First => Seat::First,
            SeatArg::Second => Seat::Second,
            SeatArg::Third => Seat::Third,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Stand,
    SpinAgain,
}

impl ActionArg {
    fn action(self) -> FirstAction {
        match self {
            ActionArg::Stand => FirstAction::Stand,
            ActionArg::SpinAgain => FirstAction::SpinAgain,
        }
    }
}

/// Wheel size and one policy per seat.
#[derive(Args, Clone)]
struct GameArgs {
    /// Highest face on the wheel
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_SPIN)]
    max_spin: Score,
    /// First player's policy (optimal, optimal-skip, threshold:N, leader, always, never,
    /// mixed:P, qre:L)
    #[arg(long, default_value = "optimal")]
    first: PolicySpec,
    /// Second player's policy
    #[arg(long, default_value = "optimal")]
    second: PolicySpec,
    /// Third player's policy
    #[arg(long, default_value = "optimal")]
    third: PolicySpec,
}

impl GameArgs {
    fn specs(&self) -> [PolicySpec; 3] {
        [self.first, self.second, self.third]
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the game exactly and print each seat's win probability
    Solve {
        #[command(flatten)]
        game: GameArgs,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Monte Carlo check of a solved lineup
    Simulate {
        #[command(flatten)]
        game: GameArgs,
        /// Number of simulated games
        #[arg(short, long, default_value_t = DEFAULT_TRIALS)]
        trials: u64,
        /// RNG seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Fix the first player's first spin
        #[arg(long)]
        first_spin: Option<Score>,
        /// Force the first player's move after the fixed first spin
        #[arg(long, requires = "first_spin")]
        first_action: Option<ActionArg>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show on which first spins a seat spins again
    Chart {
        #[command(flatten)]
        game: GameArgs,
        /// Seat to chart
        #[arg(short, long, default_value = "first")]
        seat: SeatArg,
    },
    /// Compare the forced-first-spin optimal lineup against another lineup
    Compare {
        #[command(flatten)]
        game: GameArgs,
    },
    /// Exact first-player stand/spin values as one seat's rationality varies
    Sweep {
        #[command(flatten)]
        game: GameArgs,
        /// The first player's fixed first spin
        #[arg(long)]
        first_spin: Score,
        /// Seat that plays the quantal-response policy
        #[arg(short, long, default_value = "second")]
        seat: SeatArg,
        /// Rationality values to sweep
        #[arg(long, value_delimiter = ',', default_values_t = [0.5, 2.0, 8.0, 32.0, 128.0])]
        lambdas: Vec<f64>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

pub fn run_with_args(args: Vec<String>) {
    let cli = Cli::parse_from(args);
    dispatch(cli);
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // A second init (repeated run_with_args) keeps the first logger.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .try_init();
}

fn dispatch(cli: Cli) {
    init_logging(cli.verbose);
    match cli.command {
        Commands::Solve { game, json } => cmd_solve(&game, json),
        Commands::Simulate {
            game,
            trials,
            seed,
            first_spin,
            first_action,
            json,
        } => cmd_simulate(
            &game,
            SimulationConfig {
                trials,
                seed,
                first_spin,
                first_action: first_action.map(ActionArg::action),
            },
            json,
        ),
        Commands::Chart { game, seat } => cmd_chart(&game, seat.seat()),
        Commands::Compare { game } => cmd_compare(&game),
        Commands::Sweep {
            game,
            first_spin,
            seat,
            lambdas,
        } => cmd_sweep(&game, first_spin, seat.seat(), &lambdas),
    }
}

fn solve_game(game: &GameArgs) -> Option<Solution> {
    let config = match GameConfig::new(game.max_spin) {
        Ok(c) => c,
        Err(e) => {
            print_error(&e.to_string());
            return None;
        }
    };
    match solve(&config, &Lineup::from_specs(game.specs())) {
        Ok(solution) => Some(solution),
        Err(e) => {
            print_error(&e.to_string());
            None
        }
    }
}

fn print_banner(action: &str, game: &GameArgs) {
    println!();
    println!(
        "  {} {} {}-face wheel | first: {} | second: {} | third: {}",
        "Showdown".bold(),
        action,
        game.max_spin,
        game.first,
        game.second,
        game.third,
    );
    println!();
}

fn cmd_solve(game: &GameArgs, json: bool) {
    let solution = match solve_game(game) {
        Some(s) => s,
        None => return,
    };

    if json {
        match serde_json::to_string_pretty(&solution.summary()) {
            Ok(text) => println!("{}", text),
            Err(e) => print_error(&e.to_string()),
        }
        return;
    }

    print_banner("Solved", game);
    println!(
        "{}",
        win_table(&solution.win_probabilities(), solution.policies())
    );
    println!();
}

fn cmd_simulate(game: &GameArgs, sim: SimulationConfig, json: bool) {
    let solution = match solve_game(game) {
        Some(s) => s,
        None => return,
    };

    let exact = match (sim.first_spin, sim.first_action) {
        (Some(spin), Some(action)) => solution.given_first_action(spin, action),
        (Some(spin), None) => solution.given_first_spin(spin),
        (None, _) => Ok(solution.win_probabilities()),
    };
    let exact = match exact {
        Ok(p) => p,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };

    if !json {
        print_banner("Simulating", game);
        println!("  {} games...", sim.trials);
    }

    let report = match simulate(&solution.strategy(), &sim) {
        Ok(r) => r,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };
    let estimates = report.win_rates().and_then(|rates| {
        Ok((
            rates,
            report.standard_errors()?,
            report.confidence_intervals()?,
        ))
    });
    let (rates, errors, intervals) = match estimates {
        Ok(e) => e,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };
    let deviation = rates.max_abs_diff(&exact);

    if json {
        let doc = serde_json::json!({
            "max_spin": game.max_spin,
            "policies": game.specs(),
            "report": report,
            "win_rates": rates,
            "standard_errors": errors,
            "ci95": intervals,
            "exact": exact,
            "max_deviation": deviation,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => print_error(&e.to_string()),
        }
        return;
    }

    let table = match simulation_table(&report, &exact) {
        Ok(t) => t,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };
    println!();
    println!("{}", table);
    println!();
    println!(
        "  Seed {} | max deviation {:.5}",
        report.seed.to_string().dimmed(),
        deviation
    );
    println!();
}

fn cmd_chart(game: &GameArgs, seat: Seat) {
    let solution = match solve_game(game) {
        Some(s) => s,
        None => return,
    };

    print_banner("Charting", game);
    println!(
        "  {}",
        format!("{} player decisions ({})", seat, solution.policies()[seat.index()]).bold()
    );
    println!();
    println!("{}", chart_table(&solution.strategy(), seat));
    println!();
}

fn cmd_compare(game: &GameArgs) {
    let mut baseline_args = game.clone();
    baseline_args.first = PolicySpec::Optimal;
    baseline_args.second = PolicySpec::Optimal;
    baseline_args.third = PolicySpec::Optimal;

    // With every seat left at the default, compare against the skip-aware lineup.
    let mut other_args = game.clone();
    if other_args.specs() == baseline_args.specs() {
        other_args.first = PolicySpec::OptimalSkip;
        other_args.second = PolicySpec::OptimalSkip;
        other_args.third = PolicySpec::OptimalSkip;
    }

    let baseline = match solve_game(&baseline_args) {
        Some(s) => s,
        None => return,
    };
    let other = match solve_game(&other_args) {
        Some(s) => s,
        None => return,
    };

    print_banner("Comparing against", &other_args);
    println!(
        "{}",
        comparison_table(
            "optimal",
            &baseline.win_probabilities(),
            &other.policies().join(" / "),
            &other.win_probabilities(),
        )
    );

    let gains: Vec<String> = Seat::ALL
        .iter()
        .filter(|&&seat| other.win_probabilities()[seat] > baseline.win_probabilities()[seat])
        .map(|seat| seat.to_string())
        .collect();
    let verdict = if gains.is_empty() {
        "no seat improves on optimal play".to_string()
    } else {
        format!("improves for: {}", gains.join(", "))
    };
    print_section("Verdict", &verdict);
    println!();
}

fn cmd_sweep(game: &GameArgs, first_spin: Score, seat: Seat, lambdas: &[f64]) {
    let mut rows = Vec::with_capacity(lambdas.len());
    let mut args = game.clone();
    for &lambda in lambdas {
        let spec = PolicySpec::Qre(lambda);
        match seat {
            Seat::First => args.first = spec,
            Seat::Second => args.second = spec,
            Seat::Third => args.third = spec,
        }
        if let Err(e) = QrePolicy::new(lambda) {
            print_error(&e.to_string());
            return;
        }
        let solution = match solve_game(&args) {
            Some(s) => s,
            None => return,
        };
        let values = solution
            .given_first_action(first_spin, FirstAction::Stand)
            .and_then(|stand| {
                Ok((stand, solution.given_first_action(first_spin, FirstAction::SpinAgain)?))
            });
        match values {
            Ok((stand, spin_again)) => rows.push(SweepRow {
                lambda,
                stand: stand[Seat::First],
                spin_again: spin_again[Seat::First],
            }),
            Err(e) => {
                print_error(&e.to_string());
                return;
            }
        }
    }

    print_banner("Sweeping", &args);
    println!(
        "  {}",
        format!("First player on {} while the {} player varies rationality", first_spin, seat)
            .bold()
    );
    println!();
    println!("{}", sweep_table(&rows));
    println!();
}
