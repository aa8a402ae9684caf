use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use itertools::Itertools;

use crate::error::SpinResult;
use crate::outcome::{Score, Seat, WinProbs};
use crate::rational::Rational;
use crate::simulation::SimulationReport;
use crate::strategy::{DecisionShape, Strategy};

pub fn probability_bar(p: f64, width: usize) -> String {
    let filled = ((p * width as f64) as usize).min(width);
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(width - filled);
    let pct = format!("{:.2}%", p * 100.0);

    if p >= 0.36 {
        format!("{} {}", bar.green(), pct)
    } else if p >= 0.32 {
        format!("{} {}", bar.yellow(), pct)
    } else {
        format!("{} {}", bar.red(), pct)
    }
}

fn seat_cell(seat: Seat) -> Cell {
    Cell::new(format!("{} player", seat).bold().to_string())
}

pub fn win_table(probs: &WinProbs, policies: &[String; 3]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Seat"),
        Cell::new("Policy"),
        Cell::new("Exact").set_alignment(CellAlignment::Right),
        Cell::new("Win %"),
    ]);

    for seat in Seat::ALL {
        let p = probs.get(seat);
        table.add_row(vec![
            seat_cell(seat),
            Cell::new(&policies[seat.index()]),
            Cell::new(p.to_string()).set_alignment(CellAlignment::Right),
            Cell::new(probability_bar(p.to_f64(), 20)),
        ]);
    }

    table.to_string()
}

pub fn comparison_table(
    label_a: &str,
    a: &WinProbs,
    label_b: &str,
    b: &WinProbs,
) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Seat"),
        Cell::new(label_a).set_alignment(CellAlignment::Right),
        Cell::new(label_b).set_alignment(CellAlignment::Right),
        Cell::new("Difference").set_alignment(CellAlignment::Right),
    ]);

    for seat in Seat::ALL {
        let (pa, pb) = (a.get(seat), b.get(seat));
        let diff = pb - pa;
        let diff_str = if diff.is_zero() {
            "0".dimmed().to_string()
        } else if diff > Rational::ZERO {
            format!("+{}", diff).green().to_string()
        } else {
            diff.to_string().red().to_string()
        };
        table.add_row(vec![
            seat_cell(seat),
            Cell::new(format!("{} ({:.4})", pa, pa.to_f64())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} ({:.4})", pb, pb.to_f64())).set_alignment(CellAlignment::Right),
            Cell::new(diff_str).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

pub fn simulation_table(report: &SimulationReport, exact: &WinProbs) -> SpinResult<String> {
    let rates = report.win_rates()?;
    let intervals = report.confidence_intervals()?;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Seat"),
        Cell::new("Wins").set_alignment(CellAlignment::Right),
        Cell::new("Simulated").set_alignment(CellAlignment::Right),
        Cell::new("95% CI").set_alignment(CellAlignment::Right),
        Cell::new("Exact").set_alignment(CellAlignment::Right),
        Cell::new("Deviation").set_alignment(CellAlignment::Right),
    ]);

    for seat in Seat::ALL {
        let simulated = rates.get(seat).to_f64();
        let expected = exact.get(seat).to_f64();
        let (low, high) = intervals[seat.index()];
        let deviation = (simulated - expected).abs();
        let dev_str = format!("{:.5}", deviation);
        let dev_str = if low <= expected && expected <= high {
            dev_str.green().to_string()
        } else {
            dev_str.red().to_string()
        };
        table.add_row(vec![
            seat_cell(seat),
            Cell::new(report.wins[seat.index()]).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.5}", simulated)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.5} - {:.5}", low, high)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.5}", expected)).set_alignment(CellAlignment::Right),
            Cell::new(dev_str).set_alignment(CellAlignment::Right),
        ]);
    }

    Ok(table.to_string())
}

/// One row of a rationality sweep: the first seat's exact win probability
/// standing and spinning again after a fixed first spin.
pub struct SweepRow {
    pub lambda: f64,
    pub stand: Rational,
    pub spin_again: Rational,
}

pub fn sweep_table(rows: &[SweepRow]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Lambda").set_alignment(CellAlignment::Right),
        Cell::new("Stand").set_alignment(CellAlignment::Right),
        Cell::new("Spin again").set_alignment(CellAlignment::Right),
        Cell::new("Better"),
    ]);

    for row in rows {
        let better = match row.spin_again.cmp(&row.stand) {
            std::cmp::Ordering::Greater => "spin again".green().to_string(),
            std::cmp::Ordering::Less => "stand".yellow().to_string(),
            std::cmp::Ordering::Equal => "either".dimmed().to_string(),
        };
        table.add_row(vec![
            Cell::new(row.lambda).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", row.stand.to_f64())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", row.spin_again.to_f64()))
                .set_alignment(CellAlignment::Right),
            Cell::new(better),
        ]);
    }

    table.to_string()
}

/// Collapse sorted spins into runs: `[1, 2, 3, 7]` -> `"1-3, 7"`.
pub fn format_spins(spins: &[Score]) -> String {
    if spins.is_empty() {
        return "never".to_string();
    }
    let mut runs: Vec<(Score, Score)> = Vec::new();
    for &spin in spins {
        match runs.last_mut() {
            Some((_, end)) if *end + 1 == spin => *end = spin,
            _ => runs.push((spin, spin)),
        }
    }
    runs.iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .join(", ")
}

/// Spin-again chart for one seat, one row per observed state.
pub fn chart_table(strategy: &Strategy, seat: Seat) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec![];
    if seat != Seat::First {
        header.push(Cell::new("Observed"));
    }
    header.extend([
        Cell::new("Spin again on"),
        Cell::new("Stand from").set_alignment(CellAlignment::Right),
        Cell::new("Skip").set_alignment(CellAlignment::Right),
    ]);
    table.set_header(header);

    for observed in strategy.states(seat) {
        let spins = strategy.spin_set(seat, &observed);
        let stand_from = match strategy.shape(seat, &observed) {
            DecisionShape::Threshold(t) if t > strategy.config().max_spin => {
                "-".dimmed().to_string()
            }
            DecisionShape::Threshold(t) => t.to_string().bold().to_string(),
            DecisionShape::Irregular => "mixed".yellow().to_string(),
        };
        let skip = strategy.skip_probability(seat, &observed);
        let mut row = vec![];
        if seat != Seat::First {
            row.push(Cell::new(observed.iter().join(" / ")));
        }
        row.extend([
            Cell::new(format_spins(&spins)),
            Cell::new(stand_from).set_alignment(CellAlignment::Right),
            Cell::new(skip.to_string()).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(row);
    }

    table.to_string()
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spins_collapse_into_runs() {
        assert_eq!(format_spins(&[1, 2, 3, 7]), "1-3, 7");
        assert_eq!(format_spins(&[5]), "5");
        assert_eq!(format_spins(&[]), "never");
        assert_eq!(format_spins(&[1, 3, 4, 5, 9, 10]), "1, 3-5, 9-10");
    }

    #[test]
    fn simulation_table_lists_interval() {
        colored::control::set_override(false);
        let report = SimulationReport {
            trials: 10_000,
            seed: 1,
            first_spin: None,
            first_action: None,
            wins: [2_500, 2_500, 5_000],
        };
        let exact = WinProbs([
            Rational::new(1, 4).unwrap(),
            Rational::new(1, 4).unwrap(),
            Rational::new(1, 2).unwrap(),
        ]);
        let text = simulation_table(&report, &exact).unwrap();
        assert!(text.contains("95% CI"));
        assert!(text.contains("0.49020 - 0.50980"));
    }

    #[test]
    fn bar_stays_within_width() {
        colored::control::set_override(false);
        let bar = probability_bar(1.0, 10);
        assert!(bar.starts_with(&"\u{2588}".repeat(10)));
        assert!(bar.ends_with("100.00%"));
    }
}
