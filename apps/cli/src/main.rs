#![deny(warnings)]

//! Command-line front end: parses pasted gradebook text, prints weighted
//! totals and optionally solves for the score needed on one more assignment.

mod config;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CliConfig, OutputFormat};
use grade_calc::{summarize, GoalRequest};
use grade_core::{parse_number, Gradebook};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GRADEBOOK_GIT_SHA"),
    " ",
    env!("GRADEBOOK_BUILD_DATE"),
    ")"
);

/// Weighted grade calculator for pasted gradebook text.
#[derive(Parser, Debug)]
#[command(name = "gradebook", version, long_version = LONG_VERSION)]
struct Cli {
    /// File with the pasted assignments; `-` or omitted reads stdin
    input: Option<PathBuf>,

    /// File with pasted grades (accepted, currently not used)
    #[arg(long)]
    grades: Option<PathBuf>,

    /// Target overall grade in percent
    #[arg(long, allow_hyphen_values = true)]
    target: Option<String>,

    /// Category for the new assignment, by id or name
    #[arg(long)]
    category: Option<String>,

    /// Maximum points of the new assignment
    #[arg(long, allow_hyphen_values = true)]
    points: Option<String>,

    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Decimal places in displayed numbers
    #[arg(long)]
    precision: Option<usize>,
}

impl Cli {
    fn wants_goal(&self) -> bool {
        self.target.is_some() || self.category.is_some() || self.points.is_some()
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

// Unparsable numbers reach the solver as NaN so it reports them itself.
fn number_arg(raw: Option<&str>) -> f64 {
    raw.and_then(parse_number).unwrap_or(f64::NAN)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    }
    .with_overrides(cli.format, cli.precision);

    // Logging setup
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(input = ?cli.input, format = ?config.format, "starting CLI");

    let assignments = read_input(cli.input.as_deref())?;
    let grades = cli
        .grades
        .as_deref()
        .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()?;

    let mut book = Gradebook::new();
    if grade_parse::parse_into(&mut book, &assignments, grades.as_deref()) == 0 {
        warn!("no categories recognised; starting from an empty default category");
    }

    let goal = cli.wants_goal().then(|| {
        GoalRequest {
            target_percent: number_arg(cli.target.as_deref()),
            category: render::resolve_category(book.categories(), cli.category.as_deref()),
            max_points: number_arg(cli.points.as_deref()),
        }
        .solve(book.categories())
    });
    let report = summarize(book.categories());

    match config.format {
        OutputFormat::Text => {
            print!(
                "{}",
                render::render_text(book.categories(), &report, config.precision)?
            );
            if let Some(outcome) = &goal {
                println!("{}", render::goal_message(outcome, config.precision));
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                render::render_json(book.categories(), &report, goal.as_ref())?
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_flags_trigger_solving() {
        let cli = Cli::parse_from(["gradebook", "grades.txt", "--points", "10"]);
        assert!(cli.wants_goal());
        let cli = Cli::parse_from(["gradebook", "--format", "json"]);
        assert!(!cli.wants_goal());
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn number_args_become_nan_when_unparsable() {
        assert_eq!(number_arg(Some(" 92.5")), 92.5);
        assert!(number_arg(Some("ninety")).is_nan());
        assert!(number_arg(None).is_nan());
    }

    #[test]
    fn negative_points_reach_the_solver() {
        let cli = Cli::parse_from([
            "gradebook", "--category", "1", "--target", "90", "--points", "-5",
        ]);
        assert_eq!(cli.points.as_deref(), Some("-5"));
        let max_points = number_arg(cli.points.as_deref());
        assert_eq!(max_points, -5.0);
        let outcome = grade_calc::solve(
            &[],
            number_arg(cli.target.as_deref()),
            Some(grade_core::CategoryId(1)),
            max_points,
        );
        assert_eq!(outcome, grade_calc::GoalOutcome::InvalidPoints);
    }

    #[test]
    fn negative_target_is_taken_as_a_value() {
        let cli = Cli::parse_from(["gradebook", "--target", "-1", "--points", "10"]);
        assert_eq!(number_arg(cli.target.as_deref()), -1.0);
        assert_eq!(number_arg(cli.points.as_deref()), 10.0);
    }
}
