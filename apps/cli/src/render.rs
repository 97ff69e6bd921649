//! Human-readable and JSON output. All user-facing wording lives here.

use anyhow::Result;
use grade_calc::{GoalOutcome, GradeReport};
use grade_core::{Category, CategoryId};
use serde::Serialize;
use std::fmt::Write as _;

/// Resolves a `--category` argument by id first, then by name.
pub fn resolve_category(categories: &[Category], raw: Option<&str>) -> Option<CategoryId> {
    let raw = raw?.trim();
    if let Ok(n) = raw.parse::<u64>() {
        if let Some(c) = categories.iter().find(|c| c.id == CategoryId(n)) {
            return Some(c.id);
        }
    }
    categories
        .iter()
        .find(|c| c.name == raw)
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(raw)))
        .map(|c| c.id)
}

pub fn render_text(
    categories: &[Category],
    report: &GradeReport,
    precision: usize,
) -> Result<String> {
    let mut out = String::new();
    for (category, summary) in categories.iter().zip(&report.categories) {
        writeln!(
            out,
            "[{}] {} ({:.p$}%) | {}/{} | avg {:.p$}%",
            category.id,
            category.name,
            category.weight,
            summary.earned,
            summary.possible,
            summary.average * 100.0,
            p = precision
        )?;
        for a in &category.assignments {
            writeln!(
                out,
                "    {} {}/{}",
                a.name, a.points_earned, a.points_possible
            )?;
        }
    }
    writeln!(out, "Overall: {:.p$}%", report.overall_percent, p = precision)?;
    writeln!(
        out,
        "Total weighting: {:.p$}%",
        report.total_weight,
        p = precision
    )?;
    Ok(out)
}

pub fn goal_message(outcome: &GoalOutcome, precision: usize) -> String {
    match outcome {
        GoalOutcome::InvalidPoints => {
            "Please enter a valid number of points for the assignment.".to_string()
        }
        GoalOutcome::InvalidTarget => "Please enter a target grade percentage.".to_string(),
        GoalOutcome::NoCategorySelected => "Please select a category.".to_string(),
        GoalOutcome::ZeroWeightCategory => "Selected category has zero weight.".to_string(),
        GoalOutcome::AlreadyMet => "Target already met; no points needed.".to_string(),
        GoalOutcome::Unreachable {
            category_name,
            target_percent,
        } => format!(
            "It is not possible to reach {target_percent:.precision$}% overall with this assignment in the {category_name} category."
        ),
        GoalOutcome::Required {
            points,
            percentage_of_max,
        } => format!(
            "You need approximately {points:.precision$} points ({percentage_of_max:.precision$}%) on this assignment."
        ),
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    categories: &'a [Category],
    report: &'a GradeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    goal: Option<&'a GoalOutcome>,
}

pub fn render_json(
    categories: &[Category],
    report: &GradeReport,
    goal: Option<&GoalOutcome>,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonOutput {
        categories,
        report,
        goal,
    })?)
}
