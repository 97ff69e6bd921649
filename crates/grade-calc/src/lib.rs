#![deny(warnings)]

//! Weighted-grade arithmetic.
//!
//! Provides pure helpers for:
//! - Per-category averages (earned / possible, 0 when nothing is possible)
//! - Overall weighted grade and total weight
//! - Goal solving: the score needed on one more assignment to reach a
//!   target overall grade
//!
//! Weights are percentage points, so `average * weight` is already a
//! percentage. No rounding happens here; callers round for display only.

use grade_core::{Category, CategoryId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Earned over possible points for one category, as a fraction.
///
/// Returns exactly 0 when the category has no possible points: no work yet
/// contributes nothing.
///
/// Example:
/// a category with 45/50 and 90/100 averages 135/150 = 0.9.
pub fn category_average(category: &Category) -> f64 {
    let possible = category.possible_sum();
    if possible > 0.0 {
        category.earned_sum() / possible
    } else {
        0.0
    }
}

/// Plain sum of category weights. Not normalized.
pub fn total_weight(categories: &[Category]) -> f64 {
    categories.iter().map(|c| c.weight).sum()
}

/// Overall grade in percent: sum of `average * weight` over categories.
///
/// Weights that sum to something other than 100 are allowed; the grade then
/// simply does not top out at 100. When the weight sum is not positive the
/// grade is 0.
pub fn overall_grade(categories: &[Category]) -> f64 {
    if total_weight(categories) > 0.0 {
        categories
            .iter()
            .map(|c| category_average(c) * c.weight)
            .sum()
    } else {
        0.0
    }
}

/// Per-category figures for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub weight: f64,
    pub earned: f64,
    pub possible: f64,
    /// Fraction, see [`category_average`].
    pub average: f64,
    /// Percentage points this category adds to the overall grade.
    pub contribution: f64,
}

/// Snapshot of derived totals for a category list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub overall_percent: f64,
    pub total_weight: f64,
    pub categories: Vec<CategorySummary>,
}

/// Derives every displayed figure in one pass.
pub fn summarize(categories: &[Category]) -> GradeReport {
    let summaries = categories
        .iter()
        .map(|c| {
            let average = category_average(c);
            CategorySummary {
                id: c.id,
                name: c.name.clone(),
                weight: c.weight,
                earned: c.earned_sum(),
                possible: c.possible_sum(),
                average,
                contribution: average * c.weight,
            }
        })
        .collect();
    GradeReport {
        overall_percent: overall_grade(categories),
        total_weight: total_weight(categories),
        categories: summaries,
    }
}

/// Result of goal solving. Precondition failures are outcomes too; none of
/// these is an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GoalOutcome {
    /// Hypothetical max points missing, non-finite or <= 0.
    InvalidPoints,
    /// Target percentage missing or non-finite.
    InvalidTarget,
    /// No category with the given id.
    NoCategorySelected,
    /// Selected category has no positive weight, so it cannot move the grade.
    ZeroWeightCategory,
    /// Existing work already satisfies the target.
    AlreadyMet,
    /// Even full marks on the new assignment fall short.
    Unreachable {
        category_name: String,
        target_percent: f64,
    },
    /// Points needed on the new assignment, never negative.
    Required {
        points: f64,
        percentage_of_max: f64,
    },
}

/// Inputs of one goal-solving query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalRequest {
    pub target_percent: f64,
    pub category: Option<CategoryId>,
    pub max_points: f64,
}

impl GoalRequest {
    pub fn solve(&self, categories: &[Category]) -> GoalOutcome {
        solve(
            categories,
            self.target_percent,
            self.category,
            self.max_points,
        )
    }
}

/// Minimum points needed on a new assignment worth `max_points`, added to
/// `category`, for the overall grade to reach `target_percent`.
///
/// Preconditions are checked in order (points, target, category, weight) and
/// the first failure is returned. Otherwise the overall formula is inverted:
///
/// required_fraction = (target - other_contribution) / category_weight
/// required_points = required_fraction * (possible + max_points) - earned
///
/// A negative required fraction means the target is already met. Required
/// points above `max_points` are unreachable. Anything else is floored at 0:
/// the category's existing points can exceed what the target asks of it even
/// when the required fraction itself is non-negative.
pub fn solve(
    categories: &[Category],
    target_percent: f64,
    category: Option<CategoryId>,
    max_points: f64,
) -> GoalOutcome {
    if !max_points.is_finite() || max_points <= 0.0 {
        return GoalOutcome::InvalidPoints;
    }
    if !target_percent.is_finite() {
        return GoalOutcome::InvalidTarget;
    }
    let Some(selected) = category.and_then(|id| categories.iter().find(|c| c.id == id)) else {
        return GoalOutcome::NoCategorySelected;
    };
    let weight_fraction = selected.weight / 100.0;
    if weight_fraction.is_nan() || weight_fraction <= 0.0 {
        return GoalOutcome::ZeroWeightCategory;
    }

    let target_fraction = target_percent / 100.0;
    let other_contribution: f64 = categories
        .iter()
        .filter(|c| c.id != selected.id)
        .map(|c| c.weight / 100.0 * category_average(c))
        .sum();
    let required_fraction = (target_fraction - other_contribution) / weight_fraction;
    let new_total_possible = selected.possible_sum() + max_points;
    let required_points = required_fraction * new_total_possible - selected.earned_sum();
    debug!(
        category = %selected.id,
        other_contribution,
        required_fraction,
        required_points,
        "goal solved"
    );

    if required_fraction < 0.0 {
        return GoalOutcome::AlreadyMet;
    }
    if required_points > max_points {
        return GoalOutcome::Unreachable {
            category_name: selected.name.clone(),
            target_percent,
        };
    }
    let points = required_points.max(0.0);
    GoalOutcome::Required {
        points,
        percentage_of_max: points / max_points * 100.0,
    }
}
