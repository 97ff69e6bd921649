#![deny(warnings)]

//! Core gradebook model: weighted categories, their assignments and the
//! editing session that owns them.
//!
//! Categories keep insertion order, which is also display order. Ids come
//! from a per-session [`IdGenerator`] and are never handed out twice, even
//! after the entity they named has been deleted or the session was reset.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Name given to the placeholder category when a parse yields nothing.
pub const DEFAULT_CATEGORY_NAME: &str = "Category 1";

static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("valid leading number regex")
});

/// Identifier of a category within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub u64);

/// Identifier of an assignment within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two monotonic counters, one per entity kind. Both start at 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdGenerator {
    next_category: u64,
    next_assignment: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self {
            next_category: 1,
            next_assignment: 1,
        }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_category_id(&mut self) -> CategoryId {
        let id = CategoryId(self.next_category);
        self.next_category += 1;
        id
    }

    pub fn next_assignment_id(&mut self) -> AssignmentId {
        let id = AssignmentId(self.next_assignment);
        self.next_assignment += 1;
        id
    }
}

/// A single scored (or not yet scored) item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub name: String,
    /// Points earned, conceptually >= 0.
    pub points_earned: f64,
    /// Points possible, conceptually >= 0.
    pub points_possible: f64,
}

impl Assignment {
    /// Builds an assignment; NaN point values are stored as 0.
    pub fn new(id: AssignmentId, name: impl Into<String>, earned: f64, possible: f64) -> Self {
        Self {
            id,
            name: name.into(),
            points_earned: sanitize(earned),
            points_possible: sanitize(possible),
        }
    }
}

/// A weighted grouping of assignments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Percentage points this category contributes at a perfect average.
    /// Not clamped; weights across categories need not sum to 100.
    pub weight: f64,
    /// Owned assignments in insertion order.
    pub assignments: Vec<Assignment>,
}

impl Category {
    /// Builds an empty category; a NaN weight is stored as 0.
    pub fn new(id: CategoryId, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            weight: sanitize(weight),
            assignments: Vec::new(),
        }
    }

    /// Sum of `points_earned` over all assignments.
    pub fn earned_sum(&self) -> f64 {
        self.assignments.iter().map(|a| a.points_earned).sum()
    }

    /// Sum of `points_possible` over all assignments.
    pub fn possible_sum(&self) -> f64 {
        self.assignments.iter().map(|a| a.points_possible).sum()
    }

    pub fn assignment(&self, id: AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    fn assignment_mut(&mut self, id: AssignmentId) -> Option<&mut Assignment> {
        self.assignments.iter_mut().find(|a| a.id == id)
    }
}

/// Errors for editing commands that name an entity the session does not hold.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),
    #[error("assignment {assignment} not found in category {category}")]
    AssignmentNotFound {
        category: CategoryId,
        assignment: AssignmentId,
    },
}

/// Whitespace as far as pasted text is concerned: Unicode whitespace plus
/// the byte-order mark editors put at the start of saved files.
pub fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Trims [`is_blank`] characters from both ends.
pub fn trim_blank(text: &str) -> &str {
    text.trim_matches(is_blank)
}

/// Parses the leading numeric prefix of `input`.
///
/// Leading blanks are skipped and anything after the number is ignored,
/// so `" 42.5 pts"` yields `Some(42.5)`. `Infinity` with an optional sign is
/// a number too. Returns `None` when no numeric prefix exists.
pub fn parse_number(input: &str) -> Option<f64> {
    let m = LEADING_NUMBER_RE.find(input.trim_start_matches(is_blank))?;
    m.as_str().parse::<f64>().ok()
}

/// Like [`parse_number`], but unparsable input becomes 0.
pub fn coerce_number(input: &str) -> f64 {
    parse_number(input).unwrap_or(0.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// One editing session: the ordered category list and its id generator.
///
/// Every command runs to completion before returning; there is no state in
/// which a category is half-added or an assignment is orphaned.
#[derive(Clone, Debug, Default)]
pub struct Gradebook {
    categories: Vec<Category>,
    ids: IdGenerator,
}

impl Gradebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session that continues an existing id sequence.
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            categories: Vec::new(),
            ids,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// The session's id generator, for bulk creation such as parsing.
    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Replaces the model with freshly parsed categories.
    ///
    /// An empty list is replaced by a single empty default category so the
    /// session always has somewhere to add assignments.
    pub fn load(&mut self, categories: Vec<Category>) {
        self.categories = categories;
        if self.categories.is_empty() {
            let id = self.ids.next_category_id();
            self.categories.push(Category::new(id, DEFAULT_CATEGORY_NAME, 0.0));
        }
        debug!(categories = self.categories.len(), "gradebook loaded");
    }

    /// Clears all categories. Id counters keep running.
    pub fn reset(&mut self) {
        self.categories.clear();
        debug!("gradebook reset");
    }

    /// Appends an empty, zero-weight category named after its id.
    pub fn add_category(&mut self) -> CategoryId {
        let id = self.ids.next_category_id();
        self.categories
            .push(Category::new(id, format!("Category {id}"), 0.0));
        debug!(%id, "category added");
        id
    }

    /// Removes a category together with all of its assignments.
    pub fn remove_category(&mut self, id: CategoryId) -> Result<Category, ModelError> {
        let pos = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(ModelError::CategoryNotFound(id))?;
        let removed = self.categories.remove(pos);
        debug!(%id, assignments = removed.assignments.len(), "category removed");
        Ok(removed)
    }

    /// Appends an empty 0/0 assignment named after its id.
    pub fn add_assignment(&mut self, category: CategoryId) -> Result<AssignmentId, ModelError> {
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.id == category)
            .ok_or(ModelError::CategoryNotFound(category))?;
        let id = self.ids.next_assignment_id();
        cat.assignments
            .push(Assignment::new(id, format!("Assignment {id}"), 0.0, 0.0));
        debug!(%category, %id, "assignment added");
        Ok(id)
    }

    pub fn remove_assignment(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
    ) -> Result<Assignment, ModelError> {
        let cat = self.category_mut(category)?;
        let pos = cat
            .assignments
            .iter()
            .position(|a| a.id == assignment)
            .ok_or(ModelError::AssignmentNotFound {
                category,
                assignment,
            })?;
        let removed = cat.assignments.remove(pos);
        debug!(%category, %assignment, "assignment removed");
        Ok(removed)
    }

    pub fn rename_category(
        &mut self,
        id: CategoryId,
        name: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.category_mut(id)?.name = name.into();
        Ok(())
    }

    /// Sets a category weight; NaN becomes 0. No clamping is applied.
    pub fn set_category_weight(&mut self, id: CategoryId, weight: f64) -> Result<(), ModelError> {
        self.category_mut(id)?.weight = sanitize(weight);
        Ok(())
    }

    /// Sets a category weight from raw user input.
    pub fn set_category_weight_text(&mut self, id: CategoryId, raw: &str) -> Result<(), ModelError> {
        self.set_category_weight(id, coerce_number(raw))
    }

    pub fn rename_assignment(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
        name: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.assignment_mut(category, assignment)?.name = name.into();
        Ok(())
    }

    pub fn set_points_earned(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
        points: f64,
    ) -> Result<(), ModelError> {
        self.assignment_mut(category, assignment)?.points_earned = sanitize(points);
        Ok(())
    }

    pub fn set_points_earned_text(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
        raw: &str,
    ) -> Result<(), ModelError> {
        self.set_points_earned(category, assignment, coerce_number(raw))
    }

    pub fn set_points_possible(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
        points: f64,
    ) -> Result<(), ModelError> {
        self.assignment_mut(category, assignment)?.points_possible = sanitize(points);
        Ok(())
    }

    pub fn set_points_possible_text(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
        raw: &str,
    ) -> Result<(), ModelError> {
        self.set_points_possible(category, assignment, coerce_number(raw))
    }

    /// Entries for a category selector, in display order.
    pub fn category_options(&self) -> Vec<(CategoryId, String)> {
        self.categories
            .iter()
            .map(|c| (c.id, c.name.clone()))
            .collect()
    }

    fn category_mut(&mut self, id: CategoryId) -> Result<&mut Category, ModelError> {
        self.categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ModelError::CategoryNotFound(id))
    }

    fn assignment_mut(
        &mut self,
        category: CategoryId,
        assignment: AssignmentId,
    ) -> Result<&mut Assignment, ModelError> {
        self.category_mut(category)?
            .assignment_mut(assignment)
            .ok_or(ModelError::AssignmentNotFound {
                category,
                assignment,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ids_are_monotonic_per_kind() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_category_id(), CategoryId(1));
        assert_eq!(ids.next_category_id(), CategoryId(2));
        assert_eq!(ids.next_assignment_id(), AssignmentId(1));
        assert_eq!(ids.next_category_id(), CategoryId(3));
    }

    #[test]
    fn add_category_uses_id_in_name() {
        let mut book = Gradebook::new();
        let a = book.add_category();
        let b = book.add_category();
        assert_eq!(book.category(a).unwrap().name, "Category 1");
        assert_eq!(book.category(b).unwrap().name, "Category 2");
        assert_eq!(book.category(b).unwrap().weight, 0.0);
    }

    #[test]
    fn remove_category_cascades_and_ids_are_not_reused() {
        let mut book = Gradebook::new();
        let cat = book.add_category();
        let a1 = book.add_assignment(cat).unwrap();
        book.add_assignment(cat).unwrap();
        let removed = book.remove_category(cat).unwrap();
        assert_eq!(removed.assignments.len(), 2);
        assert!(book.is_empty());

        let cat2 = book.add_category();
        assert_ne!(cat2, cat);
        let a3 = book.add_assignment(cat2).unwrap();
        assert_eq!(a3, AssignmentId(3));
        assert_ne!(a3, a1);
    }

    #[test]
    fn add_assignment_to_missing_category_fails() {
        let mut book = Gradebook::new();
        let err = book.add_assignment(CategoryId(9)).unwrap_err();
        assert_eq!(err, ModelError::CategoryNotFound(CategoryId(9)));
    }

    #[test]
    fn remove_missing_assignment_reports_both_ids() {
        let mut book = Gradebook::new();
        let cat = book.add_category();
        let err = book.remove_assignment(cat, AssignmentId(5)).unwrap_err();
        assert_eq!(
            err,
            ModelError::AssignmentNotFound {
                category: cat,
                assignment: AssignmentId(5)
            }
        );
        assert_eq!(err.to_string(), "assignment 5 not found in category 1");
    }

    #[test]
    fn field_updates_coerce_bad_input_to_zero() {
        let mut book = Gradebook::new();
        let cat = book.add_category();
        let asg = book.add_assignment(cat).unwrap();
        book.set_category_weight_text(cat, "35.5%").unwrap();
        book.set_points_earned_text(cat, asg, "abc").unwrap();
        book.set_points_possible_text(cat, asg, " 20 pts").unwrap();
        book.set_category_weight(cat, f64::NAN).unwrap();
        let c = book.category(cat).unwrap();
        assert_eq!(c.weight, 0.0);
        assert_eq!(c.assignments[0].points_earned, 0.0);
        assert_eq!(c.assignments[0].points_possible, 20.0);

        book.set_category_weight_text(cat, "35.5%").unwrap();
        assert_eq!(book.category(cat).unwrap().weight, 35.5);
    }

    #[test]
    fn renames_apply() {
        let mut book = Gradebook::new();
        let cat = book.add_category();
        let asg = book.add_assignment(cat).unwrap();
        book.rename_category(cat, "Labs").unwrap();
        book.rename_assignment(cat, asg, "Lab 1").unwrap();
        assert_eq!(book.category_options(), vec![(cat, "Labs".to_string())]);
        assert_eq!(
            book.category(cat).unwrap().assignment(asg).unwrap().name,
            "Lab 1"
        );
    }

    #[test]
    fn load_empty_substitutes_default_category() {
        let mut book = Gradebook::new();
        book.load(Vec::new());
        assert_eq!(book.categories().len(), 1);
        assert_eq!(book.categories()[0].name, DEFAULT_CATEGORY_NAME);
        assert!(book.categories()[0].assignments.is_empty());
    }

    #[test]
    fn reset_keeps_counters() {
        let mut book = Gradebook::new();
        book.add_category();
        book.add_category();
        book.reset();
        assert!(book.is_empty());
        assert_eq!(book.add_category(), CategoryId(3));
    }

    #[test]
    fn sessions_do_not_share_counters() {
        let mut first = Gradebook::new();
        first.add_category();
        first.add_category();
        let mut second = Gradebook::new();
        assert_eq!(second.add_category(), CategoryId(1));

        let mut ids = IdGenerator::new();
        ids.next_category_id();
        let mut resumed = Gradebook::with_ids(ids);
        assert_eq!(resumed.add_category(), CategoryId(2));
    }

    #[test]
    fn parse_number_takes_leading_prefix() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  7.25/10"), Some(7.25));
        assert_eq!(parse_number("-3 points"), Some(-3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e2x"), Some(100.0));
        assert_eq!(parse_number("12."), Some(12.0));
        assert_eq!(parse_number("pts 12"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(coerce_number("n/a"), 0.0);
    }

    #[test]
    fn parse_number_skips_byte_order_mark() {
        assert_eq!(parse_number("\u{feff}50"), Some(50.0));
        assert_eq!(parse_number(" \u{feff} 7 pts"), Some(7.0));
        assert_eq!(trim_blank("\u{feff}Exams (30%) \r"), "Exams (30%)");
    }

    #[test]
    fn parse_number_accepts_infinity() {
        assert_eq!(parse_number("Infinity 1"), Some(f64::INFINITY));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number("+Infinityx"), Some(f64::INFINITY));
        assert_eq!(parse_number("infinity"), None);
        assert_eq!(parse_number("Inf"), None);
    }

    #[test]
    fn category_serializes_with_plain_ids() {
        let mut cat = Category::new(CategoryId(4), "Exams", 30.0);
        cat.assignments
            .push(Assignment::new(AssignmentId(2), "Midterm", 45.0, 50.0));
        let json = serde_json::to_value(&cat).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["assignments"][0]["id"], 2);
        assert_eq!(json["assignments"][0]["points_possible"], 50.0);
        let back: Category = serde_json::from_value(json).unwrap();
        assert_eq!(back, cat);
    }

    proptest! {
        #[test]
        fn sums_match_assignment_totals(points in proptest::collection::vec((0.0f64..100.0, 0.0f64..100.0), 0..20)) {
            let mut cat = Category::new(CategoryId(1), "C", 10.0);
            for (i, (e, p)) in points.iter().enumerate() {
                cat.assignments.push(Assignment::new(AssignmentId(i as u64 + 1), "a", *e, *p));
            }
            let earned: f64 = points.iter().map(|(e, _)| e).sum();
            let possible: f64 = points.iter().map(|(_, p)| p).sum();
            prop_assert!((cat.earned_sum() - earned).abs() < 1e-9);
            prop_assert!((cat.possible_sum() - possible).abs() < 1e-9);
        }
    }
}
