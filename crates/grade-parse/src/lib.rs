#![deny(warnings)]

//! Heuristic parser for gradebook text pasted from a course page.
//!
//! Input is read line by line. Each non-empty, trimmed line is run through
//! [`RULES`] in order and the first rule that accepts it decides what the
//! line is:
//!
//! 1. weighted category header, e.g. `Exams (30%)`
//! 2. unweighted category header: any line without a `/`
//! 3. scored assignment, e.g. `Quiz 1 8/10`
//! 4. assignment with only possible points, e.g. `Project /50`
//!
//! Lines no rule accepts are dropped. Precedence is the contract here: the
//! patterns overlap on odd input and the earlier rule always wins.

use grade_core::{coerce_number, trim_blank, Assignment, Category, Gradebook, IdGenerator};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// Category that collects assignments seen before any header.
pub const UNGROUPED_CATEGORY: &str = "Ungrouped";
/// Name used when an assignment line has nothing before its score.
pub const UNNAMED_ASSIGNMENT: &str = "Unnamed assignment";

// Name prefixes stop at the first `\r`, U+2028 or U+2029: a lone carriage
// return inside a line ends the part a rule may treat as a name.
static WEIGHTED_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\r\x{2028}\x{2029}]+?)\s*\(([0-9]+(?:\.[0-9]+)?)%\)")
        .expect("valid weighted header regex")
});
static SCORED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\r\x{2028}\x{2029}]*?)([0-9]+(?:\.[0-9]+)?)\s*/\s*([0-9]+(?:\.[0-9]+)?)")
        .expect("valid scored assignment regex")
});
// A non-digit directly followed by a digit, no later than the first `\r`.
static POSSIBLE_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\r\x{2028}\x{2029}]*?[^0-9][0-9]").expect("valid possible-only regex")
});

/// What a single line of input turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum LineKind {
    WeightedHeader { name: String, weight: f64 },
    Header { name: String },
    Scored {
        name: String,
        earned: f64,
        possible: f64,
    },
    PossibleOnly { name: String, possible: f64 },
}

/// A line matcher. Receives an already trimmed, non-empty line.
pub type LineRule = fn(&str) -> Option<LineKind>;

/// Classification rules in precedence order.
pub const RULES: &[(&str, LineRule)] = &[
    ("weighted_header", weighted_header),
    ("unweighted_header", unweighted_header),
    ("scored_assignment", scored_assignment),
    ("possible_only_assignment", possible_only_assignment),
];

/// `<name> (<number>%)`. Text after the closing paren is ignored.
pub fn weighted_header(line: &str) -> Option<LineKind> {
    let caps = WEIGHTED_HEADER_RE.captures(line)?;
    Some(LineKind::WeightedHeader {
        name: trim_blank(&caps[1]).to_string(),
        weight: caps[2].parse().unwrap_or(0.0),
    })
}

/// Any line without a `/`, digits or not, names a zero-weight category.
pub fn unweighted_header(line: &str) -> Option<LineKind> {
    if line.contains('/') {
        return None;
    }
    Some(LineKind::Header {
        name: line.to_string(),
    })
}

/// `<prefix><earned>/<possible>`; the prefix is the assignment name.
pub fn scored_assignment(line: &str) -> Option<LineKind> {
    let caps = SCORED_RE.captures(line)?;
    Some(LineKind::Scored {
        name: assignment_name(&caps[1]),
        earned: caps[2].parse().unwrap_or(0.0),
        possible: caps[3].parse().unwrap_or(0.0),
    })
}

/// `<name>/<possible>` with no earned score. The name is everything before
/// the first `/`, the possible points are read from right after it.
pub fn possible_only_assignment(line: &str) -> Option<LineKind> {
    if !line.contains('/') || !POSSIBLE_ONLY_RE.is_match(line) {
        return None;
    }
    let (name, rest) = line.split_once('/')?;
    Some(LineKind::PossibleOnly {
        name: assignment_name(name),
        possible: coerce_number(rest),
    })
}

fn assignment_name(raw: &str) -> String {
    let name = trim_blank(raw);
    if name.is_empty() {
        UNNAMED_ASSIGNMENT.to_string()
    } else {
        name.to_string()
    }
}

/// Runs `line` through [`RULES`]; first match wins.
pub fn classify_line(line: &str) -> Option<LineKind> {
    RULES.iter().find_map(|(rule, matcher)| {
        let kind = matcher(line)?;
        trace!(rule = *rule, line, "line classified");
        Some(kind)
    })
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(trim_blank).filter(|l| !l.is_empty())
}

/// Parses pasted assignment text into categories, drawing ids from `ids`.
///
/// Returns an empty list when nothing is classifiable; substituting a
/// default category is up to the caller (see [`Gradebook::load`]).
pub fn parse(text: &str, ids: &mut IdGenerator) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    let mut dropped = 0usize;

    for line in lines(text) {
        let Some(kind) = classify_line(line) else {
            debug!(line, "unclassifiable line dropped");
            dropped += 1;
            continue;
        };
        match kind {
            LineKind::WeightedHeader { name, weight } => {
                categories.push(Category::new(ids.next_category_id(), name, weight));
            }
            LineKind::Header { name } => {
                categories.push(Category::new(ids.next_category_id(), name, 0.0));
            }
            LineKind::Scored {
                name,
                earned,
                possible,
            } => {
                let assignment = Assignment::new(ids.next_assignment_id(), name, earned, possible);
                current_category(&mut categories, ids)
                    .assignments
                    .push(assignment);
            }
            LineKind::PossibleOnly { name, possible } => {
                let assignment = Assignment::new(ids.next_assignment_id(), name, 0.0, possible);
                current_category(&mut categories, ids)
                    .assignments
                    .push(assignment);
            }
        }
    }

    debug!(categories = categories.len(), dropped, "parse finished");
    categories
}

/// Same as [`parse`]; the grades text is accepted but not consulted.
pub fn parse_with_grades(
    assignments: &str,
    grades: Option<&str>,
    ids: &mut IdGenerator,
) -> Vec<Category> {
    debug!(
        grades_bytes = grades.map_or(0, str::len),
        "grades text ignored"
    );
    parse(assignments, ids)
}

/// Parses into a session, replacing its categories. Returns how many
/// categories the text itself produced (0 means the default was substituted).
pub fn parse_into(book: &mut Gradebook, assignments: &str, grades: Option<&str>) -> usize {
    let parsed = parse_with_grades(assignments, grades, book.ids_mut());
    let count = parsed.len();
    book.load(parsed);
    count
}

// The current category is always the most recently pushed one. Before any
// header has been seen, an "Ungrouped" bucket is created on demand.
fn current_category<'a>(
    categories: &'a mut Vec<Category>,
    ids: &mut IdGenerator,
) -> &'a mut Category {
    if categories.is_empty() {
        categories.push(Category::new(ids.next_category_id(), UNGROUPED_CATEGORY, 0.0));
    }
    let last = categories.len() - 1;
    &mut categories[last]
}
