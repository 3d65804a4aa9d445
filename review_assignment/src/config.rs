// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The raw value of a cell, as handed over by the readers.
///
/// Spreadsheets store identifiers either as text or as numbers. They are only
/// compared through their string form, see [`FieldValue::as_key`].
#[derive(PartialEq, Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

// Largest integer that a f64 holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl FieldValue {
    /// The string form used for all comparisons.
    ///
    /// Whole numbers print without a fractional part, so that the number `1`
    /// and the text `"1"` refer to the same item.
    pub fn as_key(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n)
                if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER =>
            {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => format!("{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

/// One review record, as read from the source data. Rows are never mutated.
///
/// `item_id` is required: a row without it fails the whole run. A row without
/// a reviewer is kept and simply never makes its reviewer eligible.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReviewRow {
    pub review_id: Option<FieldValue>,
    pub item_id: Option<FieldValue>,
    pub reviewer: Option<String>,
    pub review_updated_at: Option<FieldValue>,
}

impl ReviewRow {
    pub fn new(item_id: impl Into<FieldValue>, reviewer: &str) -> ReviewRow {
        ReviewRow {
            review_id: None,
            item_id: Some(item_id.into()),
            reviewer: Some(reviewer.to_string()),
            review_updated_at: None,
        }
    }

    pub fn updated_at(self, ts: impl Into<FieldValue>) -> ReviewRow {
        ReviewRow {
            review_updated_at: Some(ts.into()),
            ..self
        }
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReviewerAssignment {
    pub reviewer: String,
    pub item_ids: Vec<String>,
}

/// The outcome of one processing run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProcessingResult {
    /// One entry per eligible reviewer, in the order reviewers were first encountered.
    pub assignments: Vec<ReviewerAssignment>,
    /// Number of input rows, before any deduplication.
    pub total_items: usize,
    /// Number of distinct item ids.
    pub unique_items: usize,
    /// Number of items the percentage asked for.
    pub target_items: usize,
}

impl ProcessingResult {
    pub fn assigned_items(&self) -> usize {
        self.assignments.iter().map(|a| a.item_ids.len()).sum()
    }

    /// Items that the percentage selected but that were not handed to anyone.
    pub fn shortfall(&self) -> usize {
        self.target_items.saturating_sub(self.assigned_items())
    }

    pub fn eligible_reviewers(&self) -> Vec<&str> {
        self.assignments.iter().map(|a| a.reviewer.as_str()).collect()
    }
}

/// Errors that prevent a run from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AssignmentError {
    /// The selection percentage must be within 1..=100.
    InvalidPercentage(u32),
    /// A row has no item id. `row` is the 1-based position in the input.
    MissingItemId { row: usize },
    /// A review timestamp could not be interpreted.
    InvalidTimestamp { row: usize, value: String },
}

impl Error for AssignmentError {}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentError::InvalidPercentage(p) => {
                write!(f, "percentage must be between 1 and 100, got {}", p)
            }
            AssignmentError::MissingItemId { row } => write!(f, "row {} has no item id", row),
            AssignmentError::InvalidTimestamp { row, value } => {
                write!(f, "row {}: cannot read review timestamp {:?}", row, value)
            }
        }
    }
}

// ********* Configuration **********

/// Domain suffix that makes a reviewer eligible.
pub const DEFAULT_REVIEWER_SUFFIX: &str = "snowcorp.com";

/// How the items get selected and distributed.
///
/// `UniqueItems` is the current behaviour. The other two reproduce older
/// exports and are kept for comparison against them.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum SelectionPolicy {
    /// Deduplicate the items globally, shuffle them, and split the selected
    /// percentage into equal slices, one per eligible reviewer. Items left
    /// over by the integer division are not assigned.
    #[default]
    UniqueItems,
    /// Each reviewer keeps the percentage of the rows that name them. Items
    /// are not deduplicated and may end up with several reviewers.
    PerReviewerPercentage,
    /// Like `PerReviewerPercentage`, but only the most recently updated row of
    /// each item counts. An item belongs to at most one reviewer.
    NewestRecordWins,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AssignmentRules {
    pub percentage: u32,
    pub reviewer_suffix: String,
    pub policy: SelectionPolicy,
}

impl AssignmentRules {
    pub fn new(percentage: u32) -> AssignmentRules {
        AssignmentRules {
            percentage,
            reviewer_suffix: DEFAULT_REVIEWER_SUFFIX.to_string(),
            policy: SelectionPolicy::UniqueItems,
        }
    }

    pub fn validate(&self) -> Result<(), AssignmentError> {
        if (1..=100).contains(&self.percentage) {
            Ok(())
        } else {
            Err(AssignmentError::InvalidPercentage(self.percentage))
        }
    }
}
