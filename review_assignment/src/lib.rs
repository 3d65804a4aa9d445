mod config;
pub mod builder;
pub mod manual;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

/// Selects `percentage` percent of the items and distributes them over the
/// eligible reviewers, using the default rules and a fresh random source.
///
/// ```
/// use review_assignment::{assign, ReviewRow};
///
/// let rows = vec![
///     ReviewRow::new(1, "a@snowcorp.com"),
///     ReviewRow::new(2, "a@snowcorp.com"),
///     ReviewRow::new(1, "b@other.com"),
/// ];
/// let res = assign(&rows, 100)?;
/// assert_eq!(res.unique_items, 2);
/// assert_eq!(res.assignments[0].item_ids.len(), 2);
/// # Ok::<(), review_assignment::AssignmentError>(())
/// ```
pub fn assign(rows: &[ReviewRow], percentage: u32) -> Result<ProcessingResult, AssignmentError> {
    let mut rng = ChaCha8Rng::from_entropy();
    assign_with_rules(rows, &AssignmentRules::new(percentage), &mut rng)
}

/// Runs the assignment with the given rules.
///
/// Arguments:
/// * `rows` the review records, in input order
/// * `rules` the percentage, the reviewer suffix and the selection policy
/// * `rng` the source of randomness. Pass a seeded generator to get
///   reproducible assignments.
///
/// The input is fully validated before any randomness is consumed. Having no
/// eligible reviewer is not an error: the result then has no assignments.
pub fn assign_with_rules<R: Rng + ?Sized>(
    rows: &[ReviewRow],
    rules: &AssignmentRules,
    rng: &mut R,
) -> Result<ProcessingResult, AssignmentError> {
    info!("Processing {:?} rows, rules: {:?}", rows.len(), rules);
    checks(rows, rules)?;

    let total_items = rows.len();
    let unique_ids = unique_item_ids(rows);
    let unique_items = unique_ids.len();
    let reviewers = eligible_reviewers(rows, &rules.reviewer_suffix);
    info!(
        "{} rows, {} unique items, {} eligible reviewers",
        total_items,
        unique_items,
        reviewers.len()
    );
    for (idx, r) in reviewers.iter().enumerate() {
        debug!("Reviewer: {}: {}", idx + 1, r);
    }

    let percentage = rules.percentage as usize;
    if reviewers.is_empty() {
        warn!(
            "No reviewer ends with {:?}, nothing to assign",
            rules.reviewer_suffix
        );
        return Ok(ProcessingResult {
            assignments: Vec::new(),
            total_items,
            unique_items,
            target_items: unique_items * percentage / 100,
        });
    }

    let (assignments, target_items) = match rules.policy {
        SelectionPolicy::UniqueItems => {
            let target = unique_items * percentage / 100;
            (split_unique_items(unique_ids, &reviewers, target, rng), target)
        }
        SelectionPolicy::PerReviewerPercentage => {
            let all_rows: Vec<&ReviewRow> = rows.iter().collect();
            select_per_reviewer(&all_rows, &reviewers, percentage, rng)
        }
        SelectionPolicy::NewestRecordWins => {
            let newest = newest_record_per_item(rows)?;
            debug!(
                "Kept {} rows out of {} after newest record deduplication",
                newest.len(),
                rows.len()
            );
            select_per_reviewer(&newest, &reviewers, percentage, rng)
        }
    };

    Ok(ProcessingResult {
        assignments,
        total_items,
        unique_items,
        target_items,
    })
}

/// A reviewer is eligible when its lower-cased identifier ends with the suffix.
pub fn is_eligible_reviewer(reviewer: &str, suffix: &str) -> bool {
    reviewer
        .to_lowercase()
        .ends_with(suffix.to_lowercase().as_str())
}

/// The distinct eligible reviewers, in the order they first appear.
///
/// Rows without a reviewer are ignored.
pub fn eligible_reviewers(rows: &[ReviewRow], suffix: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for r in rows.iter().filter_map(|row| row.reviewer.as_deref()) {
        if is_eligible_reviewer(r, suffix) && seen.insert(r) {
            res.push(r.to_string());
        }
    }
    res
}

/// The distinct item ids (string form), in the order they first appear.
pub fn unique_item_ids(rows: &[ReviewRow]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    rows.iter()
        .filter_map(|row| row.item_id.as_ref().map(FieldValue::as_key))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Fisher-Yates shuffle: every permutation is equally likely.
pub fn shuffle_items<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Keeps only the most recently updated row of each item.
///
/// Rows are returned in the order their item first appears. On equal
/// timestamps the earlier row wins, and a row without a timestamp loses
/// against any row that has one.
pub fn newest_record_per_item(rows: &[ReviewRow]) -> Result<Vec<&ReviewRow>, AssignmentError> {
    let mut order: Vec<String> = Vec::new();
    let mut newest: HashMap<String, (Option<NaiveDateTime>, &ReviewRow)> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = match &row.item_id {
            Some(v) => v.as_key(),
            None => continue,
        };
        let ts = match &row.review_updated_at {
            Some(v) => Some(parse_timestamp(v).ok_or_else(|| {
                AssignmentError::InvalidTimestamp {
                    row: idx + 1,
                    value: v.as_key(),
                }
            })?),
            None => None,
        };
        if let Some(current) = newest.get_mut(&key) {
            if ts > current.0 {
                debug!(
                    "newest_record_per_item: item {}: row {} replaces {:?}",
                    key,
                    idx + 1,
                    current.1.reviewer
                );
                *current = (ts, row);
            }
        } else {
            order.push(key.clone());
            newest.insert(key, (ts, row));
        }
    }
    Ok(order
        .iter()
        .filter_map(|key| newest.get(key).map(|p| p.1))
        .collect())
}

// Input validation. Nothing random happens before this passes.
fn checks(rows: &[ReviewRow], rules: &AssignmentRules) -> Result<(), AssignmentError> {
    rules.validate()?;
    if let Some(idx) = rows.iter().position(|row| row.item_id.is_none()) {
        return Err(AssignmentError::MissingItemId { row: idx + 1 });
    }
    Ok(())
}

fn split_unique_items<R: Rng + ?Sized>(
    mut item_ids: Vec<String>,
    reviewers: &[String],
    target: usize,
    rng: &mut R,
) -> Vec<ReviewerAssignment> {
    let per_reviewer = target / reviewers.len();
    shuffle_items(&mut item_ids, rng);

    let assigned = per_reviewer * reviewers.len();
    // Items past the last full slice are not assigned to anyone.
    if assigned < target {
        info!(
            "{} items per reviewer, {} of the {} selected items are left unassigned ({} unique items in total)",
            per_reviewer,
            target - assigned,
            target,
            item_ids.len()
        );
    }

    reviewers
        .iter()
        .enumerate()
        .map(|(idx, reviewer)| ReviewerAssignment {
            reviewer: reviewer.clone(),
            item_ids: item_ids[idx * per_reviewer..(idx + 1) * per_reviewer].to_vec(),
        })
        .collect()
}

// Returns the assignments and the number of selected items.
fn select_per_reviewer<R: Rng + ?Sized>(
    rows: &[&ReviewRow],
    reviewers: &[String],
    percentage: usize,
    rng: &mut R,
) -> (Vec<ReviewerAssignment>, usize) {
    let mut res: Vec<ReviewerAssignment> = Vec::new();
    let mut selected = 0;
    for reviewer in reviewers {
        let mut items: Vec<String> = rows
            .iter()
            .filter(|row| row.reviewer.as_deref() == Some(reviewer.as_str()))
            .filter_map(|row| row.item_id.as_ref().map(FieldValue::as_key))
            .collect();
        shuffle_items(&mut items, rng);
        let keep = items.len() * percentage / 100;
        debug!(
            "select_per_reviewer: {}: keeping {} of {} items",
            reviewer,
            keep,
            items.len()
        );
        items.truncate(keep);
        selected += keep;
        res.push(ReviewerAssignment {
            reviewer: reviewer.clone(),
            item_ids: items,
        });
    }
    (res, selected)
}

// Spreadsheet serial dates count the days since this day.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
// 9999-12-31
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

fn parse_timestamp(v: &FieldValue) -> Option<NaiveDateTime> {
    match v {
        FieldValue::Number(days) if (0.0..=MAX_SERIAL_DAY).contains(days) => {
            let (y, m, d) = SERIAL_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
            let millis = (days * 86_400_000.0).round() as i64;
            epoch.checked_add_signed(Duration::milliseconds(millis))
        }
        FieldValue::Number(_) => None,
        FieldValue::Text(s) => parse_timestamp_str(s.trim()),
    }
}

fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
