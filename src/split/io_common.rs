// Column mapping shared by the spreadsheet and CSV readers.

use std::collections::HashMap;
use std::path::Path;

use crate::split::*;

pub const REVIEW_ID: &str = "Review ID";
pub const ITEM_ID: &str = "Item ID";
pub const REVIEWER: &str = "Reviewer";
pub const REVIEW_UPDATED_AT: &str = "Review Updated At";

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Positions of the known columns in a header row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReviewColumns {
    pub review_id: Option<usize>,
    pub item_id: usize,
    pub reviewer: usize,
    pub review_updated_at: Option<usize>,
}

impl ReviewColumns {
    /// Finds the columns by their exact names. `Item ID` and `Reviewer` are required,
    /// unknown columns are ignored. When a name appears twice, the first one is used.
    pub fn from_header(header: &[Option<String>]) -> SplitResult<ReviewColumns> {
        let mut col_names: HashMap<&str, usize> = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            if let Some(n) = name {
                col_names.entry(n.as_str()).or_insert(idx);
            }
        }
        debug!("ReviewColumns::from_header: col_names: {:?}", col_names);

        let required = |column: &str| {
            col_names
                .get(column)
                .cloned()
                .context(MissingColumnSnafu { column })
        };
        Ok(ReviewColumns {
            review_id: col_names.get(REVIEW_ID).cloned(),
            item_id: required(ITEM_ID)?,
            reviewer: required(REVIEWER)?,
            review_updated_at: col_names.get(REVIEW_UPDATED_AT).cloned(),
        })
    }

    /// The positions of all the columns that are read.
    pub fn indexes(&self) -> Vec<usize> {
        [
            self.review_id,
            Some(self.item_id),
            Some(self.reviewer),
            self.review_updated_at,
        ]
        .iter()
        .flatten()
        .cloned()
        .collect()
    }

    /// Assembles a row from the values of the cells, in column order.
    pub fn make_row(&self, cells: &[Option<FieldValue>]) -> ReviewRow {
        let get = |idx: usize| cells.get(idx).cloned().flatten();
        ReviewRow {
            review_id: self.review_id.and_then(get),
            item_id: get(self.item_id),
            reviewer: get(self.reviewer).map(|v| v.as_key()),
            review_updated_at: self.review_updated_at.and_then(get),
        }
    }
}

/// Reads a piece of text. Text that is exactly the printed form of a number becomes
/// that number, so that `12` in a CSV file is the same item as `12` in a spreadsheet.
/// Blank text is no value at all.
pub fn parse_text_value(s: &str) -> Option<FieldValue> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() && FieldValue::Number(n).as_key() == s => {
            Some(FieldValue::Number(n))
        }
        _ => Some(FieldValue::Text(s.to_string())),
    }
}
