pub use crate::config::*;

use rand::Rng;

/// A builder for adding review rows.
///
/// It is convenient when the rows are produced in code rather than read from a file.
///
/// ```
/// pub use review_assignment::builder::Builder;
/// pub use review_assignment::AssignmentRules;
/// use rand::SeedableRng;
/// # use review_assignment::AssignmentError;
///
/// let mut builder = Builder::new(&AssignmentRules::new(50))?
///     .reviewer_suffix("example.org")?;
///
/// builder.add_review_simple("item-1", "anna@example.org")?;
/// builder.add_review_simple("item-2", "bob@example.org")?;
///
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
/// let res = builder.run(&mut rng)?;
/// assert_eq!(res.unique_items, 2);
///
/// # Ok::<(), AssignmentError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AssignmentRules,
    pub(crate) _rows: Vec<ReviewRow>,
}

impl Builder {
    pub fn new(rules: &AssignmentRules) -> Result<Builder, AssignmentError> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _rows: Vec::new(),
        })
    }

    pub fn reviewer_suffix(self, suffix: &str) -> Result<Builder, AssignmentError> {
        Ok(Builder {
            _rules: AssignmentRules {
                reviewer_suffix: suffix.to_string(),
                ..self._rules
            },
            _rows: self._rows,
        })
    }

    pub fn policy(self, policy: SelectionPolicy) -> Result<Builder, AssignmentError> {
        Ok(Builder {
            _rules: AssignmentRules {
                policy,
                ..self._rules
            },
            _rows: self._rows,
        })
    }

    /// Adds a review of an item by a reviewer.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_review_simple(&mut self, item_id: &str, reviewer: &str) -> Result<(), AssignmentError> {
        self.add_review(&ReviewRow::new(item_id, reviewer))
    }

    /// Adds a full row.
    ///
    /// The row must carry an item id. The reviewer may be missing, in which case
    /// the row still counts towards the totals.
    pub fn add_review(&mut self, row: &ReviewRow) -> Result<(), AssignmentError> {
        if row.item_id.is_none() {
            return Err(AssignmentError::MissingItemId {
                row: self._rows.len() + 1,
            });
        }
        self._rows.push(row.clone());
        Ok(())
    }

    pub fn rows(&self) -> &[ReviewRow] {
        &self._rows
    }

    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ProcessingResult, AssignmentError> {
        crate::assign_with_rules(&self._rows, &self._rules, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rejects_bad_percentage() {
        assert!(Builder::new(&AssignmentRules::new(0)).is_err());
    }

    #[test]
    fn rejects_rows_without_item() {
        let mut b = Builder::new(&AssignmentRules::new(10)).unwrap();
        b.add_review_simple("1", "a@snowcorp.com").unwrap();
        let res = b.add_review(&ReviewRow {
            reviewer: Some("a@snowcorp.com".to_string()),
            ..Default::default()
        });
        assert_eq!(res, Err(AssignmentError::MissingItemId { row: 2 }));
        assert_eq!(b.rows().len(), 1);
    }

    #[test]
    fn runs_with_the_selected_policy() {
        let mut b = Builder::new(&AssignmentRules::new(100))
            .unwrap()
            .policy(SelectionPolicy::PerReviewerPercentage)
            .unwrap();
        b.add_review_simple("1", "a@snowcorp.com").unwrap();
        b.add_review_simple("1", "b@snowcorp.com").unwrap();
        let res = b.run(&mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(res.unique_items, 1);
        assert_eq!(res.assigned_items(), 2);
    }
}
