// Primitives for reading CSV files.

use crate::split::{
    io_common::{parse_text_value, ReviewColumns},
    *,
};

pub fn read_csv_reviews(path: &str) -> BSplitResult<Vec<ReviewRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<Option<String>> = rdr
        .headers()
        .context(CsvLineParseSnafu {})?
        .iter()
        .map(|s| Some(s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();
    debug!("read_csv_reviews: header: {:?}", header);
    let cols = ReviewColumns::from_header(&header)?;

    let mut res: Vec<ReviewRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        if line.iter().all(|s| s.trim().is_empty()) {
            debug!("read_csv_reviews: skipping empty line {}", lineno);
            continue;
        }
        let cells: Vec<Option<FieldValue>> = line.iter().map(parse_text_value).collect();
        let review = cols.make_row(&cells);
        debug!("read_csv_reviews: line {}: {:?}", lineno, review);
        res.push(review);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_str(contents: &str) -> BSplitResult<Vec<ReviewRow>> {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("reviews.csv");
        std::fs::write(&p, contents).unwrap();
        read_csv_reviews(&p.display().to_string())
    }

    #[test]
    fn reads_reviews() {
        let rows = read_str(
            "Reviewer,Item ID,Extra\n\
             a@snowcorp.com,12,x\n\
             ,,\n\
             b@snowcorp.com,A-3\n\
             ,14,y\n",
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![
                ReviewRow::new(12, "a@snowcorp.com"),
                ReviewRow::new("A-3", "b@snowcorp.com"),
                ReviewRow {
                    item_id: Some(FieldValue::Number(14.0)),
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn reads_optional_columns() {
        let rows = read_str(
            "Review ID,Item ID,Reviewer,Review Updated At\n\
             r-1,7,a@snowcorp.com,2024-05-01T10:00:00Z\n",
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![ReviewRow {
                review_id: Some(FieldValue::Text("r-1".to_string())),
                ..ReviewRow::new(7, "a@snowcorp.com").updated_at("2024-05-01T10:00:00Z")
            }]
        );
    }

    #[test]
    fn missing_reviewer_column() {
        let err = read_str("Item ID,Assessor\n1,a@snowcorp.com\n").unwrap_err();
        assert!(matches!(*err, SplitError::MissingColumn { ref column } if column == "Reviewer"));
    }

    #[test]
    fn missing_file() {
        let err = read_csv_reviews("/nonexistent/reviews.csv").unwrap_err();
        assert!(matches!(*err, SplitError::CsvOpen { .. }));
    }
}
