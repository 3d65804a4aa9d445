// Writing the assignments, one line per reviewer and item.

use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::split::{
    io_common::{ITEM_ID, REVIEWER},
    *,
};

pub const ASSIGNMENTS_SHEET: &str = "Assignments";

/// Flattens the assignments into `(reviewer, item id)` pairs, keeping the order.
pub fn flatten_assignments(assignments: &[ReviewerAssignment]) -> Vec<(&str, &str)> {
    assignments
        .iter()
        .flat_map(|a| {
            a.item_ids
                .iter()
                .map(move |item_id| (a.reviewer.as_str(), item_id.as_str()))
        })
        .collect()
}

/// Writes the assignments to `path`. A `.csv` extension gives a CSV file,
/// anything else an Excel workbook with a single sheet.
pub fn write_assignments(path: &str, assignments: &[ReviewerAssignment]) -> BSplitResult<()> {
    let lines = flatten_assignments(assignments);
    info!("Writing {} assignments to {:?}", lines.len(), path);
    let is_csv = Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        write_csv(path, &lines)
    } else {
        write_xlsx(path, &lines)
    }
}

fn write_xlsx(path: &str, lines: &[(&str, &str)]) -> BSplitResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(ASSIGNMENTS_SHEET)
        .context(WritingExcelSnafu { path })?;
    sheet
        .write_string(0, 0, REVIEWER)
        .context(WritingExcelSnafu { path })?;
    sheet
        .write_string(0, 1, ITEM_ID)
        .context(WritingExcelSnafu { path })?;
    for (idx, (reviewer, item_id)) in lines.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet
            .write_string(row, 0, *reviewer)
            .context(WritingExcelSnafu { path })?;
        sheet
            .write_string(row, 1, *item_id)
            .context(WritingExcelSnafu { path })?;
    }
    workbook.save(path).context(WritingExcelSnafu { path })?;
    Ok(())
}

fn write_csv(path: &str, lines: &[(&str, &str)]) -> BSplitResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(WritingCsvSnafu { path })?;
    wtr.write_record([REVIEWER, ITEM_ID])
        .context(WritingCsvSnafu { path })?;
    for (reviewer, item_id) in lines.iter() {
        wtr.write_record([*reviewer, *item_id])
            .context(WritingCsvSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, DataType, Reader};

    fn assignments() -> Vec<ReviewerAssignment> {
        vec![
            ReviewerAssignment {
                reviewer: "a@snowcorp.com".to_string(),
                item_ids: vec!["12".to_string(), "7".to_string()],
            },
            ReviewerAssignment {
                reviewer: "b@snowcorp.com".to_string(),
                item_ids: vec![],
            },
            ReviewerAssignment {
                reviewer: "c@snowcorp.com".to_string(),
                item_ids: vec!["A-3".to_string()],
            },
        ]
    }

    #[test]
    fn flattens_in_order() {
        let a = assignments();
        assert_eq!(
            flatten_assignments(&a),
            vec![
                ("a@snowcorp.com", "12"),
                ("a@snowcorp.com", "7"),
                ("c@snowcorp.com", "A-3"),
            ]
        );
    }

    #[test]
    fn writes_a_single_sheet_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round2.xlsx").display().to_string();
        write_assignments(&path, &assignments()).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names().to_vec(), vec![ASSIGNMENTS_SHEET.to_string()]);
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let cells: Vec<Vec<String>> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|c| match c {
                        DataType::String(s) => s.clone(),
                        other => format!("{:?}", other),
                    })
                    .collect()
            })
            .collect();
        assert_eq!(
            cells,
            vec![
                vec!["Reviewer", "Item ID"],
                vec!["a@snowcorp.com", "12"],
                vec!["a@snowcorp.com", "7"],
                vec!["c@snowcorp.com", "A-3"],
            ]
        );
    }

    #[test]
    fn writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("round2.csv");
        write_assignments(&p.display().to_string(), &assignments()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&p).unwrap(),
            "Reviewer,Item ID\na@snowcorp.com,12\na@snowcorp.com,7\nc@snowcorp.com,A-3\n"
        );
    }

    #[test]
    fn exported_csv_reads_back_as_reviews() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("round2.csv").display().to_string();
        write_assignments(&p, &assignments()).unwrap();
        let rows = crate::split::io_csv::read_csv_reviews(&p).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], ReviewRow::new("A-3", "c@snowcorp.com"));
    }
}
