// Reading review records from spreadsheets (xlsx, xls, ods).

use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::split::{io_common::ReviewColumns, *};

pub fn read_excel_reviews(path: &str, config: &SplitConfig) -> BSplitResult<Vec<ReviewRow>> {
    let wrange = get_range(path, config.excel_worksheet_name.as_deref())?;

    let mut iter = wrange.rows();
    let header: Vec<Option<String>> = iter
        .next()
        .context(EmptyExcelSnafu {})?
        .iter()
        .map(|cell| match cell {
            DataType::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .collect();
    debug!("read_excel_reviews: header: {:?}", header);
    let cols = ReviewColumns::from_header(&header)?;
    let used_cols = cols.indexes();

    // Line numbers as displayed by spreadsheet programs.
    let first_line = wrange.start().map(|(r, _)| r as u64 + 1).unwrap_or(1);

    let mut res: Vec<ReviewRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = first_line + idx as u64 + 1;
        if row.iter().all(|cell| *cell == DataType::Empty) {
            debug!("read_excel_reviews: skipping empty line {}", lineno);
            continue;
        }
        let mut cells: Vec<Option<FieldValue>> = vec![None; row.len()];
        for col in used_cols.iter() {
            if let Some(cell) = row.get(*col) {
                cells[*col] = read_cell(cell, lineno)?;
            }
        }
        let review = cols.make_row(&cells);
        debug!("read_excel_reviews: line {}: {:?}", lineno, review);
        res.push(review);
    }
    Ok(res)
}

fn read_cell(cell: &DataType, lineno: u64) -> BSplitResult<Option<FieldValue>> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => Ok(None),
        DataType::String(s) => Ok(Some(FieldValue::Text(s.trim().to_string()))),
        DataType::Float(f) => Ok(Some(FieldValue::Number(*f))),
        DataType::Int(i) => Ok(Some(FieldValue::Number(*i as f64))),
        // Dates are kept as serial numbers.
        DataType::DateTime(f) => Ok(Some(FieldValue::Number(*f))),
        DataType::Bool(b) => Ok(Some(FieldValue::Text(b.to_string()))),
        DataType::Empty => Ok(None),
        DataType::Error(_) => Err(Box::new(SplitError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        })),
    }
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> BSplitResult<Range<DataType>> {
    debug!(
        "read_excel_reviews: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(UnknownWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.len() > 1 {
            info!(
                "{:?} has {} worksheets {:?}, reading the first one",
                path,
                sheet_names.len(),
                sheet_names
            );
        }
        let wrange = workbook
            .worksheet_range_at(0)
            .context(MissingWorksheetSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}
