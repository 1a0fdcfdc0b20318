//! Spreadsheet workbook loading (xlsx, xlsm, xlsb, xls, ods) via calamine.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

use crate::error::{FormularyError, Result};
use crate::table::{Column, ColumnType, Table, Value};

use super::infer::{dedupe_headers, is_null_value, parse_date, parse_datetime};

/// Read one worksheet from workbook bytes.
///
/// `sheet` selects by 0-based index or by name; the first sheet is used when it
/// is `None`. Returns the table and the name of the sheet that was read.
pub(crate) fn read_workbook(
    source_name: &str,
    bytes: Vec<u8>,
    sheet: Option<&str>,
    max_rows: Option<usize>,
) -> Result<(Table, String)> {
    let fail = |msg: String| FormularyError::load(source_name, msg);

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| fail(format!("Excel: {}", e)))?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(fail("Workbook has no worksheets".to_string()));
    }

    let (sheet_name, range) = match sheet {
        Some(sel) => match sel.parse::<usize>() {
            Ok(idx) => {
                let name = sheet_names
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| fail(format!("No sheet at index {}", idx)))?;
                let range = workbook
                    .worksheet_range_at(idx)
                    .ok_or_else(|| fail(format!("No sheet at index {}", idx)))?
                    .map_err(|e| fail(format!("Excel: {}", e)))?;
                (name, range)
            }
            Err(_) => {
                if !sheet_names.iter().any(|n| n == sel) {
                    return Err(fail(format!(
                        "No sheet named '{}' (available: {})",
                        sel,
                        sheet_names.join(", ")
                    )));
                }
                let range = workbook
                    .worksheet_range(sel)
                    .map_err(|e| fail(format!("Excel: {}", e)))?;
                (sel.to_string(), range)
            }
        },
        None => {
            let range = workbook
                .worksheet_range_at(0)
                .ok_or_else(|| fail("Workbook has no first sheet".to_string()))?
                .map_err(|e| fail(format!("Excel: {}", e)))?;
            (sheet_names[0].clone(), range)
        }
    };

    let rows: Vec<Vec<Data>> = range
        .rows()
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .map(|r| r.to_vec())
        .collect();

    let columns = columns_from_rows(&rows, max_rows).map_err(fail)?;
    let table = Table::from_columns(columns).map_err(|e| fail(e.to_string()))?;
    Ok((table, sheet_name))
}

/// Turn a header row plus data rows of cells into typed columns.
fn columns_from_rows(
    rows: &[Vec<Data>],
    max_rows: Option<usize>,
) -> std::result::Result<Vec<Column>, String> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Err("Worksheet is empty".to_string());
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|c| c.as_string().unwrap_or_else(|| c.to_string()).trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err("No header row found".to_string());
    }
    let headers = dedupe_headers(headers);

    let limit = max_rows.unwrap_or(usize::MAX).min(data_rows.len());
    let data_rows = &data_rows[..limit];

    Ok(headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Option<&Data>> = data_rows.iter().map(|row| row.get(idx)).collect();
            cell_column(name, &cells)
        })
        .collect())
}

/// Build a column from cells; whole-number float columns fold to integers.
fn cell_column(name: &str, cells: &[Option<&Data>]) -> Column {
    let mut values: Vec<Value> = cells.iter().map(|c| c.map_or(Value::Null, cell_value)).collect();

    let has_float = values.iter().any(|v| matches!(v, Value::Float(_)));
    let all_whole = values.iter().all(|v| match v {
        Value::Null | Value::Int(_) => true,
        Value::Float(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64,
        _ => false,
    });
    if has_float && all_whole {
        values = values
            .into_iter()
            .map(|v| match v {
                Value::Float(f) => Value::Int(f as i64),
                other => other,
            })
            .collect();
    }

    let column = Column::new(name, values);
    if column.column_type() != ColumnType::String {
        return column;
    }

    // Mixed kinds: every non-empty cell keeps its display text
    let text = cells
        .iter()
        .map(|c| match c {
            Some(cell) if !matches!(cell_value(cell), Value::Null) => match cell {
                Data::String(s) => Value::Str(s.clone()),
                other => Value::Str(other.to_string()),
            },
            _ => Value::Null,
        })
        .collect();
    Column::new(name, text)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if is_null_value(s) => Value::Null,
        Data::String(s) => Value::Str(s.clone()),
        Data::DateTime(_) => cell.as_datetime().map_or(Value::Null, temporal),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(temporal)
            .or_else(|| parse_date(s).map(Value::Date))
            .unwrap_or_else(|| Value::Str(s.clone())),
        Data::DurationIso(s) => Value::Str(s.clone()),
    }
}

/// Midnight timestamps become plain dates.
fn temporal(dt: chrono::NaiveDateTime) -> Value {
    if dt.time() == chrono::NaiveTime::MIN {
        Value::Date(dt.date())
    } else {
        Value::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn test_columns_from_rows() {
        let rows = vec![
            vec![s("Product"), s("Price"), s("Qty")],
            vec![s("Laptop"), Data::Float(999.5), Data::Float(2.0)],
            vec![s("Mouse"), Data::Float(20.0), Data::Float(10.0)],
        ];
        let columns = columns_from_rows(&rows, None).unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[1].column_type(), ColumnType::Float);
        assert_eq!(columns[2].column_type(), ColumnType::Integer);
        assert_eq!(columns[2].values(), &[Value::Int(2), Value::Int(10)]);
    }

    #[test]
    fn test_short_rows_pad_with_null() {
        let rows = vec![vec![s("a"), s("b")], vec![Data::Int(1)]];
        let columns = columns_from_rows(&rows, None).unwrap();
        assert_eq!(columns[1].values(), &[Value::Null]);
    }

    #[test]
    fn test_mixed_cells_use_display_text() {
        let col = cell_column("id", &[Some(&Data::Float(7.0)), Some(&s("P001"))]);
        assert_eq!(col.column_type(), ColumnType::String);
        assert_eq!(col.values()[1], Value::Str("P001".into()));
    }

    #[test]
    fn test_iso_date_cells() {
        let cell = Data::DateTimeIso("2024-03-01".to_string());
        let col = cell_column("d", &[Some(&cell), Some(&Data::Empty)]);
        assert_eq!(col.column_type(), ColumnType::Date);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_empty_sheet_fails() {
        assert!(columns_from_rows(&[], None).is_err());
    }

    #[test]
    fn test_duplicate_headers() {
        let rows = vec![vec![s("x"), s("x"), Data::Empty], vec![Data::Int(1), Data::Int(2), Data::Int(3)]];
        let columns = columns_from_rows(&rows, None).unwrap();
        let names: Vec<&str> = columns.iter().map(Column::name).collect();
        assert_eq!(names, vec!["x", "x.1", "column_3"]);
    }

    #[test]
    fn test_max_rows() {
        let rows = vec![vec![s("n")], vec![Data::Int(1)], vec![Data::Int(2)]];
        let columns = columns_from_rows(&rows, Some(1)).unwrap();
        assert_eq!(columns[0].len(), 1);
    }

    #[test]
    fn test_invalid_bytes_fail_to_load() {
        let err = read_workbook("broken.xlsx", b"not a workbook".to_vec(), None, None).unwrap_err();
        assert!(matches!(err, FormularyError::Load { .. }));
    }
}
