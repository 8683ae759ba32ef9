use crate::models::{AggregatedTable, COLUMNS, DATE_COLUMNS, ExportedWorkbook};
use crate::services::error::ConvertError;
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

pub const FILENAME_PREFIX: &str = "atmos_converted";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub sheet_name: String,
    /// Write `YYYY-MM-DD` values in date columns as date cells instead of text.
    pub date_cells: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            date_cells: false,
        }
    }
}

/// `atmos_converted_<YYYY-MM-DD>.xlsx` for the given conversion date.
pub fn export_filename(date: NaiveDate) -> String {
    format!("{}_{}.xlsx", FILENAME_PREFIX, date.format("%Y-%m-%d"))
}

/// Parse a `YYYY-MM-DD` value into an Excel date. Values outside the 1900 date
/// system (years before 1900 or after 9999) yield `None` and are kept as text.
fn excel_date(value: &str) -> Option<ExcelDateTime> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

/// Serialize `table` into a single-sheet xlsx workbook held in memory.
pub fn export_workbook(
    table: &AggregatedTable,
    options: &ExportOptions,
    date: NaiveDate,
) -> Result<ExportedWorkbook, ConvertError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(idx + 1).map_err(|_| {
            ConvertError::Export(format!("{} rows exceed the worksheet limit", table.len()))
        })?;

        for (col, value) in row.values().iter().enumerate() {
            // Missing values stay blank.
            let Some(value) = value else { continue };

            let as_date = if options.date_cells && DATE_COLUMNS.contains(&col) {
                excel_date(value)
            } else {
                None
            };

            match as_date {
                Some(datetime) => {
                    worksheet.write_datetime_with_format(row_num, col as u16, &datetime, &date_format)?;
                }
                None => {
                    worksheet.write_string(row_num, col as u16, value)?;
                }
            }
        }
    }

    worksheet.autofit();

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(rows = table.len(), bytes = bytes.len(), "workbook serialized");

    Ok(ExportedWorkbook {
        filename: export_filename(date),
        bytes,
        rows: table.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedRow;
    use calamine::{Data, Reader, open_workbook_auto_from_rs};
    use std::io::Cursor;

    fn row(values: [&str; 9]) -> NormalizedRow {
        NormalizedRow::new(values.map(|v| {
            if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            }
        }))
    }

    fn sample_table() -> AggregatedTable {
        AggregatedTable {
            rows: vec![
                row(["u1", "c1", "cn1", "2023-01-01", "", "", "Complete", "Yes", "p1"]),
                row(["00042", "c2", "Ünïcödé", "2023-02-02", "", "", "Pending", "No", "p2"]),
            ],
            sources: vec![],
        }
    }

    fn read_back(bytes: Vec<u8>, sheet: &str) -> Vec<Vec<Data>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(sheet).unwrap();
        range.rows().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();
        assert_eq!(export_filename(date), "atmos_converted_2024-12-09.xlsx");
    }

    #[test]
    fn test_round_trip_preserves_strings() {
        let table = sample_table();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let exported = export_workbook(&table, &ExportOptions::default(), date).unwrap();

        assert_eq!(exported.filename, "atmos_converted_2024-01-02.xlsx");
        assert_eq!(exported.rows, 2);

        let rows = read_back(exported.bytes, "Sheet1");
        assert_eq!(rows.len(), 3);

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, COLUMNS.to_vec());

        for (data_row, expected) in rows[1..].iter().zip(table.rows.iter()) {
            for (cell, value) in data_row.iter().zip(expected.values().iter()) {
                assert_eq!(cell.to_string(), value.clone().unwrap_or_default());
            }
        }
        // Leading zeros survive because cells are text.
        assert_eq!(rows[2][0], Data::String("00042".to_string()));
    }

    #[test]
    fn test_date_cells_option() {
        let options = ExportOptions {
            sheet_name: "Records".to_string(),
            date_cells: true,
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let exported = export_workbook(&sample_table(), &options, date).unwrap();

        let rows = read_back(exported.bytes, "Records");
        assert!(matches!(rows[1][3], Data::DateTime(_) | Data::Float(_)));
        // Non-date columns are untouched.
        assert_eq!(rows[1][0], Data::String("u1".to_string()));
    }

    #[test]
    fn test_date_cells_around_the_1900_epoch() {
        let options = ExportOptions {
            sheet_name: "Sheet1".to_string(),
            date_cells: true,
        };
        let table = AggregatedTable {
            rows: vec![
                row(["u1", "c1", "cn1", "1900-01-15", "1900-03-01", "1899-06-01", "s", "q", "p"]),
            ],
            sources: vec![],
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let exported = export_workbook(&table, &options, date).unwrap();
        let rows = read_back(exported.bytes, "Sheet1");

        let serial = |cell: &Data| match cell {
            Data::DateTime(dt) => dt.as_f64(),
            Data::Float(f) => *f,
            other => panic!("expected a date cell, got {other:?}"),
        };
        // Excel counts the nonexistent 1900-02-29, so serials jump by one after February.
        assert_eq!(serial(&rows[1][3]), 15.0);
        assert_eq!(serial(&rows[1][4]), 61.0);
        // Dates before the epoch cannot be represented and stay as text.
        assert_eq!(rows[1][5], Data::String("1899-06-01".to_string()));
    }

    #[test]
    fn test_invalid_sheet_name_is_export_error() {
        let options = ExportOptions {
            sheet_name: "bad[name]".to_string(),
            date_cells: false,
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(matches!(
            export_workbook(&sample_table(), &options, date),
            Err(ConvertError::Export(_))
        ));
    }
}
