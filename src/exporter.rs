use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::importer::excel_epoch;
use crate::models::{CellValue, Table};

pub const REPORT_FILENAME: &str = "Relatorio_Analitico_Franquias.xlsx";
pub const SHEET_ORIGINAL: &str = "Base_Completa";
pub const SHEET_FILTERED: &str = "Dados_Filtrados";

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

pub fn datetime_to_excel_serial(dt: &NaiveDateTime) -> f64 {
    (*dt - excel_epoch()).num_milliseconds() as f64 / 86_400_000.0
}

fn write_table(sheet: &mut Worksheet, table: &Table, date_format: &Format) -> Result<()> {
    let header = Format::new().set_bold();
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (i, record) in table.records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in record.cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
                CellValue::Number(n) => {
                    sheet.write_number(row, col, *n)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                CellValue::DateTime(dt) => {
                    sheet.write_number_with_format(
                        row,
                        col,
                        datetime_to_excel_serial(dt),
                        date_format,
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Build the two-sheet report workbook in memory.
pub fn export(original: &Table, filtered: &Table) -> Result<Vec<u8>> {
    let date_format = Format::new().set_num_format(DATETIME_FORMAT);
    let mut workbook = Workbook::new();

    for (name, table) in [(SHEET_ORIGINAL, original), (SHEET_FILTERED, filtered)] {
        let sheet = workbook.add_worksheet().set_name(name)?;
        write_table(sheet, table, &date_format)?;
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::info!(
        original = original.len(),
        filtered = filtered.len(),
        size = bytes.len(),
        "report built"
    );
    Ok(bytes)
}

/// Write report bytes as `Relatorio_Analitico_Franquias.xlsx` inside `dir`.
pub fn write_report(dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(REPORT_FILENAME);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{record, table};
    use calamine::{Data, Reader};

    fn read_back(bytes: Vec<u8>) -> calamine::Sheets<std::io::Cursor<Vec<u8>>> {
        calamine::open_workbook_auto_from_rs(std::io::Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_two_named_sheets_with_row_counts() {
        let original = table(vec![
            record("A", "X", "Copo", 10.0),
            record("B", "X", "Copo", 20.0),
            record("C", "CAIXA DE PIZZA", "Caixa", 30.0),
        ]);
        let filtered = table(original.records[..2].to_vec());
        let mut wb = read_back(export(&original, &filtered).unwrap());

        assert_eq!(wb.sheet_names(), vec![SHEET_ORIGINAL, SHEET_FILTERED]);
        let base = wb.worksheet_range(SHEET_ORIGINAL).unwrap();
        let filt = wb.worksheet_range(SHEET_FILTERED).unwrap();
        // header row + data rows
        assert_eq!(base.height(), 4);
        assert_eq!(filt.height(), 3);
    }

    #[test]
    fn test_columns_and_values_mirror_table() {
        let original = table(vec![record("Centro", "Copos", "Copo 300ml", 12.5)]);
        let mut wb = read_back(export(&original, &original).unwrap());
        let range = wb.worksheet_range(SHEET_FILTERED).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            header,
            vec!["Data Emissao", "R$ Total", "FRANQUIA", "Categoria", "Descrição Item"]
        );
        assert_eq!(rows[1][1], Data::Float(12.5));
        assert_eq!(rows[1][2], Data::String("Centro".to_string()));
        match &rows[1][0] {
            Data::DateTime(dt) => assert_eq!(dt.as_f64(), 45730.0),
            other => panic!("expected a date cell, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_filtered_sheet_still_has_header() {
        let original = table(vec![record("A", "X", "Copo", 1.0)]);
        let filtered = table(Vec::new());
        let mut wb = read_back(export(&original, &filtered).unwrap());
        let range = wb.worksheet_range(SHEET_FILTERED).unwrap();
        assert_eq!(range.height(), 1);
    }

    #[test]
    fn test_excel_serial_roundtrip() {
        let dt = chrono::NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(datetime_to_excel_serial(&dt), 45667.5);
    }

    #[test]
    fn test_write_report_uses_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let path = write_report(&out, b"xlsx").unwrap();
        assert!(path.ends_with(REPORT_FILENAME));
        assert_eq!(std::fs::read(path).unwrap(), b"xlsx");
    }
}
