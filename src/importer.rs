use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DashError, Result};
use crate::models::{CellValue, Record, Table, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

/// Parse a date, reading ambiguous `a/b/c` forms as day/month/year.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Serial of 9999-12-31, the last day Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Excel day zero, 1899-12-30 (accounting for the 1900 leap year bug).
pub fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("1899-12-30 is a valid date")
}

pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(chrono::Duration::try_milliseconds(millis)?)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn coerce_datetime(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(n) => excel_serial_to_datetime(*n),
        CellValue::Text(s) => parse_date_dmy(s),
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

fn coerce_amount(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        CellValue::DateTime(_) | CellValue::Empty => return None,
    };
    value.is_finite().then_some(value)
}

fn coerce_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(s) if s.is_empty() => None,
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Number(n) => Some(format_number(*n)),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        CellValue::Empty => None,
    }
}

// ---------------------------------------------------------------------------
// Source formats — chosen by file extension
// ---------------------------------------------------------------------------

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Spreadsheet,
    Delimited,
}

impl SourceFormat {
    pub fn from_filename(filename: &str) -> Self {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if SPREADSHEET_EXTENSIONS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ext))
        {
            Self::Spreadsheet
        } else {
            Self::Delimited
        }
    }

    fn read(&self, bytes: &[u8]) -> Result<RawSheet> {
        match self {
            Self::Spreadsheet => read_spreadsheet(bytes),
            Self::Delimited => read_delimited(bytes),
        }
    }
}

/// Header plus rows, before validation. Delimited sources arrive as raw
/// text (`typed == false`) and are typed once the required columns are known.
struct RawSheet {
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    typed: bool,
}

fn read_spreadsheet(bytes: &[u8]) -> Result<RawSheet> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashError::Parse("workbook contains no sheets".to_string()))??;

    let mut rows = range.rows().map(|row| {
        row.iter()
            .map(|cell| match cell {
                Data::Int(i) => CellValue::Number(*i as f64),
                Data::Float(f) => CellValue::Number(*f),
                Data::String(s) => CellValue::Text(s.clone()),
                Data::Bool(b) => CellValue::Bool(*b),
                Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(dt.as_f64())),
                Data::DateTimeIso(s) => parse_date_dmy(s)
                    .map(CellValue::DateTime)
                    .unwrap_or_else(|| CellValue::Text(s.clone())),
                Data::DurationIso(s) => CellValue::Text(s.clone()),
                Data::Error(_) | Data::Empty => CellValue::Empty,
            })
            .collect::<Vec<_>>()
    });

    let header = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(i, c)| header_name(i, c))
            .collect(),
        None => return Err(DashError::Parse("worksheet is empty".to_string())),
    };
    Ok(RawSheet {
        header,
        rows: rows.collect(),
        typed: true,
    })
}

fn header_name(index: usize, cell: &CellValue) -> String {
    coerce_text(cell)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("Unnamed: {index}"))
}

fn raw_field(raw: &str) -> CellValue {
    if raw.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// Type a delimited text field: numbers become `Number`, the rest stays text.
fn infer_field(cell: CellValue) -> CellValue {
    match cell {
        CellValue::Text(raw) => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw),
        },
        other => other,
    }
}

fn read_delimited(bytes: &[u8]) -> Result<RawSheet> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DashError::Parse(format!("file is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let header: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            }
        })
        .collect();
    if header.is_empty() {
        return Err(DashError::Parse("no columns to parse from file".to_string()));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() > header.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(DashError::Parse(format!(
                "line {line}: expected {} fields, saw {}",
                header.len(),
                record.len()
            )));
        }
        rows.push(record.iter().map(raw_field).collect());
    }
    Ok(RawSheet {
        header,
        rows,
        typed: false,
    })
}

// ---------------------------------------------------------------------------
// Validation and coercion
// ---------------------------------------------------------------------------

/// Positions of the required columns within the header.
struct RequiredIndex {
    issue_date: usize,
    total: usize,
    franchise: usize,
    category: usize,
    item: usize,
}

impl RequiredIndex {
    fn locate(columns: &[String]) -> Result<Self> {
        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS
            .iter()
            .map(|name| columns.iter().position(|c| c == name))
            .collect();
        match positions[..] {
            [Some(issue_date), Some(total), Some(franchise), Some(category), Some(item)] => {
                Ok(Self {
                    issue_date,
                    total,
                    franchise,
                    category,
                    item,
                })
            }
            _ => Err(DashError::MissingColumns(
                REQUIRED_COLUMNS
                    .iter()
                    .zip(&positions)
                    .filter(|(_, p)| p.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect(),
            )),
        }
    }

    /// Identifier columns keep their text exactly as written.
    fn is_text_column(&self, col: usize) -> bool {
        col == self.franchise || col == self.category || col == self.item
    }

    /// Coerce one row. `None` when any required value is missing or invalid.
    fn record(&self, mut cells: Vec<CellValue>) -> Option<Record> {
        let issue_date = coerce_datetime(&cells[self.issue_date])?;
        let total = coerce_amount(&cells[self.total])?;
        let franchise = coerce_text(&cells[self.franchise])?;
        let category = coerce_text(&cells[self.category])?;
        let item = coerce_text(&cells[self.item])?;
        cells[self.issue_date] = CellValue::DateTime(issue_date);
        cells[self.total] = CellValue::Number(total);
        cells[self.franchise] = CellValue::Text(franchise.clone());
        cells[self.category] = CellValue::Text(category.clone());
        cells[self.item] = CellValue::Text(item.clone());
        Some(Record {
            issue_date,
            total,
            franchise,
            category,
            item,
            cells,
        })
    }
}

fn build_table(sheet: RawSheet) -> Result<(Table, usize)> {
    let columns = sheet.header;
    let index = RequiredIndex::locate(&columns)?;

    let mut records = Vec::with_capacity(sheet.rows.len());
    let mut dropped = 0usize;
    for mut cells in sheet.rows {
        cells.resize(columns.len(), CellValue::Empty);
        if !sheet.typed {
            cells = cells
                .into_iter()
                .enumerate()
                .map(|(col, cell)| {
                    if index.is_text_column(col) {
                        cell
                    } else {
                        infer_field(cell)
                    }
                })
                .collect();
        }
        match index.record(cells) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }
    Ok((Table { columns, records }, dropped))
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

/// Decode an uploaded file into a validated table plus a user-facing message.
pub fn parse(bytes: &[u8], filename: &str) -> Result<(Table, String)> {
    let format = SourceFormat::from_filename(filename);
    tracing::debug!(file = filename, ?format, size = bytes.len(), "decoding upload");

    let (table, dropped) = build_table(format.read(bytes)?)?;
    tracing::info!(file = filename, rows = table.len(), dropped, "upload parsed");

    let message = format!(
        "File '{filename}' loaded: {} rows ({dropped} dropped).",
        table.len()
    );
    Ok((table, message))
}
