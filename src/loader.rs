use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use tracing::{debug, info};

use crate::error::{SheetlensError, Result};
use crate::models::{CellValue, Dataset, Row};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Leading-prefix float parse: `"  12.5kg"` → 12.5, `"abc"` → None.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        let inf = f64::INFINITY;
        return Some(if bytes.first() == Some(&b'-') { -inf } else { inf });
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        i = j;
    }
    if digits == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse().ok()
}

/// Whole-field numeric literal, used to type CSV cells.
fn parse_numeric_literal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
        return None;
    }
    s.parse().ok()
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Serial days after the Excel epoch, up to 9999-12-31.
pub fn excel_serial_to_naive(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    Some(excel_epoch()?.date() + Duration::days(serial.floor() as i64))
}

pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    if serial.fract() == 0.0 {
        return excel_serial_to_naive(serial).map(|d| d.format("%Y-%m-%d").to_string());
    }
    excel_serial_to_naive(serial)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let dt = excel_epoch()? + Duration::milliseconds(millis);
    Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Header row → column names. Blank headers become `__EMPTY`, `__EMPTY_1`, …
/// and repeats get `_1`, `_2`, … suffixes.
pub fn column_names(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .map(|h| {
            let base = if h.trim().is_empty() { "__EMPTY" } else { h.as_str() };
            let count = seen.entry(base.to_string()).or_insert(0);
            let name = if *count == 0 {
                base.to_string()
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

/// Build a dataset from a cell grid whose first row is the header.
/// All-empty rows are dropped.
pub fn build_dataset(grid: Vec<Vec<CellValue>>) -> Dataset {
    let mut records = grid.into_iter();
    let Some(header) = records.next() else {
        return Dataset::default();
    };
    let data: Vec<Vec<CellValue>> = records.collect();
    let width = data.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);

    let mut raw: Vec<String> = header.iter().map(CellValue::display).collect();
    raw.resize(width, String::new());
    let columns = column_names(&raw);

    let rows = data
        .into_iter()
        .filter_map(|cells| {
            let row = Row::from_pairs(
                columns
                    .iter()
                    .zip(cells)
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(c, v)| (c.clone(), v)),
            );
            (!row.is_empty()).then_some(row)
        })
        .collect();

    Dataset::new(columns, rows)
}

// ---------------------------------------------------------------------------
// Source kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Csv,
    Tsv,
    Workbook,
}

impl SourceKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Workbook => "workbook",
        }
    }

    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "xlam" | "ods" => Self::Workbook,
            "tsv" | "tab" => Self::Tsv,
            _ => Self::Csv,
        }
    }

    pub fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        match self {
            Self::Csv | Self::Tsv => Ok(vec![file_stem(path)]),
            Self::Workbook => workbook_sheet_names(path),
        }
    }

    /// Returns the selected sheet's name with its cell grid.
    pub fn read(&self, path: &Path, sheet: Option<&str>) -> Result<(String, Vec<Vec<CellValue>>)> {
        match self {
            Self::Csv | Self::Tsv => {
                let stem = file_stem(path);
                if let Some(name) = sheet {
                    if name != stem {
                        return Err(SheetlensError::UnknownSheet(name.to_string()));
                    }
                }
                let delimiter = if *self == Self::Tsv { b'\t' } else { b',' };
                Ok((stem, read_delimited(path, delimiter)?))
            }
            Self::Workbook => read_workbook(path, sheet),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}

// ---------------------------------------------------------------------------
// load_file
// ---------------------------------------------------------------------------

pub struct LoadedSheet {
    pub dataset: Dataset,
    pub sheet_names: Vec<String>,
    pub sheet: String,
}

pub fn load_file(path: &Path, sheet: Option<&str>) -> Result<LoadedSheet> {
    let kind = SourceKind::detect(path);
    debug!(path = %path.display(), kind = kind.key(), "loading spreadsheet");

    let sheet_names = kind.sheet_names(path)?;
    let (sheet, grid) = kind.read(path, sheet)?;
    let dataset = build_dataset(grid);

    info!(
        sheet = %sheet,
        rows = dataset.len(),
        columns = dataset.columns.len(),
        "loaded sheet"
    );
    Ok(LoadedSheet {
        dataset,
        sheet_names,
        sheet,
    })
}

pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    SourceKind::detect(path).sheet_names(path)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<CellValue>>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(std::io::BufReader::new(file));

    let mut grid = Vec::new();
    for (i, result) in rdr.byte_records().enumerate() {
        let record = result?;
        let cells = record
            .iter()
            .enumerate()
            .map(|(j, raw)| {
                let decoded = decode_field(raw);
                let field = if i == 0 && j == 0 {
                    decoded.trim_start_matches('\u{feff}')
                } else {
                    decoded.as_ref()
                };
                if i == 0 {
                    return CellValue::Text(field.trim().to_string());
                }
                if field.trim().is_empty() {
                    CellValue::Empty
                } else if let Some(n) = parse_numeric_literal(field) {
                    CellValue::Number(n)
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();
        grid.push(cells);
    }
    Ok(grid)
}

/// UTF-8 when the bytes are valid, Windows-1252 otherwise (Excel's default
/// CSV encoding on Windows).
fn decode_field(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(raw);
            text
        }
    }
}

// ---------------------------------------------------------------------------
// Workbooks (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "excel")]
fn workbook_sheet_names(path: &Path) -> Result<Vec<String>> {
    use calamine::Reader;
    let workbook = calamine::open_workbook_auto(path)?;
    Ok(workbook.sheet_names().to_vec())
}

#[cfg(feature = "excel")]
fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<(String, Vec<Vec<CellValue>>)> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(s) if names.iter().any(|n| n == s) => s.to_string(),
        Some(s) => return Err(SheetlensError::UnknownSheet(s.to_string())),
        None => names
            .first()
            .cloned()
            .ok_or_else(|| SheetlensError::Other(format!("{} has no sheets", path.display())))?,
    };

    let range = workbook.worksheet_range(&name)?;
    let grid = range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Ok((name, grid))
}

#[cfg(feature = "excel")]
fn workbook_cell(cell: &calamine::Data) -> CellValue {
    use calamine::Data;
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) if dt.is_datetime() => match excel_serial_to_date(dt.as_f64()) {
            Some(s) => CellValue::Text(s),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

#[cfg(not(feature = "excel"))]
fn workbook_sheet_names(path: &Path) -> Result<Vec<String>> {
    Err(workbook_unsupported(path))
}

#[cfg(not(feature = "excel"))]
fn read_workbook(path: &Path, _sheet: Option<&str>) -> Result<(String, Vec<Vec<CellValue>>)> {
    Err(workbook_unsupported(path))
}

#[cfg(not(feature = "excel"))]
fn workbook_unsupported(path: &Path) -> SheetlensError {
    SheetlensError::UnsupportedFormat(format!(
        "{} (workbooks require the 'excel' feature)",
        path.display()
    ))
}
