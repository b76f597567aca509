use std::fmt;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::loader::{excel_serial_to_naive, parse_date, parse_number};

/// Column the date-range filter reads.
pub const DATE_COLUMN: &str = "Date";

// ---------------------------------------------------------------------------
// Cells and rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric reading of the cell. Text is parsed by its leading float
    /// prefix, so `"12 kg"` reads as 12.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_number(s),
            CellValue::Empty => None,
        }
    }

    /// Date reading of the cell. Numbers are taken as Excel serial days.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Number(n) => excel_serial_to_naive(*n),
            CellValue::Text(s) => parse_date(s),
            CellValue::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn format_number(n: f64) -> String {
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    if n == 0.0 {
        return "0".into();
    }
    format!("{n}")
}

const EMPTY_CELL: &CellValue = &CellValue::Empty;

/// One record: column name to cell, in sheet column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, CellValue)>) -> Self {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.insert(k, v);
        }
        row
    }

    /// Set a cell, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Missing columns read as `Empty`.
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
            .unwrap_or(EMPTY_CELL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present: Vec<_> = self.cells.iter().filter(|(_, v)| !v.is_empty()).collect();
        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (k, v) in present {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column name to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((k, v)) = access.next_entry::<String, CellValue>()? {
                    row.insert(k, v);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub numbers: usize,
    pub texts: usize,
    pub empties: usize,
}

impl ColumnProfile {
    pub fn kind(&self) -> &'static str {
        match (self.numbers, self.texts) {
            (0, 0) => "empty",
            (_, 0) => "number",
            (0, _) => "text",
            _ => "mixed",
        }
    }
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { rows, columns }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn profile(&self) -> Vec<ColumnProfile> {
        self.columns
            .iter()
            .map(|col| {
                let mut p = ColumnProfile {
                    name: col.clone(),
                    numbers: 0,
                    texts: 0,
                    empties: 0,
                };
                for row in &self.rows {
                    match row.get(col) {
                        CellValue::Number(_) => p.numbers += 1,
                        CellValue::Text(_) => p.texts += 1,
                        CellValue::Empty => p.empties += 1,
                    }
                }
                p
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSelection {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl AxisSelection {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            value: Some(value.into()),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|c| !c.is_empty())
    }

    /// Both columns, when both are chosen.
    pub fn complete(&self) -> Option<(&str, &str)> {
        Some((self.category()?, self.value()?))
    }

    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Parallel label/value sequences; labels are unique, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Copy ordered by value, largest first. Ties keep their order.
    pub fn ranked(&self) -> AggregatedSeries {
        let mut pairs: Vec<(&str, f64)> = self.iter().collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        AggregatedSeries {
            labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFileEntry {
    pub name: String,
    /// RFC 3339 timestamp of the last load.
    pub date: String,
    pub size: u64,
    #[serde(default)]
    pub is_pinned: bool,
}

/// One file written by `export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Format label, e.g. `CSV`.
    pub kind: String,
    /// RFC 3339 timestamp of the write.
    pub time: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

impl ChartType {
    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Bar => "Bar chart",
            ChartType::Line => "Line chart",
            ChartType::Pie => "Pie chart",
        }
    }
}

impl std::str::FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            other => Err(format!("unknown chart type '{other}' (expected bar, line or pie)")),
        }
    }
}

/// Saved dashboard settings that shape an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default)]
    pub axes: AxisSelection,
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub sort: SortState,
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub rank: bool,
    #[serde(default)]
    pub chart_type: ChartType,
    #[serde(default)]
    pub chart_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTemplate {
    pub name: String,
    pub settings: ViewSettings,
}
