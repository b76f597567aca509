use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::aggregate::aggregate;
use crate::fmt::grouped;
use crate::models::{AggregatedSeries, AxisSelection, CellValue, ChartType, Row};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NARRATIVE_PLACEHOLDER: &str = "Upload data and select X/Y axes to get insights.";
pub const NARRATIVE_NO_DATA: &str = "No data to summarize after filtering.";

// ---------------------------------------------------------------------------
// Dataset statistics
// ---------------------------------------------------------------------------

/// Most frequent category by row count. Empty keys are ignored; on a tie the
/// key seen first wins.
pub fn top_category(rows: &[Row], axes: &AxisSelection) -> Option<String> {
    let category = axes.category()?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in rows {
        let key = row.get(category).display();
        if key.is_empty() {
            continue;
        }
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let mut best: Option<(&String, usize)> = None;
    for key in &order {
        let n = counts[key];
        if best.map_or(true, |(_, max)| n > max) {
            best = Some((key, n));
        }
    }
    best.map(|(k, _)| k.clone())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

/// Min and max of the parseable values in the value column.
pub fn value_extent(rows: &[Row], axes: &AxisSelection) -> Option<Extent> {
    let column = axes.value()?;
    rows.iter()
        .filter_map(|r| r.get(column).as_number())
        .fold(None, |acc: Option<Extent>, v| {
            Some(match acc {
                None => Extent { min: v, max: v },
                Some(e) => Extent {
                    min: e.min.min(v),
                    max: e.max.max(v),
                },
            })
        })
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

pub struct NarrativeInput<'a> {
    pub source_name: &'a str,
    pub axes: &'a AxisSelection,
    pub filtered: &'a [Row],
    pub dataset_len: usize,
}

pub fn narrative(input: &NarrativeInput<'_>) -> String {
    let Some((x, y)) = input.axes.complete() else {
        return NARRATIVE_PLACEHOLDER.to_string();
    };
    let Some(grouped_series) = aggregate(input.filtered, input.axes) else {
        return NARRATIVE_PLACEHOLDER.to_string();
    };
    // Blank category text never leads, trails or counts toward the total.
    let (labels, values) = grouped_series
        .iter()
        .filter(|(label, _)| !label.is_empty())
        .map(|(label, value)| (label.to_string(), value))
        .unzip();
    let series = AggregatedSeries { labels, values };
    if series.is_empty() {
        return NARRATIVE_NO_DATA.to_string();
    }

    let ranked = series.ranked();
    let name = input.source_name.strip_suffix(".xlsx").unwrap_or(input.source_name);
    let name = if name.is_empty() { "the uploaded file" } else { name };

    let mut text = format!("The data for **{name}** shows **{y}** aggregated by **{x}**. ");
    text += &format!(
        "The **total {y}** across all categories is **{}**. ",
        grouped(series.total())
    );
    if let Some((label, value)) = ranked.iter().next() {
        text += &format!("**{label}** leads with {y} of **{}**. ", grouped(value));
    }
    if ranked.len() > 1 {
        if let Some((label, value)) = ranked.iter().last() {
            text += &format!(
                "Conversely, **{label}** has the lowest {y} at **{}**. ",
                grouped(value)
            );
        }
    }
    text += &format!(
        "Currently viewing **{} of {} records** after applying filters.",
        input.filtered.len(),
        input.dataset_len
    );
    text
}

// ---------------------------------------------------------------------------
// Chart recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRecommendation {
    NeedsSelection,
    LineOverTime,
    LineAcrossCategories,
    Pie,
    Bar,
    BarOrAggregatedLine,
    NoRecommendation,
}

impl ChartRecommendation {
    pub fn text(&self) -> &'static str {
        match self {
            Self::NeedsSelection => "Please select X and Y axes and ensure data is loaded.",
            Self::LineOverTime => "Line Chart (excellent for showing trends over time)",
            Self::LineAcrossCategories => {
                "Line Chart (good for spotting trends across many categories)"
            }
            Self::Pie => "Pie Chart (ideal for showing proportion of a whole with few categories)",
            Self::Bar => "Bar Chart (effective for comparing distinct categories)",
            Self::BarOrAggregatedLine => {
                "Bar Chart or Aggregated Line Chart (consider grouping categories)"
            }
            Self::NoRecommendation => "No specific recommendation based on current data properties.",
        }
    }

    pub fn chart_type(&self) -> Option<ChartType> {
        match self {
            Self::LineOverTime | Self::LineAcrossCategories => Some(ChartType::Line),
            Self::Pie => Some(ChartType::Pie),
            Self::Bar | Self::BarOrAggregatedLine => Some(ChartType::Bar),
            Self::NeedsSelection | Self::NoRecommendation => None,
        }
    }
}

impl fmt::Display for ChartRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// More than half of the non-empty text cells read as dates.
fn looks_like_dates(cells: &[&CellValue]) -> bool {
    let texts: Vec<&str> = cells.iter().filter_map(|c| c.as_text()).collect();
    let non_empty = cells.iter().filter(|c| !c.is_empty()).count();
    let dates = texts
        .iter()
        .filter(|s| crate::loader::parse_date(s).is_some())
        .count();
    non_empty > 0 && dates * 2 > non_empty
}

pub fn recommend_chart(filtered: &[Row], axes: &AxisSelection) -> ChartRecommendation {
    let Some((x, y)) = axes.complete() else {
        return ChartRecommendation::NeedsSelection;
    };
    if filtered.is_empty() {
        return ChartRecommendation::NeedsSelection;
    }

    let cells: Vec<&CellValue> = filtered.iter().map(|r| r.get(x)).collect();
    let mut distinct: HashSet<String> = HashSet::new();
    let mut has_blank = false;
    for c in &cells {
        match c {
            CellValue::Empty => has_blank = true,
            c => {
                distinct.insert(c.display());
            }
        }
    }
    let unique = distinct.len() + usize::from(has_blank);

    let ys: Vec<f64> = filtered.iter().filter_map(|r| r.get(y).as_number()).collect();
    let (spread, mean) = if ys.is_empty() {
        (0.0, 0.0)
    } else {
        let max = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = ys.iter().copied().fold(f64::INFINITY, f64::min);
        (max - min, ys.iter().sum::<f64>() / ys.len() as f64)
    };
    // 0/0 is NaN, which never passes the threshold.
    let variation = spread / mean;

    if looks_like_dates(&cells) && ys.len() > 10 {
        ChartRecommendation::LineOverTime
    } else if unique > 15 && variation < 0.5 {
        ChartRecommendation::LineAcrossCategories
    } else if unique > 0 && unique <= 5 {
        ChartRecommendation::Pie
    } else if unique > 5 && unique <= 20 {
        ChartRecommendation::Bar
    } else if unique > 20 && !ys.is_empty() {
        ChartRecommendation::BarOrAggregatedLine
    } else {
        ChartRecommendation::NoRecommendation
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Statistics for one view. `top_category` and `extent` read the full
/// dataset; `narrative` and `recommendation` read the filtered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub top_category: Option<String>,
    pub extent: Option<Extent>,
    pub narrative: String,
    pub recommendation: ChartRecommendation,
}

impl Insights {
    pub fn compute(all: &[Row], filtered: &[Row], axes: &AxisSelection, source_name: &str) -> Self {
        Self {
            top_category: top_category(all, axes),
            extent: value_extent(all, axes),
            narrative: narrative(&NarrativeInput {
                source_name,
                axes,
                filtered,
                dataset_len: all.len(),
            }),
            recommendation: recommend_chart(filtered, axes),
        }
    }

    pub fn top_category_label(&self) -> String {
        self.top_category.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn max_label(&self) -> String {
        self.extent.map_or_else(|| NOT_AVAILABLE.to_string(), |e| grouped(e.max))
    }

    pub fn min_label(&self) -> String {
        self.extent.map_or_else(|| NOT_AVAILABLE.to_string(), |e| grouped(e.min))
    }
}
