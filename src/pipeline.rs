use tracing::debug;

use crate::aggregate::{aggregate, top_n};
use crate::filter::filter_rows;
use crate::insights::Insights;
use crate::models::{AggregatedSeries, AxisSelection, Dataset, FilterState, Row, SortState, ViewSettings};
use crate::sort::sort_rows;

/// Everything that shapes one analysis of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSpec {
    pub axes: AxisSelection,
    pub filters: FilterState,
    pub sort: SortState,
    /// `None` or `Some(0)` shows every category.
    pub top_n: Option<usize>,
    /// Order the series by value before truncating.
    pub rank: bool,
}

impl From<&ViewSettings> for ViewSpec {
    fn from(s: &ViewSettings) -> Self {
        Self {
            axes: s.axes.clone(),
            filters: s.filters.clone(),
            sort: s.sort.clone(),
            top_n: s.top_n,
            rank: s.rank,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Axes are not both chosen, or the dataset has no rows.
    NotReady,
    /// May be empty when filtering removed every row.
    Ready(AggregatedSeries),
}

impl ChartData {
    pub fn series(&self) -> Option<&AggregatedSeries> {
        match self {
            ChartData::Ready(s) => Some(s),
            ChartData::NotReady => None,
        }
    }
}

pub struct Analysis {
    pub filtered: Vec<Row>,
    pub sorted: Vec<Row>,
    pub chart: ChartData,
    pub top: ChartData,
    pub insights: Insights,
}

pub fn analyze(dataset: &Dataset, view: &ViewSpec, source_name: &str) -> Analysis {
    let filtered = filter_rows(&dataset.rows, &view.filters, &view.axes);
    let sorted = sort_rows(&filtered, &view.sort);

    let chart = if view.axes.is_complete() && !dataset.is_empty() {
        ChartData::Ready(aggregate(&filtered, &view.axes).unwrap_or_default())
    } else {
        ChartData::NotReady
    };
    let top = match &chart {
        ChartData::Ready(series) => {
            let ordered = if view.rank { series.ranked() } else { series.clone() };
            ChartData::Ready(top_n(&ordered, view.top_n.unwrap_or(0)))
        }
        ChartData::NotReady => ChartData::NotReady,
    };
    let insights = Insights::compute(&dataset.rows, &filtered, &view.axes, source_name);

    debug!(
        rows = dataset.len(),
        filtered = filtered.len(),
        categories = chart.series().map_or(0, AggregatedSeries::len),
        "analysis complete"
    );
    Analysis {
        filtered,
        sorted,
        chart,
        top,
        insights,
    }
}
