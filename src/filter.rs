use chrono::NaiveDate;

use crate::models::{AxisSelection, FilterState, Row, DATE_COLUMN};

/// Outcome of one filter condition on one row.
///
/// `NotApplicable` covers both an inactive filter and a cell the filter
/// cannot evaluate (unparseable number or date, missing column). Rows are
/// only dropped on `Excluded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Passed,
    Excluded,
    NotApplicable,
}

impl Predicate {
    pub fn keeps(self) -> bool {
        self != Predicate::Excluded
    }

    fn from_bool(pass: bool) -> Self {
        if pass {
            Predicate::Passed
        } else {
            Predicate::Excluded
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowVerdict {
    pub search: Predicate,
    pub range: Predicate,
    pub date: Predicate,
}

impl RowVerdict {
    pub fn keeps(&self) -> bool {
        self.search.keeps() && self.range.keeps() && self.date.keeps()
    }
}

pub fn search_predicate(row: &Row, term: &str) -> Predicate {
    if term.is_empty() {
        return Predicate::NotApplicable;
    }
    let needle = term.to_lowercase();
    let hit = row
        .values()
        .filter(|v| !v.is_empty())
        .any(|v| v.display().to_lowercase().contains(&needle));
    Predicate::from_bool(hit)
}

pub fn range_predicate(row: &Row, filters: &FilterState, axes: &AxisSelection) -> Predicate {
    let Some(column) = axes.value() else {
        return Predicate::NotApplicable;
    };
    if filters.min_value.is_none() && filters.max_value.is_none() {
        return Predicate::NotApplicable;
    }
    let Some(value) = row.get(column).as_number() else {
        return Predicate::NotApplicable;
    };
    let below = filters.min_value.is_some_and(|min| value < min);
    let above = filters.max_value.is_some_and(|max| value > max);
    Predicate::from_bool(!below && !above)
}

pub fn date_predicate(row: &Row, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Predicate {
    let (Some(start), Some(end)) = (start, end) else {
        return Predicate::NotApplicable;
    };
    match row.get(DATE_COLUMN).as_date() {
        Some(date) => Predicate::from_bool(start <= date && date <= end),
        None => Predicate::NotApplicable,
    }
}

pub fn explain_row(row: &Row, filters: &FilterState, axes: &AxisSelection) -> RowVerdict {
    RowVerdict {
        search: search_predicate(row, &filters.search),
        range: range_predicate(row, filters, axes),
        date: date_predicate(row, filters.date_start, filters.date_end),
    }
}

pub fn row_matches(row: &Row, filters: &FilterState, axes: &AxisSelection) -> bool {
    explain_row(row, filters, axes).keeps()
}

pub fn filter_rows(rows: &[Row], filters: &FilterState, axes: &AxisSelection) -> Vec<Row> {
    rows.iter()
        .filter(|row| row_matches(row, filters, axes))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn sales_rows() -> Vec<Row> {
        let row = |region: &str, sales: f64| {
            Row::from_pairs([
                ("Region", CellValue::Text(region.into())),
                ("Sales", CellValue::Number(sales)),
            ])
        };
        vec![row("East", 10.0), row("East", 5.0), row("West", 7.0)]
    }

    fn axes() -> AxisSelection {
        AxisSelection::new("Region", "Sales")
    }

    fn dated(date: CellValue) -> Row {
        Row::from_pairs([("Date", date), ("Sales", CellValue::Number(1.0))])
    }

    fn jan() -> (Option<NaiveDate>, Option<NaiveDate>) {
        (NaiveDate::from_ymd_opt(2025, 1, 1), NaiveDate::from_ymd_opt(2025, 1, 31))
    }

    #[test]
    fn test_search_is_case_insensitive_on_any_cell() {
        let filters = FilterState {
            search: "west".into(),
            ..Default::default()
        };
        let out = filter_rows(&sales_rows(), &filters, &axes());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("Region"), &CellValue::Text("West".into()));
    }

    #[test]
    fn test_search_matches_number_display() {
        let filters = FilterState {
            search: "10".into(),
            ..Default::default()
        };
        let out = filter_rows(&sales_rows(), &filters, &axes());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_search_passes_everything() {
        let out = filter_rows(&sales_rows(), &FilterState::default(), &axes());
        assert_eq!(out, sales_rows());
        assert_eq!(
            search_predicate(&Row::new(), ""),
            Predicate::NotApplicable
        );
    }

    #[test]
    fn test_min_value_excludes_smaller() {
        let filters = FilterState {
            min_value: Some(6.0),
            ..Default::default()
        };
        let out = filter_rows(&sales_rows(), &filters, &axes());
        let sales: Vec<f64> = out.iter().filter_map(|r| r.get("Sales").as_number()).collect();
        assert_eq!(sales, vec![10.0, 7.0]);
    }

    #[test]
    fn test_max_value_excludes_larger() {
        let filters = FilterState {
            max_value: Some(7.0),
            ..Default::default()
        };
        let out = filter_rows(&sales_rows(), &filters, &axes());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_range_needs_value_axis() {
        let filters = FilterState {
            min_value: Some(100.0),
            ..Default::default()
        };
        let no_value = AxisSelection {
            category: Some("Region".into()),
            value: None,
        };
        assert_eq!(filter_rows(&sales_rows(), &filters, &no_value).len(), 3);
    }

    #[test]
    fn test_range_fails_open_on_unparseable() {
        let row = Row::from_pairs([("Sales", CellValue::Text("n/a".into()))]);
        let filters = FilterState {
            min_value: Some(1.0),
            ..Default::default()
        };
        assert_eq!(range_predicate(&row, &filters, &axes()), Predicate::NotApplicable);
        assert!(row_matches(&row, &filters, &axes()));
    }

    #[test]
    fn test_date_range_inclusive() {
        let (start, end) = jan();
        let inside = dated(CellValue::Text("2025-01-31".into()));
        let before = dated(CellValue::Text("2024-12-31".into()));
        assert_eq!(date_predicate(&inside, start, end), Predicate::Passed);
        assert_eq!(date_predicate(&before, start, end), Predicate::Excluded);
    }

    #[test]
    fn test_date_range_fails_open() {
        let (start, end) = jan();
        let garbage = dated(CellValue::Text("sometime".into()));
        let missing = Row::from_pairs([("Sales", CellValue::Number(1.0))]);
        assert_eq!(date_predicate(&garbage, start, end), Predicate::NotApplicable);
        assert_eq!(date_predicate(&missing, start, end), Predicate::NotApplicable);
    }

    #[test]
    fn test_date_range_needs_both_bounds() {
        let (start, _) = jan();
        let row = dated(CellValue::Text("2030-01-01".into()));
        assert_eq!(date_predicate(&row, start, None), Predicate::NotApplicable);
    }

    #[test]
    fn test_date_range_reads_excel_serials() {
        let (start, end) = jan();
        // 45667 = 2025-01-10
        let row = dated(CellValue::Number(45667.0));
        assert_eq!(date_predicate(&row, start, end), Predicate::Passed);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let (date_start, date_end) = jan();
        let filters = FilterState {
            search: "east".into(),
            min_value: Some(6.0),
            date_start,
            date_end,
            ..Default::default()
        };
        let verdict = explain_row(&sales_rows()[1], &filters, &axes());
        assert_eq!(verdict.search, Predicate::Passed);
        assert_eq!(verdict.range, Predicate::Excluded);
        assert_eq!(verdict.date, Predicate::NotApplicable);
        assert!(!verdict.keeps());
        assert_eq!(filter_rows(&sales_rows(), &filters, &axes()).len(), 1);
    }
}
