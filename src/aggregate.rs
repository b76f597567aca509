use std::collections::HashMap;

use crate::models::{AggregatedSeries, AxisSelection, CellValue, Row};

/// Group `rows` by the category column and sum the value column.
///
/// Returns `None` when either axis is unset or there are no rows. Rows with
/// an empty category cell or an unparseable value are skipped; groups keep
/// first-seen order.
pub fn aggregate(rows: &[Row], axes: &AxisSelection) -> Option<AggregatedSeries> {
    let (category, value) = axes.complete()?;
    if rows.is_empty() {
        return None;
    }

    let mut series = AggregatedSeries::default();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let key = match row.get(category) {
            CellValue::Empty => continue,
            cell => cell.display(),
        };
        let Some(amount) = row.get(value).as_number() else {
            continue;
        };
        match slots.get(&key) {
            Some(&i) => series.values[i] += amount,
            None => {
                slots.insert(key.clone(), series.labels.len());
                series.labels.push(key);
                series.values.push(amount);
            }
        }
    }
    Some(series)
}

/// First `n` label/value pairs, by position. `n == 0` or `n >= len` leaves
/// the series unchanged.
pub fn top_n(series: &AggregatedSeries, n: usize) -> AggregatedSeries {
    if n == 0 || n >= series.len() {
        return series.clone();
    }
    AggregatedSeries {
        labels: series.labels[..n].to_vec(),
        values: series.values[..n].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_groups_and_sums_in_first_seen_order() {
        let series = aggregate(&sales_rows(), &axes()).unwrap();
        assert_eq!(series.labels, vec!["East", "West"]);
        assert_eq!(series.values, vec![15.0, 7.0]);
    }

    #[test]
    fn test_order_is_not_alphabetical() {
        let mut rows = sales_rows();
        rows.reverse();
        let series = aggregate(&rows, &axes()).unwrap();
        assert_eq!(series.labels, vec!["West", "East"]);
    }

    #[test]
    fn test_none_without_axes_or_rows() {
        let partial = AxisSelection {
            category: Some("Region".into()),
            value: None,
        };
        assert!(aggregate(&sales_rows(), &partial).is_none());
        assert!(aggregate(&[], &axes()).is_none());
    }

    #[test]
    fn test_skips_missing_category_and_bad_values() {
        let rows = vec![
            Row::from_pairs([("Sales", CellValue::Number(4.0))]),
            Row::from_pairs([
                ("Region", CellValue::Text("North".into())),
                ("Sales", CellValue::Text("n/a".into())),
            ]),
            Row::from_pairs([
                ("Region", CellValue::Text("North".into())),
                ("Sales", CellValue::Text("2.5".into())),
            ]),
        ];
        let series = aggregate(&rows, &axes()).unwrap();
        assert_eq!(series.labels, vec!["North"]);
        assert_eq!(series.values, vec![2.5]);
    }

    #[test]
    fn test_empty_string_is_a_valid_group() {
        let rows = vec![Row::from_pairs([
            ("Region", CellValue::Text(String::new())),
            ("Sales", CellValue::Number(3.0)),
        ])];
        let series = aggregate(&rows, &axes()).unwrap();
        assert_eq!(series.labels, vec![""]);
    }

    #[test]
    fn test_numeric_categories_use_display_form() {
        let rows = vec![
            Row::from_pairs([("Region", CellValue::Number(2024.0)), ("Sales", CellValue::Number(1.0))]),
            Row::from_pairs([("Region", CellValue::Text("2024".into())), ("Sales", CellValue::Number(2.0))]),
        ];
        let series = aggregate(&rows, &axes()).unwrap();
        assert_eq!(series.labels, vec!["2024"]);
        assert_eq!(series.values, vec![3.0]);
    }

    #[test]
    fn test_all_rows_skipped_gives_empty_series() {
        let rows = vec![Row::from_pairs([("Region", CellValue::Text("East".into()))])];
        let series = aggregate(&rows, &axes()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_top_n_is_positional() {
        let series = aggregate(&sales_rows(), &axes()).unwrap();
        let top = top_n(&series, 1);
        assert_eq!(top.labels, vec!["East"]);
        assert_eq!(top.values, vec![15.0]);

        let rows = vec![
            Row::from_pairs([("Region", CellValue::Text("Small".into())), ("Sales", CellValue::Number(1.0))]),
            Row::from_pairs([("Region", CellValue::Text("Big".into())), ("Sales", CellValue::Number(100.0))]),
        ];
        let series = aggregate(&rows, &axes()).unwrap();
        assert_eq!(top_n(&series, 1).labels, vec!["Small"]);
        assert_eq!(top_n(&series.ranked(), 1).labels, vec!["Big"]);
    }

    #[test]
    fn test_top_n_noop_cases() {
        let series = aggregate(&sales_rows(), &axes()).unwrap();
        assert_eq!(top_n(&series, 0), series);
        assert_eq!(top_n(&series, 2), series);
        assert_eq!(top_n(&series, 50), series);
    }
}
