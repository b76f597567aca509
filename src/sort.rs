use std::cmp::Ordering;

use crate::models::{CellValue, Row, SortDirection, SortState};

pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Case-folded comparison; on a fold tie lowercase sorts first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Two text cells compare as text. Anything else compares numerically when
/// both sides parse, and is a tie otherwise.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    if let (CellValue::Text(x), CellValue::Text(y)) = (a, b) {
        return locale_cmp(x, y);
    }
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

// compare_cells is not transitive across mixed cell types, and slice::sort_by
// may panic on such comparators. Bottom-up merge sort over indices instead.
fn stable_order<F>(len: usize, mut cmp: F) -> Vec<usize>
where
    F: FnMut(usize, usize) -> Ordering,
{
    let mut order: Vec<usize> = (0..len).collect();
    let mut buf = order.clone();
    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j, mut k) = (start, mid, start);
            while i < mid && j < end {
                if cmp(order[j], order[i]) == Ordering::Less {
                    buf[k] = order[j];
                    j += 1;
                } else {
                    buf[k] = order[i];
                    i += 1;
                }
                k += 1;
            }
            buf[k..k + (mid - i)].copy_from_slice(&order[i..mid]);
            k += mid - i;
            buf[k..k + (end - j)].copy_from_slice(&order[j..end]);
            start = end;
        }
        std::mem::swap(&mut order, &mut buf);
        width *= 2;
    }
    order
}

pub fn sort_rows(rows: &[Row], sort: &SortState) -> Vec<Row> {
    let Some(key) = sort.key.as_deref().filter(|k| !k.is_empty()) else {
        return rows.to_vec();
    };
    let order = stable_order(rows.len(), |i, j| {
        let ord = compare_cells(rows[i].get(key), rows[j].get(key));
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    order.into_iter().map(|i| rows[i].clone()).collect()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

pub struct Page<'a> {
    pub rows: &'a [Row],
    /// 1-based, clamped into range.
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub first_index: usize,
}

pub fn paginate(rows: &[Row], page: usize, per_page: usize) -> Page<'_> {
    let per_page = per_page.max(1);
    let total_pages = rows.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let first_index = (page - 1) * per_page;
    let last_index = (first_index + per_page).min(rows.len());
    Page {
        rows: &rows[first_index.min(rows.len())..last_index],
        page,
        total_pages,
        total_rows: rows.len(),
        first_index,
    }
}
