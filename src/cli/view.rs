use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_store, prepare, render_emphasis, ViewArgs};
use crate::error::Result;
use crate::fmt::grouped;
use crate::pipeline::{analyze, ChartData};
use crate::settings::load_settings;
use crate::sort::paginate;

pub fn records(dataset: &str, args: &ViewArgs, page: usize, per_page: Option<usize>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let (name, dataset, _, spec) = prepare(&store, dataset, args)?;
    let analysis = analyze(&dataset, &spec, &name);

    if analysis.sorted.is_empty() {
        println!("{}", "No records match the current filters.".yellow());
        return Ok(());
    }

    let per_page = per_page.unwrap_or(settings.rows_per_page);
    let page = paginate(&analysis.sorted, page, per_page);
    let mut table = Table::new();
    table.set_header(&dataset.columns);
    for row in page.rows {
        table.add_row(dataset.columns.iter().map(|c| Cell::new(row.get(c))));
    }
    println!("{table}");
    println!(
        "Page {} of {}  (records {}-{} of {}, {} total)",
        page.page,
        page.total_pages,
        page.first_index + 1,
        page.first_index + page.rows.len(),
        page.total_rows,
        dataset.len()
    );
    Ok(())
}

pub fn chart(dataset: &str, args: &ViewArgs) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let (name, dataset, view, mut spec) = prepare(&store, dataset, args)?;
    if spec.top_n.is_none() {
        spec.top_n = Some(settings.default_top_n);
    }
    let analysis = analyze(&dataset, &spec, &name);

    let (ChartData::Ready(all), ChartData::Ready(shown)) = (&analysis.chart, &analysis.top) else {
        println!("Select both --category and --value to build a chart.");
        return Ok(());
    };
    if shown.is_empty() {
        println!("{}", "No data to chart after filtering.".yellow());
        return Ok(());
    }

    let (x, y) = view.axes.complete().unwrap_or_default();
    let mut table = Table::new();
    table.set_header(vec![x, y]);
    for (label, value) in shown.iter() {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(grouped(value)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(grouped(shown.total()).bold()).set_alignment(CellAlignment::Right),
    ]);

    let title = view.chart_title.clone().unwrap_or_else(|| format!("{y} by {x}"));
    println!("{} ({})\n{table}", title.bold(), view.chart_type.label());
    if shown.len() < all.len() {
        let order = if spec.rank { "largest" } else { "first" };
        println!("Showing the {order} {} of {} categories.", shown.len(), all.len());
    }
    if let Some(suggested) = analysis.insights.recommendation.chart_type() {
        if suggested != view.chart_type {
            println!("Suggested: {}", suggested.label());
        }
    }
    Ok(())
}

pub fn insights(dataset: &str, args: &ViewArgs) -> Result<()> {
    let store = open_store(&load_settings())?;
    let (name, dataset, _, spec) = prepare(&store, dataset, args)?;
    let insights = analyze(&dataset, &spec, &name).insights;

    println!("{}  {}", "Top category:".bold(), insights.top_category_label());
    println!("{}     {}", "Max value:".bold(), insights.max_label());
    println!("{}     {}", "Min value:".bold(), insights.min_label());
    println!("{}   {}", "Recommended:".bold(), insights.recommendation.text().cyan());
    println!();
    println!("{}", render_emphasis(&textwrap::fill(&insights.narrative, 80)));
    Ok(())
}
