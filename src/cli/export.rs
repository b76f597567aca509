use std::path::{Path, PathBuf};

use comfy_table::{Cell, Table};

use crate::cli::{open_store, prepare, ExportFormat, ViewArgs};
use crate::error::Result;
use crate::export::{default_path, write_csv, write_file};
use crate::models::ExportRecord;
use crate::pipeline::analyze;
use crate::settings::{expand_home, load_settings};
use crate::store::DatasetStore;

fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

pub fn run(dataset: &str, args: &ViewArgs, format: ExportFormat, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let mut store = open_store(&settings)?;
    let (name, dataset, view, mut spec) = prepare(&store, dataset, args)?;
    if spec.top_n.is_none() {
        spec.top_n = Some(settings.default_top_n);
    }
    let analysis = analyze(&dataset, &spec, &name);

    let (bytes, ext, suffix) = match format {
        ExportFormat::Csv => (
            write_csv(&dataset.columns, &analysis.sorted)?.into_bytes(),
            "csv",
            "",
        ),
        ExportFormat::Pdf => (render_table(&name, &dataset.columns, &analysis)?, "pdf", ""),
        ExportFormat::SummaryPdf => (
            render_summary(&name, &view, &analysis)?,
            "pdf",
            "-summary",
        ),
    };

    let path = output
        .map(|o| PathBuf::from(expand_home(&o)))
        .unwrap_or_else(|| {
            default_path(&settings.exports_dir(), &format!("{}{suffix}", stem(&name)), ext)
        });
    write_file(&bytes, &path)?;
    store.record_export(&ExportRecord {
        kind: format.label().to_string(),
        time: chrono::Local::now().to_rfc3339(),
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string()),
    })?;
    println!("Wrote {} ({} records)", path.display(), analysis.sorted.len());
    Ok(())
}

pub fn history() -> Result<()> {
    let store = open_store(&load_settings())?;
    let records = store.exports()?;
    if records.is_empty() {
        println!("No exports yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Type", "File", "Written"]);
    for r in &records {
        table.add_row(vec![
            Cell::new(&r.kind),
            Cell::new(&r.filename),
            Cell::new(crate::cli::recent::loaded_at(&r.time)),
        ]);
    }
    println!("Export history\n{table}");
    Ok(())
}

#[cfg(feature = "pdf")]
fn render_table(
    name: &str,
    columns: &[String],
    analysis: &crate::pipeline::Analysis,
) -> Result<Vec<u8>> {
    crate::pdf::render_table(name, columns, &analysis.sorted)
}

#[cfg(feature = "pdf")]
fn render_summary(
    name: &str,
    view: &crate::models::ViewSettings,
    analysis: &crate::pipeline::Analysis,
) -> Result<Vec<u8>> {
    let title = view
        .chart_title
        .clone()
        .unwrap_or_else(|| "Data summary".to_string());
    crate::pdf::render_summary(&title, name, analysis, &view.axes)
}

#[cfg(not(feature = "pdf"))]
fn render_table(
    _name: &str,
    _columns: &[String],
    _analysis: &crate::pipeline::Analysis,
) -> Result<Vec<u8>> {
    Err(pdf_disabled())
}

#[cfg(not(feature = "pdf"))]
fn render_summary(
    _name: &str,
    _view: &crate::models::ViewSettings,
    _analysis: &crate::pipeline::Analysis,
) -> Result<Vec<u8>> {
    Err(pdf_disabled())
}

#[cfg(not(feature = "pdf"))]
fn pdf_disabled() -> crate::error::SheetlensError {
    crate::error::SheetlensError::UnsupportedFormat("pdf (built without the `pdf` feature)".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_drops_extension() {
        assert_eq!(stem("sales.xlsx"), "sales");
        assert_eq!(stem("plain"), "plain");
    }
}
