use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

use crate::error::{Result, SheetlensError};
use crate::models::Row;

/// Every field quoted, `\n` line endings, header first. Missing cells are
/// written as empty fields.
pub fn write_csv(columns: &[String], rows: &[Row]) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(columns)?;
    for row in rows {
        wtr.write_record(columns.iter().map(|c| row.get(c).display()))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| SheetlensError::Other(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SheetlensError::Other(e.to_string()))
}

/// Pretty JSON with a trailing newline.
pub fn settings_json<T: Serialize>(settings: &T) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(settings)?))
}

/// `<exports>/<stem>-<YYYY-MM-DD>.<ext>`
pub fn default_path(exports_dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    exports_dir.join(format!("{stem}-{date}.{ext}"))
}

/// Write `bytes`, creating parent directories.
pub fn write_file(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AxisSelection, CellValue, ViewSettings};

    fn columns() -> Vec<String> {
        vec!["Region".into(), "Sales".into(), "Note".into()]
    }

    #[test]
    fn test_csv_quotes_everything() {
        let rows = vec![Row::from_pairs([
            ("Region", CellValue::Text("East".into())),
            ("Sales", CellValue::Number(10.0)),
            ("Note", CellValue::Text("say \"hi\", ok".into())),
        ])];
        let out = write_csv(&columns(), &rows).unwrap();
        assert_eq!(
            out,
            "\"Region\",\"Sales\",\"Note\"\n\"East\",\"10\",\"say \"\"hi\"\", ok\"\n"
        );
    }

    #[test]
    fn test_csv_missing_cells_are_empty() {
        let rows = vec![Row::from_pairs([("Sales", CellValue::Number(1.5))])];
        let out = write_csv(&columns(), &rows).unwrap();
        assert_eq!(out.lines().nth(1), Some("\"\",\"1.5\",\"\""));
    }

    #[test]
    fn test_csv_header_only() {
        let out = write_csv(&columns(), &[]).unwrap();
        assert_eq!(out, "\"Region\",\"Sales\",\"Note\"\n");
    }

    #[test]
    fn test_settings_json_is_pretty() {
        let settings = ViewSettings {
            axes: AxisSelection::new("Region", "Sales"),
            ..Default::default()
        };
        let json = settings_json(&settings).unwrap();
        assert!(json.contains("\n  \"axes\""));
        let back: ViewSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_default_path_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_path(&dir.path().join("exports"), "sales", "csv");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sales-") && name.ends_with(".csv"));
        write_file(b"x", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }
}
