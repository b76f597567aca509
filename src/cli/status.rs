use crate::cli::open_store;
use crate::error::{Result, SheetlensError};
use crate::export::settings_json;
use crate::fmt::format_bytes;
use crate::settings::{load_settings, save_settings, settings_file_exists, settings_path};
use crate::store::DatasetStore;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    let config = if settings_file_exists() { "" } else { " (defaults)" };
    println!("Settings:   {}{config}", settings_path().display());
    println!("Data dir:   {}", settings.data_path().display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        println!("DB size:    {}", format_bytes(std::fs::metadata(&db_path)?.len()));

        let store = open_store(&settings)?;
        let recent = store.recent()?;
        let pinned = recent.iter().filter(|e| e.is_pinned).count();
        println!();
        println!("Datasets:      {}", store.list()?.len());
        println!("Recent files:  {} ({pinned} pinned)", recent.len());
        println!("Templates:     {}", store.templates()?.len());
        println!("Exports:       {}", store.exports()?.len());
    } else {
        println!();
        println!("Database not found. Run `sheetlens load <file>` to create it.");
    }
    Ok(())
}

pub fn reset() -> Result<()> {
    let mut store = open_store(&load_settings())?;
    store.clear()?;
    println!("Cleared recent files, templates and export history.");
    Ok(())
}

pub fn config(
    data_dir: Option<String>,
    top_n: Option<usize>,
    recent_limit: Option<usize>,
    rows_per_page: Option<usize>,
) -> Result<()> {
    let mut settings = load_settings();
    let changed = data_dir.is_some()
        || top_n.is_some()
        || recent_limit.is_some()
        || rows_per_page.is_some();

    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    if let Some(n) = top_n {
        settings.default_top_n = n;
    }
    if let Some(n) = recent_limit {
        settings.recent_limit = n;
    }
    if let Some(n) = rows_per_page {
        if n == 0 {
            return Err(SheetlensError::Settings(
                "rows-per-page must be at least 1".into(),
            ));
        }
        settings.rows_per_page = n;
    }

    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }
    print!("{}", settings_json(&settings)?);
    Ok(())
}
