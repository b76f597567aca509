use std::path::PathBuf;

use colored::Colorize;

use crate::cli::open_store;
use crate::error::{Result, SheetlensError};
use crate::loader::{list_sheets, load_file};
use crate::models::RecentFileEntry;
use crate::settings::{expand_home, load_settings};
use crate::store::DatasetStore;

pub fn run(file: &str, sheet: Option<&str>, name: Option<&str>) -> Result<()> {
    let path = PathBuf::from(expand_home(file));
    if !path.is_file() {
        return Err(SheetlensError::Other(format!("File not found: {}", path.display())));
    }
    let loaded = load_file(&path, sheet)?;
    let name = match name {
        Some(n) => n.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string()),
    };

    let settings = load_settings();
    let mut store = open_store(&settings)?;
    store.save(&name, &loaded.dataset)?;
    store.record_recent(
        RecentFileEntry {
            name: name.clone(),
            date: chrono::Utc::now().to_rfc3339(),
            size: std::fs::metadata(&path)?.len(),
            is_pinned: false,
        },
        settings.recent_limit,
    )?;

    println!(
        "Loaded {} rows x {} columns from sheet '{}' as {}",
        loaded.dataset.len(),
        loaded.dataset.columns.len(),
        loaded.sheet,
        name.bold()
    );
    if loaded.sheet_names.len() > 1 {
        println!("Other sheets: {}", loaded.sheet_names.join(", ").dimmed());
    }
    if loaded.dataset.is_empty() {
        println!("{}", "The sheet has no data rows.".yellow());
    }
    Ok(())
}

pub fn sheets(file: &str) -> Result<()> {
    let path = PathBuf::from(expand_home(file));
    for (i, name) in list_sheets(&path)?.iter().enumerate() {
        println!("{:>3}  {name}", i + 1);
    }
    Ok(())
}
