use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_store;
use crate::error::{Result, SheetlensError};
use crate::fmt::format_bytes;
use crate::settings::load_settings;
use crate::store::DatasetStore;

/// RFC 3339 as local `YYYY-MM-DD HH:MM`; anything else is shown as is.
pub(crate) fn loaded_at(date: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(date)
        .map(|d| d.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| date.to_string())
}

pub fn list(search: Option<&str>) -> Result<()> {
    let store = open_store(&load_settings())?;
    let entries = match search {
        Some(term) => store.search_recent(term)?,
        None => store.recent()?,
    };
    if entries.is_empty() {
        println!("No recent files.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Name", "Loaded", "Size"]);
    for e in entries {
        let pin = if e.is_pinned { "*".yellow().to_string() } else { String::new() };
        table.add_row(vec![
            Cell::new(pin),
            Cell::new(&e.name),
            Cell::new(loaded_at(&e.date)),
            Cell::new(format_bytes(e.size)),
        ]);
    }
    println!("Recent files\n{table}");
    Ok(())
}

pub fn pin(name: &str, pinned: bool) -> Result<()> {
    let mut store = open_store(&load_settings())?;
    if !store.set_pinned(name, pinned)? {
        return Err(SheetlensError::UnknownDataset(name.to_string()));
    }
    let verb = if pinned { "Pinned" } else { "Unpinned" };
    println!("{verb} {name}");
    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let mut store = open_store(&load_settings())?;
    if !store.remove_recent(name)? {
        return Err(SheetlensError::UnknownDataset(name.to_string()));
    }
    println!("Removed {name}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_at_falls_back_to_raw() {
        assert_eq!(loaded_at("yesterday"), "yesterday");
        assert!(loaded_at("2025-01-02T03:04:05+00:00").starts_with("2025-01-0"));
    }
}
