use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::cli::{open_store, ViewArgs};
use crate::error::{Result, SheetlensError};
use crate::export::{default_path, settings_json, write_file};
use crate::models::{ChartType, ViewTemplate};
use crate::settings::{expand_home, load_settings};
use crate::store::DatasetStore;

pub fn save(
    name: &str,
    args: &ViewArgs,
    chart_type: Option<ChartType>,
    title: Option<String>,
) -> Result<()> {
    let mut store = open_store(&load_settings())?;
    let mut settings = args.resolve(&store)?;
    if let Some(t) = chart_type {
        settings.chart_type = t;
    }
    if title.is_some() {
        settings.chart_title = title;
    }
    store.save_template(&ViewTemplate {
        name: name.to_string(),
        settings,
    })?;
    println!("Saved template {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let store = open_store(&load_settings())?;
    let templates = store.templates()?;
    if templates.is_empty() {
        println!("No templates.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Category", "Value", "Chart", "Top N"]);
    for t in &templates {
        let s = &t.settings;
        table.add_row(vec![
            Cell::new(&t.name),
            Cell::new(s.axes.category().unwrap_or("-")),
            Cell::new(s.axes.value().unwrap_or("-")),
            Cell::new(s.chart_type.label()),
            Cell::new(s.top_n.map_or_else(|| "-".to_string(), |n| n.to_string())),
        ]);
    }
    println!("Templates\n{table}");
    Ok(())
}

fn find(store: &dyn DatasetStore, name: &str) -> Result<ViewTemplate> {
    store
        .template(name)?
        .ok_or_else(|| SheetlensError::UnknownTemplate(name.to_string()))
}

pub fn show(name: &str) -> Result<()> {
    let store = open_store(&load_settings())?;
    print!("{}", settings_json(&find(&store, name)?.settings)?);
    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let mut store = open_store(&load_settings())?;
    if !store.remove_template(name)? {
        return Err(SheetlensError::UnknownTemplate(name.to_string()));
    }
    println!("Removed template {name}");
    Ok(())
}

pub fn export(name: &str, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let json = settings_json(&find(&store, name)?.settings)?;
    let path = output
        .map(|o| PathBuf::from(expand_home(&o)))
        .unwrap_or_else(|| default_path(&settings.exports_dir(), name, "json"));
    write_file(json.as_bytes(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
