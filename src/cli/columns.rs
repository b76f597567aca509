use comfy_table::{Cell, Table};

use crate::cli::{open_store, resolve_dataset};
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(dataset: &str) -> Result<()> {
    let store = open_store(&load_settings())?;
    let (name, dataset) = resolve_dataset(&store, dataset)?;

    let mut table = Table::new();
    table.set_header(vec!["Column", "Kind", "Values", "Empty"]);
    for p in dataset.profile() {
        let kind = p.kind();
        table.add_row(vec![
            Cell::new(p.name),
            Cell::new(kind),
            Cell::new(p.numbers + p.texts),
            Cell::new(p.empties),
        ]);
    }
    println!("{name} ({} rows)\n{table}", dataset.len());
    Ok(())
}
