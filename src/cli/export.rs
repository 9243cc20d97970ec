use std::path::PathBuf;

use crate::cli::load_table;
use crate::error::Result;
use crate::exporter::{export, write_report};
use crate::filter::FilterEngine;
use crate::models::Selection;
use crate::settings::{load_settings, shellexpand_path};

/// Build the report for `selection` and write it. Returns the written path.
pub fn run(file: &str, selection: Selection, output: Option<String>) -> Result<PathBuf> {
    let settings = load_settings();
    let engine = FilterEngine::new(&settings.excluded_categories)?;
    let (table, message) = load_table(file)?;
    println!("{message}");

    let filtered = engine.apply(&table, &selection)?;
    let bytes = export(&table, &filtered)?;

    let dir = shellexpand_path(output.as_deref().unwrap_or(&settings.export_dir));
    let path = write_report(&dir, &bytes)?;
    println!(
        "Wrote {} ({} of {} rows selected)",
        path.display(),
        filtered.len(),
        table.len()
    );
    Ok(path)
}
