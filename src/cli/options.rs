use comfy_table::Table;

use crate::cli::load_table;
use crate::error::Result;

pub fn format_options(franchises: &[String], items: &[String]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Franchises", "Items"]);
    let rows = franchises.len().max(items.len());
    for i in 0..rows {
        table.add_row(vec![
            franchises.get(i).map(String::as_str).unwrap_or(""),
            items.get(i).map(String::as_str).unwrap_or(""),
        ]);
    }
    table.to_string()
}

pub fn run(file: &str) -> Result<()> {
    let (table, message) = load_table(file)?;
    println!("{message}");
    println!("{}", format_options(&table.franchises(), &table.items()));
    Ok(())
}
