use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::load_table;
use crate::error::{DashError, Result};
use crate::filter::FilterEngine;
use crate::fmt::money;
use crate::models::Selection;
use crate::reports::{summarize, RankedItem, Summary, TOP_CATEGORIES};
use crate::session::PROMPT_SELECT;
use crate::settings::load_settings;

const BAR_WIDTH: usize = 30;

/// Horizontal bar scaled against the largest value in the chart.
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(len.min(BAR_WIDTH))
}

fn format_ranking(title: &str, label: &str, items: &[RankedItem]) -> String {
    let max = items.iter().map(|i| i.total).fold(0.0, f64::max);
    let mut table = Table::new();
    table.set_header(vec![label, "R$ Total", ""]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(money(item.total)).set_alignment(CellAlignment::Right),
            Cell::new(bar(item.total, max).green()),
        ]);
    }
    format!("{}\n{table}", title.bold())
}

pub fn format_summary(summary: &Summary) -> String {
    let mut cards = Table::new();
    cards.add_row(vec![
        Cell::new("Revenue total".bold()),
        Cell::new(money(summary.total)),
    ]);
    cards.add_row(vec![
        Cell::new("Franchises analyzed".bold()),
        Cell::new(summary.franchises_analyzed),
    ]);
    cards.add_row(vec![Cell::new("Rows".bold()), Cell::new(summary.row_count)]);

    let franchises = format_ranking("Revenue by franchise", "Franchise", &summary.by_franchise);
    let categories = format_ranking(
        &format!("Top {TOP_CATEGORIES} categories by revenue"),
        "Category",
        &summary.top_categories,
    );
    format!("{cards}\n\n{franchises}\n\n{categories}")
}

pub fn run(file: &str, selection: Selection) -> Result<()> {
    let settings = load_settings();
    let engine = FilterEngine::new(&settings.excluded_categories)?;
    let (table, message) = load_table(file)?;
    println!("{}", message.green());

    match engine.apply(&table, &selection) {
        Ok(filtered) => {
            let summary = summarize(&filtered, selection.franchises.len());
            println!("\n{}", format_summary(&summary));
            Ok(())
        }
        Err(DashError::NoSelection) => {
            println!("{}", PROMPT_SELECT.cyan());
            Ok(())
        }
        Err(DashError::EmptyResult) => {
            println!("{}", DashError::EmptyResult.to_string().yellow());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
