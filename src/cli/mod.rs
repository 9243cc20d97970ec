#[cfg(feature = "dashboard")]
pub mod dashboard;
pub mod export;
pub mod init;
pub mod options;
pub mod summary;

use std::path::Path;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::models::{Selection, Table};

/// Read a spreadsheet from disk and run it through the importer. Returns the
/// table and the load message.
pub(crate) fn load_table(file: &str) -> Result<(Table, String)> {
    let path = Path::new(file);
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    crate::importer::parse(&bytes, &filename)
}

#[derive(Parser)]
#[command(
    name = "franchise-dashboard",
    version,
    about = "Franchise sales dashboard over invoiced-item spreadsheets."
)]
pub struct Cli {
    /// Log at debug level (overrides the configured level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Franchise to include (repeatable)
    #[arg(short = 'f', long = "franchise")]
    pub franchises: Vec<String>,
    /// Restrict to these item descriptions (repeatable)
    #[arg(short = 'i', long = "item")]
    pub items: Vec<String>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Selection::new(args.franchises, args.items)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a settings file with the default values.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// List the franchises and items available in a file.
    Options {
        /// Path to the CSV or XLSX file of invoiced items
        file: String,
    },
    /// Print totals, franchise ranking and top categories for a selection.
    Summary {
        /// Path to the CSV or XLSX file of invoiced items
        file: String,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Write the Excel report (full base + filtered rows).
    Export {
        /// Path to the CSV or XLSX file of invoiced items
        file: String,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output directory (default: export_dir from settings)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Interactive dashboard with filters and charts.
    #[cfg(feature = "dashboard")]
    Dashboard {
        /// Path to the CSV or XLSX file of invoiced items
        file: String,
    },
}
