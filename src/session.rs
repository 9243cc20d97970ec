//! One user's interaction state. Each step consumes the current `Session`
//! and hands back the next one together with a message for the user, so no
//! error ever leaves the session boundary.

use crate::error::{DashError, Result};
use crate::exporter;
use crate::filter::FilterEngine;
use crate::importer;
use crate::models::{Selection, Table};
use crate::reports::{summarize, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

pub const PROMPT_SELECT: &str = "Load a file and select one or more franchises.";

#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Empty,
    Loaded {
        table: Table,
    },
    Filtered {
        table: Table,
        selection: Selection,
        filtered: Table,
        summary: Summary,
    },
}

impl Session {
    pub fn table(&self) -> Option<&Table> {
        match self {
            Session::Empty => None,
            Session::Loaded { table } | Session::Filtered { table, .. } => Some(table),
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Session::Filtered { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Replace whatever is loaded with a new upload. A failed upload leaves
    /// the session empty.
    pub fn upload(self, bytes: &[u8], filename: &str) -> (Session, Notice) {
        match importer::parse(bytes, filename) {
            Ok((table, message)) => (
                Session::Loaded { table },
                Notice::new(NoticeLevel::Success, message),
            ),
            Err(e) => {
                tracing::warn!(file = filename, error = %e, "upload rejected");
                (
                    Session::Empty,
                    Notice::new(NoticeLevel::Error, format!("Error: {e}")),
                )
            }
        }
    }

    /// Apply a new selection to the loaded table.
    pub fn select(self, engine: &FilterEngine, selection: Selection) -> (Session, Notice) {
        let table = match self {
            Session::Empty => return (Session::Empty, Notice::new(NoticeLevel::Info, PROMPT_SELECT)),
            Session::Loaded { table } | Session::Filtered { table, .. } => table,
        };
        match engine.apply(&table, &selection) {
            Ok(filtered) => {
                let summary = summarize(&filtered, selection.franchises.len());
                let notice = Notice::new(
                    NoticeLevel::Success,
                    format!("{} rows match the selection.", filtered.len()),
                );
                (
                    Session::Filtered {
                        table,
                        selection,
                        filtered,
                        summary,
                    },
                    notice,
                )
            }
            Err(DashError::NoSelection) => (
                Session::Loaded { table },
                Notice::new(NoticeLevel::Info, PROMPT_SELECT),
            ),
            Err(e) => (
                Session::Loaded { table },
                Notice::new(NoticeLevel::Warning, e.to_string()),
            ),
        }
    }

    /// Report workbook for the current selection.
    pub fn export(&self) -> Result<Vec<u8>> {
        match self {
            Session::Filtered {
                table, filtered, ..
            } => exporter::export(table, filtered),
            _ => Err(DashError::NoSelection),
        }
    }
}
