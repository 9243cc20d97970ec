use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::error::{DashError, Result};
use crate::models::{Selection, Table};

/// Applies a franchise/item selection plus the configured category exclusions.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    excluded: Option<Regex>,
}

impl FilterEngine {
    /// Build the engine from the excluded category labels. Labels match as
    /// case-insensitive substrings; an empty list excludes nothing.
    pub fn new<S: AsRef<str>>(excluded_categories: &[S]) -> Result<Self> {
        let labels: Vec<String> = excluded_categories
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .map(regex::escape)
            .collect();
        if labels.is_empty() {
            return Ok(Self { excluded: None });
        }
        let excluded = RegexBuilder::new(&labels.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| DashError::Settings(format!("invalid category exclusion: {e}")))?;
        Ok(Self {
            excluded: Some(excluded),
        })
    }

    pub fn is_excluded(&self, category: &str) -> bool {
        self.excluded
            .as_ref()
            .map_or(false, |re| re.is_match(category))
    }

    /// Rows of `table` that belong to the selection. Fails with `NoSelection`
    /// when no franchise is chosen and `EmptyResult` when nothing survives.
    pub fn apply(&self, table: &Table, selection: &Selection) -> Result<Table> {
        if selection.is_empty() {
            return Err(DashError::NoSelection);
        }
        let franchises: HashSet<&str> = selection.franchises.iter().map(String::as_str).collect();
        let items: HashSet<&str> = selection.items.iter().map(String::as_str).collect();

        let filtered = table.retain_copy(|r| {
            franchises.contains(r.franchise.as_str())
                && (items.is_empty() || items.contains(r.item.as_str()))
                && !self.is_excluded(&r.category)
        });
        tracing::debug!(
            franchises = franchises.len(),
            items = items.len(),
            kept = filtered.len(),
            of = table.len(),
            "selection applied"
        );

        if filtered.is_empty() {
            return Err(DashError::EmptyResult);
        }
        Ok(filtered)
    }
}
