use std::collections::BTreeSet;

use chrono::NaiveDateTime;

pub const COL_ISSUE_DATE: &str = "Data Emissao";
pub const COL_TOTAL: &str = "R$ Total";
pub const COL_FRANCHISE: &str = "FRANQUIA";
pub const COL_CATEGORY: &str = "Categoria";
pub const COL_ITEM: &str = "Descrição Item";

/// Columns every upload must carry, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_ISSUE_DATE,
    COL_TOTAL,
    COL_FRANCHISE,
    COL_CATEGORY,
    COL_ITEM,
];

/// A decoded spreadsheet cell. Passthrough columns keep whatever type the
/// source file gave them.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// One invoiced item. `cells` holds every column of the row in table order,
/// with the required columns already replaced by their coerced values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub issue_date: NaiveDateTime,
    pub total: f64,
    pub franchise: String,
    pub category: String,
    pub item: String,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Same columns, only the records that satisfy `keep`.
    pub fn retain_copy(&self, mut keep: impl FnMut(&Record) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|&r| keep(r)).cloned().collect(),
        }
    }

    /// Distinct franchises, sorted.
    pub fn franchises(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.franchise.as_str()))
    }

    /// Distinct item descriptions, sorted.
    pub fn items(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.item.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Franchise and item choices. An empty `items` list means "all items".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub franchises: Vec<String>,
    pub items: Vec<String>,
}

impl Selection {
    pub fn new(franchises: Vec<String>, items: Vec<String>) -> Self {
        Self { franchises, items }
    }

    pub fn is_empty(&self) -> bool {
        self.franchises.is_empty()
    }
}
