use std::collections::BTreeMap;

use crate::models::{Record, Table};

pub const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: f64,
    pub row_count: usize,
    pub franchises_analyzed: usize,
    pub by_franchise: Vec<RankedItem>,
    pub top_categories: Vec<RankedItem>,
}

/// Sum `total` per key, largest first. Groups are built in ascending key
/// order and the sort is stable, so equal sums stay in name order.
fn ranked_totals<'a>(records: &'a [Record], key: impl Fn(&'a Record) -> &'a str) -> Vec<RankedItem> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *groups.entry(key(r)).or_default() += r.total;
    }
    let mut ranked: Vec<RankedItem> = groups
        .into_iter()
        .map(|(name, total)| RankedItem {
            name: name.to_string(),
            total,
        })
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked
}

/// Aggregate a filtered table. `franchises_analyzed` is the size of the
/// franchise selection that produced it.
pub fn summarize(filtered: &Table, franchises_analyzed: usize) -> Summary {
    let total: f64 = filtered.records.iter().map(|r| r.total).sum();
    let by_franchise = ranked_totals(&filtered.records, |r| r.franchise.as_str());
    let mut top_categories = ranked_totals(&filtered.records, |r| r.category.as_str());
    top_categories.truncate(TOP_CATEGORIES);

    Summary {
        total,
        row_count: filtered.len(),
        franchises_analyzed,
        by_franchise,
        top_categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{record, table};

    #[test]
    fn test_total_and_franchise_ranking() {
        let t = table(vec![
            record("A", "X", "Copo", 100.0),
            record("B", "X", "Copo", 250.0),
            record("A", "Y", "Tampa", 50.5),
        ]);
        let s = summarize(&t, 2);
        assert_eq!(s.total, 400.5);
        assert_eq!(s.row_count, 3);
        assert_eq!(s.franchises_analyzed, 2);
        assert_eq!(s.by_franchise[0], RankedItem { name: "B".into(), total: 250.0 });
        assert_eq!(s.by_franchise[1], RankedItem { name: "A".into(), total: 150.5 });
    }

    #[test]
    fn test_franchise_sums_add_up_to_total() {
        let rows = (0..40)
            .map(|i| {
                let franchise = format!("F{}", i % 7);
                let category = format!("C{}", i % 13);
                record(&franchise, &category, "Copo", 0.1 * i as f64 + 3.0)
            })
            .collect();
        let s = summarize(&table(rows), 7);
        let sum: f64 = s.by_franchise.iter().map(|f| f.total).sum();
        assert!((sum - s.total).abs() < 1e-9);
    }

    #[test]
    fn test_top_categories_limited_and_descending() {
        let rows = (0..15)
            .map(|i| record("A", &format!("Cat {i:02}"), "Copo", (i + 1) as f64))
            .collect();
        let s = summarize(&table(rows), 1);
        assert_eq!(s.top_categories.len(), TOP_CATEGORIES);
        assert_eq!(s.top_categories[0].name, "Cat 14");
        assert!(s
            .top_categories
            .windows(2)
            .all(|w| w[0].total >= w[1].total));
        assert_eq!(s.top_categories[9].name, "Cat 05");
    }

    #[test]
    fn test_ties_keep_name_order() {
        let t = table(vec![
            record("A", "Zeta", "Copo", 10.0),
            record("A", "Alpha", "Copo", 10.0),
            record("A", "Mid", "Copo", 30.0),
        ]);
        let s = summarize(&t, 1);
        let names: Vec<&str> = s.top_categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_grouping_merges_same_category() {
        let t = table(vec![
            record("A", "Copos", "Copo", 10.0),
            record("B", "Copos", "Copo", 15.0),
        ]);
        let s = summarize(&t, 2);
        assert_eq!(s.top_categories.len(), 1);
        assert_eq!(s.top_categories[0].total, 25.0);
    }
}
