//! Hierarchical Self/Natural aggregation.
//!
//! # Responsibility
//! - Walk the whole record tree and count tags globally, per year and per
//!   `"Year-Month"`.
//!
//! # Invariants
//! - Pure and deterministic; recomputed from scratch after every mutation.
//! - Every traversed Year and Month gets an entry, even with zero counts.
//! - Unrecognized leaves never count as Self or Natural.

use crate::model::record::LeafTag;
use crate::model::tree::RecordTree;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tag counts for one aggregation scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagCounts {
    pub self_marked: u64,
    pub natural: u64,
    pub unrecognized: u64,
}

impl TagCounts {
    /// Self + Natural. Unrecognized leaves are excluded.
    pub fn total(&self) -> u64 {
        self.self_marked + self.natural
    }

    fn record(&mut self, tag: LeafTag) {
        match tag {
            LeafTag::Natural => self.natural += 1,
            LeafTag::SelfMarked => self.self_marked += 1,
            LeafTag::Unrecognized => self.unrecognized += 1,
        }
    }
}

/// Aggregator output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregates {
    pub totals: TagCounts,
    pub per_year: BTreeMap<String, TagCounts>,
    /// Keyed by `month_key(year, month)`.
    pub per_month: BTreeMap<String, TagCounts>,
}

impl Aggregates {
    /// Counts for one year, zero when the year is absent.
    pub fn year(&self, year: &str) -> TagCounts {
        self.per_year.get(year).copied().unwrap_or_default()
    }

    /// Counts for one month, zero when the month is absent.
    pub fn month(&self, year: &str, month: &str) -> TagCounts {
        self.per_month
            .get(&month_key(year, month))
            .copied()
            .unwrap_or_default()
    }
}

/// Composite per-month key, e.g. `2024-Jan`.
pub fn month_key(year: &str, month: &str) -> String {
    format!("{year}-{month}")
}

/// Computes global, yearly and monthly counts. `None` aggregates as empty.
pub fn compute(tree: Option<&RecordTree>) -> Aggregates {
    let mut aggregates = Aggregates::default();
    let Some(tree) = tree else {
        return aggregates;
    };

    for (year, months) in tree.years() {
        let mut year_counts = TagCounts::default();
        for (month, days) in months {
            let mut month_counts = TagCounts::default();
            for value in days.values() {
                let tag = LeafTag::from_value(value);
                aggregates.totals.record(tag);
                year_counts.record(tag);
                month_counts.record(tag);
            }
            aggregates
                .per_month
                .insert(month_key(year, month), month_counts);
        }
        aggregates.per_year.insert(year.clone(), year_counts);
    }

    aggregates
}
