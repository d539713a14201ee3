//! Plain-text summary of a loaded tracker state.
//!
//! # Invariants
//! - Years are listed newest-stored first (reverse of stored order).
//! - Months are listed in calendar order; unknown month keys come last.
//! - Days are listed numerically where they parse as numbers.

use crate::aggregate::TagCounts;
use crate::model::record::{month_rank, LeafTag};
use crate::model::tree::DayEntries;
use crate::service::record_service::TrackerState;
use std::cmp::Ordering;
use std::fmt::Write;

/// Renders totals, then each year, month and day.
pub fn render_summary(state: &TrackerState) -> String {
    let mut out = String::new();
    let totals = state.aggregates.totals;

    let _ = writeln!(out, "Summary");
    let _ = writeln!(
        out,
        "Total Self F: {} | Total Natural N: {} | Overall Total: {}",
        totals.self_marked,
        totals.natural,
        totals.total()
    );
    if totals.unrecognized > 0 {
        let _ = writeln!(
            out,
            "Warning: {} unrecognized value(s) not counted",
            totals.unrecognized
        );
    }

    for (year, months) in state.tree.years().rev() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{year} {}",
            counts_line(state.aggregates.year(year))
        );

        let mut ordered = months.iter().collect::<Vec<_>>();
        ordered.sort_by(|(left, _), (right, _)| {
            month_rank(left)
                .cmp(&month_rank(right))
                .then_with(|| left.cmp(right))
        });

        for (month, days) in ordered {
            let _ = writeln!(
                out,
                "  {month} {}",
                counts_line(state.aggregates.month(year, month))
            );
            for (day, tag) in sorted_days(days) {
                let _ = writeln!(out, "    Date: {day} - {}", tag.label());
            }
        }
    }

    out
}

fn counts_line(counts: TagCounts) -> String {
    format!(
        "[Self F: {}] | [Natural N: {}] | Total: {}",
        counts.self_marked,
        counts.natural,
        counts.total()
    )
}

fn sorted_days(days: &DayEntries) -> Vec<(&str, LeafTag)> {
    let mut listed = days
        .iter()
        .map(|(day, value)| (day.as_str(), LeafTag::from_value(value)))
        .collect::<Vec<_>>();
    listed.sort_by(|(left, _), (right, _)| compare_day_keys(left, right));
    listed
}

/// Numeric keys first in numeric order, then other keys lexically.
fn compare_day_keys(left: &str, right: &str) -> Ordering {
    match (left.parse::<u32>(), right.parse::<u32>()) {
        (Ok(l), Ok(r)) => l.cmp(&r).then_with(|| left.cmp(right)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left.cmp(right),
    }
}
