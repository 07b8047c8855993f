//! Savings aggregation
//!
//! A resource that matches more than one idle rule (an unattached volume that
//! also shows low I/O) appears once per category, but its cost is counted once
//! in the potential savings total.

use crate::types::{Finding, FindingCategory};
use crate::utils::round_currency;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Count and monthly cost of one finding category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: FindingCategory,
    pub count: usize,
    pub monthly_cost: f64,
}

/// Potential monthly savings over the union of flagged resources.
///
/// Each distinct resource id contributes its cost once. Categories that do
/// not represent savings are ignored.
pub fn total_savings(findings: &[Finding]) -> f64 {
    let mut seen = HashSet::new();
    let total: f64 = findings
        .iter()
        .filter(|f| f.category.counts_toward_savings())
        .filter(|f| seen.insert(f.resource_id()))
        .map(|f| f.estimated_monthly_cost)
        .sum();
    round_currency(total)
}

/// Per-category counts and costs, ordered by category
pub fn category_totals(findings: &[Finding]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<FindingCategory, (usize, f64)> = BTreeMap::new();
    for finding in findings {
        let entry = totals.entry(finding.category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += finding.estimated_monthly_cost;
    }
    totals
        .into_iter()
        .map(|(category, (count, cost))| CategoryTotal {
            category,
            count,
            monthly_cost: round_currency(cost),
        })
        .collect()
}
