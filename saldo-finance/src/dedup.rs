//! Duplicate detection against entries already in the ledger.

use saldo_core::LedgerEntry;

/// Leading description characters compared when looking for duplicates
pub const DESCRIPTION_PREFIX_CHARS: usize = 30;

/// Amounts closer than this are treated as equal
pub const AMOUNT_EPSILON: f64 = 0.01;

pub fn description_prefix(description: &str) -> String {
    description.chars().take(DESCRIPTION_PREFIX_CHARS).collect()
}

/// A candidate duplicates an existing entry booked on the same account and
/// date, with an amount within a cent, whose description contains the
/// candidate's leading characters.
pub fn is_duplicate(candidate: &LedgerEntry, existing: &[LedgerEntry]) -> bool {
    let prefix = description_prefix(&candidate.description);
    existing.iter().any(|e| {
        e.account == candidate.account
            && e.date == candidate.date
            && (e.amount - candidate.amount).abs() < AMOUNT_EPSILON
            && e.description.contains(&prefix)
    })
}
