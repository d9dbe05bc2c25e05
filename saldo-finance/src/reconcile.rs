//! Balance reconciliation: does opening + movements land on the reported
//! closing balance?

use saldo_ingest::StatementDocument;
use saldo_ingest::fields::round_cents;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileStatus {
    #[serde(rename = "consistent")]
    Consistent,
    #[serde(rename = "inconsistent")]
    Inconsistent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// opening + sum of movements, rounded to cents
    pub computed: f64,
    pub reported: f64,
    /// reported - computed
    pub difference: f64,
    pub status: ReconcileStatus,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.status == ReconcileStatus::Consistent
    }
}

/// Compare `opening + Σ amounts` with `closing`.
///
/// Amounts are whole cents, so the comparison is done in cents: the result is
/// consistent when the difference is strictly below `tolerance`.
pub fn reconcile<I>(opening: f64, amounts: I, closing: f64, tolerance: f64) -> Reconciliation
where
    I: IntoIterator<Item = f64>,
{
    let computed = round_cents(opening + amounts.into_iter().sum::<f64>());
    let difference = round_cents(closing - computed);

    let diff_cents = (difference * 100.0).round().abs();
    let tolerance_cents = (tolerance * 100.0).round();
    let status = if diff_cents < tolerance_cents {
        ReconcileStatus::Consistent
    } else {
        ReconcileStatus::Inconsistent
    };

    Reconciliation {
        computed,
        reported: closing,
        difference,
        status,
    }
}

/// Reconcile a parsed statement against its own summary.
///
/// `None` when either balance is missing.
pub fn reconcile_document(doc: &StatementDocument, tolerance: f64) -> Option<Reconciliation> {
    let opening = doc.summary.opening.as_ref()?.amount;
    let closing = doc.summary.closing.as_ref()?.amount;
    Some(reconcile(
        opening,
        doc.transactions.iter().map(|t| t.net),
        closing,
        tolerance,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use saldo_ingest::{BalanceEntry, StatementSummary};

    #[test]
    fn test_consistent_when_sum_matches() {
        let r = reconcile(1000.0, [200.0, 50.0, -15.44], 1234.56, DEFAULT_TOLERANCE);
        assert_eq!(r.computed, 1234.56);
        assert_eq!(r.difference, 0.0);
        assert!(r.is_consistent());
    }

    #[test]
    fn test_four_cents_off_is_inconsistent() {
        let r = reconcile(1000.0, [234.56], 1234.60, DEFAULT_TOLERANCE);
        assert_eq!(r.status, ReconcileStatus::Inconsistent);
        assert_eq!(r.difference, 0.04);
    }

    #[test]
    fn test_one_cent_is_not_below_default_tolerance() {
        let r = reconcile(0.1, [0.2], 0.31, DEFAULT_TOLERANCE);
        assert_eq!(r.computed, 0.3);
        assert!(!r.is_consistent());

        let loose = reconcile(0.1, [0.2], 0.31, 0.05);
        assert!(loose.is_consistent());
    }

    #[test]
    fn test_document_without_balances_is_skipped() {
        let mut doc = StatementDocument::default();
        assert!(reconcile_document(&doc, DEFAULT_TOLERANCE).is_none());

        doc.summary = StatementSummary {
            opening: Some(BalanceEntry { date: None, amount: 10.0 }),
            closing: Some(BalanceEntry { date: None, amount: 10.0 }),
            ..Default::default()
        };
        let r = reconcile_document(&doc, DEFAULT_TOLERANCE).unwrap();
        assert!(r.is_consistent());
    }
}
