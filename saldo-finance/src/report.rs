//! Cash-flow totals over a date window.

use chrono::NaiveDate;
use saldo_core::{FlowKind, LedgerEntry};
use saldo_ingest::fields::round_cents;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlow {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// `None` covers every flow kind
    pub flow: Option<FlowKind>,
    pub total_inflow: f64,
    /// Absolute value of outflows
    pub total_outflow: f64,
    pub savings: f64,
    pub entry_count: usize,
}

/// Totals for entries dated `from..=to`, optionally restricted to one flow kind.
pub fn cash_flow(
    entries: &[LedgerEntry],
    from: NaiveDate,
    to: NaiveDate,
    flow: Option<FlowKind>,
) -> CashFlow {
    let selected: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| e.date >= from && e.date <= to)
        .filter(|e| flow.is_none_or(|f| e.flow == f))
        .collect();

    let inflow: f64 = selected.iter().filter(|e| e.is_inflow()).map(|e| e.amount).sum();
    let outflow: f64 = selected.iter().filter(|e| e.is_outflow()).map(|e| e.abs_amount()).sum();

    CashFlow {
        from,
        to,
        flow,
        total_inflow: round_cents(inflow),
        total_outflow: round_cents(outflow),
        savings: round_cents(inflow - outflow),
        entry_count: selected.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn entries() -> Vec<LedgerEntry> {
        vec![
            LedgerEntry::new("1", "BPER", d(1, 5), 1200.0, "STIPENDIO", 1),
            LedgerEntry::new("2", "BPER", d(1, 10), -450.25, "CANONE LOCAZIONE", 2)
                .with_flow(FlowKind::Property),
            LedgerEntry::new("3", "BPER", d(1, 20), -80.5, "CONAD", 3),
            LedgerEntry::new("4", "BPER", d(2, 1), -99.0, "FUORI PERIODO", 3),
        ]
    }

    #[test]
    fn test_cash_flow_all_kinds() {
        let cf = cash_flow(&entries(), d(1, 1), d(1, 31), None);
        assert_eq!(cf.entry_count, 3);
        assert_eq!(cf.total_inflow, 1200.0);
        assert_eq!(cf.total_outflow, 530.75);
        assert_eq!(cf.savings, 669.25);
    }

    #[test]
    fn test_cash_flow_single_kind() {
        let cf = cash_flow(&entries(), d(1, 1), d(1, 31), Some(FlowKind::Property));
        assert_eq!(cf.entry_count, 1);
        assert_eq!(cf.total_inflow, 0.0);
        assert_eq!(cf.savings, -450.25);
    }
}
