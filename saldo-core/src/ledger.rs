//! Ledger-side record types: what a persisted transaction looks like

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier handed out by a ledger store
pub type CategoryId = u32;

/// A category as stored in the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerCategory {
    pub id: CategoryId,
    pub name: String,
}

/// Which cash-flow report a transaction belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum FlowKind {
    #[serde(rename = "personal")]
    #[default]
    Personal,
    #[serde(rename = "property")]
    Property,
    #[serde(rename = "tax")]
    Tax,
}

impl FlowKind {
    pub fn label(&self) -> &'static str {
        match self {
            FlowKind::Personal => "personal",
            FlowKind::Property => "property",
            FlowKind::Tax => "tax",
        }
    }
}

/// A persisted transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    /// Unique identifier for this entry
    pub id: String,
    /// Account label the entry was booked on
    pub account: String,
    /// Booking date
    pub date: NaiveDate,
    /// Positive = inflow, negative = outflow; never zero
    pub amount: f64,
    pub description: String,
    pub category_id: CategoryId,
    pub flow: FlowKind,
    /// Relevant for the yearly tax return
    pub tax_relevant: bool,
    pub note: Option<String>,
}

impl LedgerEntry {
    /// Create a new LedgerEntry
    pub fn new(
        id: impl Into<String>,
        account: impl Into<String>,
        date: NaiveDate,
        amount: f64,
        description: impl Into<String>,
        category_id: CategoryId,
    ) -> Self {
        Self {
            id: id.into(),
            account: account.into(),
            date,
            amount,
            description: description.into(),
            category_id,
            flow: FlowKind::Personal,
            tax_relevant: false,
            note: None,
        }
    }

    pub fn with_flow(mut self, flow: FlowKind) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_tax_relevant(mut self, tax_relevant: bool) -> Self {
        self.tax_relevant = tax_relevant;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns true if this is an outflow (negative amount)
    pub fn is_outflow(&self) -> bool {
        self.amount < 0.0
    }

    /// Returns true if this is an inflow (positive amount)
    pub fn is_inflow(&self) -> bool {
        self.amount > 0.0
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_entry_creation() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let entry = LedgerEntry::new("bper-0001", "BPER", date, -45.9, "PAGAMENTO POS CONAD", 7)
            .with_flow(FlowKind::Personal)
            .with_note("value date 2025-02-03");
        assert!(entry.is_outflow());
        assert!(!entry.is_inflow());
        assert_eq!(entry.abs_amount(), 45.9);
        assert_eq!(entry.note.as_deref(), Some("value date 2025-02-03"));
        assert!(!entry.tax_relevant);
    }

    #[test]
    fn test_flow_kind_serde_names() {
        assert_eq!(serde_json::to_string(&FlowKind::Property).unwrap(), "\"property\"");
        let f: FlowKind = serde_json::from_str("\"tax\"").unwrap();
        assert_eq!(f, FlowKind::Tax);
        assert_eq!(FlowKind::default(), FlowKind::Personal);
    }
}
