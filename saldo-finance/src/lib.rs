//! saldo-finance: ledger mapping, duplicate detection, balance reconciliation,
//! importer and cash-flow reports

pub mod dedup;
pub mod importer;
pub mod ledger_mapping;
pub mod reconcile;
pub mod report;
pub mod store;

pub use importer::{ImportFailure, ImportReport, Importer, account_label};
pub use reconcile::{
    DEFAULT_TOLERANCE, ReconcileStatus, Reconciliation, reconcile, reconcile_document,
};
pub use report::{CashFlow, cash_flow};
pub use store::{LedgerStore, MemoryLedger, StoreError};
