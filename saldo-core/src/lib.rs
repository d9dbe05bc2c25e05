//! saldo-core: ledger types shared by the importer and the CLI

pub mod ledger;

pub use ledger::{CategoryId, FlowKind, LedgerCategory, LedgerEntry};
