//! Importer: books a parsed statement into a ledger store.
//!
//! Annotations are skipped, duplicates are counted and left out, and a record
//! that cannot be booked is reported without aborting the rest of the import.

use crate::dedup::is_duplicate;
use crate::ledger_mapping::{ledger_category_names, map_record, truncate_description};
use crate::reconcile::{DEFAULT_TOLERANCE, Reconciliation, reconcile};
use crate::store::{LedgerStore, StoreError};
use saldo_core::{CategoryId, LedgerEntry};
use saldo_ingest::{AccountInfo, StatementDocument, TransactionRecord};
use serde::Serialize;
use std::collections::HashMap;

/// One record the importer could not book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFailure {
    pub sequence: usize,
    pub description: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub account: String,
    pub imported: usize,
    pub duplicates: usize,
    pub skipped_annotations: usize,
    pub errors: Vec<ImportFailure>,
    /// Ledger balance vs the statement's closing balance
    pub reconciliation: Option<Reconciliation>,
}

#[derive(Debug, Clone)]
pub struct Importer {
    tolerance: f64,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl Importer {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn import<S>(
        &self,
        store: &mut S,
        doc: &StatementDocument,
        account: &str,
    ) -> Result<ImportReport, StoreError>
    where
        S: LedgerStore + ?Sized,
    {
        if store.account_opening(account)?.is_none() {
            let opening = doc.summary.opening.as_ref().map(|b| b.amount).unwrap_or(0.0);
            store.open_account(account, opening)?;
        }

        let category_ids = ensure_categories(store)?;
        // Duplicates are judged against what was booked before this import,
        // so identical rows within one statement are all kept.
        let existing = store.transactions(account)?;
        let mut next_id = existing.len() + 1;

        let mut report = ImportReport {
            account: account.to_string(),
            ..Default::default()
        };

        for record in &doc.transactions {
            if record.net == 0.0 {
                report.skipped_annotations += 1;
                continue;
            }

            let entry = match to_entry(record, account, next_id, &category_ids) {
                Ok(entry) => entry,
                Err(reason) => {
                    report.errors.push(failure(record, reason));
                    continue;
                }
            };

            if is_duplicate(&entry, &existing) {
                tracing::debug!(
                    sequence = record.sequence,
                    date = %entry.date,
                    "duplicate skipped"
                );
                report.duplicates += 1;
                continue;
            }

            match store.insert_transaction(entry) {
                Ok(()) => {
                    report.imported += 1;
                    next_id += 1;
                }
                Err(e @ (StoreError::InvalidEntry { .. } | StoreError::UnknownCategory(_))) => {
                    report.errors.push(failure(record, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        report.reconciliation = self.reconcile_ledger(store, doc, account)?;

        tracing::info!(
            account,
            imported = report.imported,
            duplicates = report.duplicates,
            skipped = report.skipped_annotations,
            errors = report.errors.len(),
            "statement imported"
        );

        Ok(report)
    }

    /// Account opening balance plus every booked entry, against the statement's
    /// closing balance. `None` unless the statement reports both balances.
    fn reconcile_ledger<S>(
        &self,
        store: &S,
        doc: &StatementDocument,
        account: &str,
    ) -> Result<Option<Reconciliation>, StoreError>
    where
        S: LedgerStore + ?Sized,
    {
        let (Some(_), Some(closing)) = (&doc.summary.opening, &doc.summary.closing) else {
            return Ok(None);
        };
        let opening = store.account_opening(account)?.unwrap_or(0.0);
        let amounts = store.transactions(account)?.into_iter().map(|e| e.amount);
        let result = reconcile(opening, amounts, closing.amount, self.tolerance);
        if !result.is_consistent() {
            tracing::warn!(
                account,
                computed = result.computed,
                reported = result.reported,
                difference = result.difference,
                "ledger balance does not match statement"
            );
        }
        Ok(Some(result))
    }
}

/// Ledger account for a statement: `BPER - <branch> (<last 4 IBAN chars>)`,
/// with `Conto` standing in for a missing branch. `None` without an IBAN.
pub fn account_label(info: &AccountInfo) -> Option<String> {
    let iban = info.iban.as_deref().filter(|i| !i.is_empty())?;
    let tail: String = iban.chars().skip(iban.chars().count().saturating_sub(4)).collect();
    let branch = info.branch.as_deref().unwrap_or("Conto");
    Some(format!("BPER - {branch} ({tail})"))
}

/// Create every ledger category the mapping can produce; returns name -> id.
fn ensure_categories<S>(store: &mut S) -> Result<HashMap<String, CategoryId>, StoreError>
where
    S: LedgerStore + ?Sized,
{
    let mut ids: HashMap<String, CategoryId> = store
        .categories()?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();

    for name in ledger_category_names() {
        if !ids.contains_key(name) {
            let created = store.create_category(name)?;
            ids.insert(created.name, created.id);
        }
    }
    Ok(ids)
}

fn to_entry(
    record: &TransactionRecord,
    account: &str,
    id: usize,
    category_ids: &HashMap<String, CategoryId>,
) -> Result<LedgerEntry, String> {
    let date = record.transaction_date.ok_or("missing transaction date")?;
    let mapped = map_record(record);
    let category_id = *category_ids
        .get(mapped.ledger_category)
        .ok_or_else(|| format!("no ledger category {}", mapped.ledger_category))?;

    let mut entry = LedgerEntry::new(
        format!("{}-{:05}", account.to_lowercase().replace(' ', "-"), id),
        account,
        date,
        record.net,
        truncate_description(&record.description),
        category_id,
    )
    .with_flow(mapped.flow)
    .with_tax_relevant(mapped.tax_relevant);

    if let Some(value_date) = record.value_date {
        entry = entry.with_note(format!("value date {value_date}"));
    }
    Ok(entry)
}

fn failure(record: &TransactionRecord, reason: impl Into<String>) -> ImportFailure {
    ImportFailure {
        sequence: record.sequence,
        description: record.description.clone(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::ReconcileStatus;
    use crate::store::MemoryLedger;
    use chrono::NaiveDate;
    use saldo_core::FlowKind;
    use saldo_ingest::{BalanceEntry, StatementSummary};

    fn d(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 1, day)
    }

    fn record(
        seq: usize,
        day: Option<NaiveDate>,
        net: f64,
        description: &str,
        category: &str,
    ) -> TransactionRecord {
        TransactionRecord {
            transaction_date: day,
            value_date: day,
            outflow: (net < 0.0).then_some(-net),
            inflow: (net > 0.0).then_some(net),
            net,
            description: description.to_string(),
            category: category.to_string(),
            page: 1,
            sequence: seq,
        }
    }

    fn doc(closing: f64) -> StatementDocument {
        StatementDocument {
            summary: StatementSummary {
                opening: Some(BalanceEntry { date: d(1), amount: 1000.0 }),
                closing: Some(BalanceEntry { date: d(31), amount: closing }),
                ..Default::default()
            },
            transactions: vec![
                record(1, d(3), 1200.0, "BONIFICO STIPENDIO GENNAIO", "Stipendio"),
                record(2, d(5), -450.0, "CANONE LOCAZIONE GENNAIO", "Affitto"),
                record(3, d(8), 0.0, "COMUNICAZIONE", "Other"),
                record(4, d(9), -25.44, "FARMACIA COMUNALE", "Salute"),
                record(5, None, -10.0, "SENZA DATA", "Other"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_import_books_records_and_reconciles() {
        let mut ledger = MemoryLedger::new();
        let report = Importer::default()
            .import(&mut ledger, &doc(1724.56), "BPER")
            .unwrap();

        assert_eq!(report.imported, 3);
        assert_eq!(report.skipped_annotations, 1);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].sequence, 5);

        let rec = report.reconciliation.unwrap();
        assert_eq!(rec.computed, 1724.56);
        assert_eq!(rec.status, ReconcileStatus::Consistent);

        let entries = ledger.entries();
        assert_eq!(entries[1].flow, FlowKind::Property);
        assert!(entries[2].tax_relevant);
        assert_eq!(entries[0].note.as_deref(), Some("value date 2025-01-03"));
        assert_eq!(entries[0].id, "bper-00001");
    }

    #[test]
    fn test_reimport_counts_duplicates() {
        let mut ledger = MemoryLedger::new();
        let importer = Importer::default();
        importer.import(&mut ledger, &doc(1724.56), "BPER").unwrap();
        let again = importer.import(&mut ledger, &doc(1724.56), "BPER").unwrap();

        assert_eq!(again.imported, 0);
        assert_eq!(again.duplicates, 3);
        assert_eq!(ledger.entries().len(), 3);
        assert!(again.reconciliation.unwrap().is_consistent());
    }

    #[test]
    fn test_mismatched_closing_is_inconsistent() {
        let mut ledger = MemoryLedger::new();
        let report = Importer::default()
            .import(&mut ledger, &doc(1724.60), "BPER")
            .unwrap();
        let rec = report.reconciliation.unwrap();
        assert_eq!(rec.status, ReconcileStatus::Inconsistent);
        assert_eq!(rec.difference, 0.04);
    }

    #[test]
    fn test_categories_created_once() {
        let mut ledger = MemoryLedger::new();
        let importer = Importer::default();
        importer.import(&mut ledger, &doc(0.0), "BPER").unwrap();
        let before = ledger.categories().unwrap().len();
        importer.import(&mut ledger, &doc(0.0), "ALTRO").unwrap();
        assert_eq!(ledger.categories().unwrap().len(), before);
        assert_eq!(before, ledger_category_names().len());
    }

    #[test]
    fn test_identical_rows_in_one_statement_are_all_booked() {
        let twins = StatementDocument {
            summary: StatementSummary {
                opening: Some(BalanceEntry { date: d(1), amount: 10.0 }),
                closing: Some(BalanceEntry { date: d(31), amount: 7.0 }),
                ..Default::default()
            },
            transactions: vec![
                record(1, d(7), -1.5, "ATAC BIGLIETTO", "Trasporti"),
                record(2, d(7), -1.5, "ATAC BIGLIETTO", "Trasporti"),
            ],
            ..Default::default()
        };

        let mut ledger = MemoryLedger::new();
        let importer = Importer::default();
        let report = importer.import(&mut ledger, &twins, "BPER").unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.duplicates, 0);
        assert!(report.reconciliation.unwrap().is_consistent());

        let again = importer.import(&mut ledger, &twins, "BPER").unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.duplicates, 2);
        assert_eq!(ledger.entries().len(), 2);
    }

    #[test]
    fn test_account_label_from_branch_and_iban() {
        let mut info = AccountInfo {
            iban: Some("IT60X0538703201000001234567".into()),
            branch: Some("ROMA-PRATI".into()),
            ..Default::default()
        };
        assert_eq!(account_label(&info).as_deref(), Some("BPER - ROMA-PRATI (4567)"));

        info.branch = None;
        assert_eq!(account_label(&info).as_deref(), Some("BPER - Conto (4567)"));

        info.iban = None;
        assert_eq!(account_label(&info), None);
    }
}
