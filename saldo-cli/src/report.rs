//! Human summary, JSON and CSV renderings of parsed statements and imports.

use anyhow::Result;
use chrono::NaiveDate;
use saldo_finance::{ImportReport, Reconciliation, reconcile_document};
use saldo_ingest::{BalanceEntry, StatementDocument, StatementStatistics, TransactionRecord};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

fn dash<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn euros(v: f64) -> String {
    format!("{v:.2} €")
}

fn date(d: Option<NaiveDate>) -> String {
    dash(d.map(|d| d.format("%d/%m/%Y")))
}

fn balance(b: Option<&BalanceEntry>) -> String {
    match b {
        Some(b) => format!("{} ({})", euros(b.amount), date(b.date)),
        None => "-".to_string(),
    }
}

/// Categories with negative totals, most negative first.
pub fn spending_by_category(stats: &StatementStatistics) -> Vec<(&str, f64)> {
    let mut spending: Vec<(&str, f64)> = stats
        .categories
        .iter()
        .filter(|(_, c)| c.total < 0.0)
        .map(|(name, c)| (name.as_str(), c.total))
        .collect();
    spending.sort_by(|a, b| a.1.total_cmp(&b.1));
    spending
}

fn write_reconciliation<W: Write>(
    w: &mut W,
    label: &str,
    rec: Option<&Reconciliation>,
) -> Result<()> {
    match rec {
        Some(r) => writeln!(
            w,
            "{label:<14}{} (computed {:.2}, reported {:.2}, difference {:.2})",
            if r.is_consistent() { "consistent" } else { "INCONSISTENT" },
            r.computed,
            r.reported,
            r.difference
        )?,
        None => writeln!(w, "{label:<14}- (balances not found)")?,
    }
    Ok(())
}

pub fn write_summary<W: Write>(
    w: &mut W,
    path: &Path,
    doc: &StatementDocument,
    tolerance: f64,
) -> Result<()> {
    let account = &doc.account;
    let summary = &doc.summary;
    let stats = &doc.statistics;

    writeln!(w, "== {} ==", path.display())?;
    writeln!(w, "{:<14}{}", "IBAN", dash(account.iban.as_deref()))?;
    writeln!(w, "{:<14}{}", "BIC", dash(account.bic.as_deref()))?;
    match &account.holder {
        Some(h) if !h.address.is_empty() => {
            writeln!(w, "{:<14}{}, {}", "Holder", h.name, h.address)?
        }
        Some(h) => writeln!(w, "{:<14}{}", "Holder", h.name)?,
        None => writeln!(w, "{:<14}-", "Holder")?,
    }
    writeln!(w, "{:<14}{}", "Branch", dash(account.branch.as_deref()))?;
    writeln!(w, "{:<14}{}", "Opening", balance(summary.opening.as_ref()))?;
    writeln!(w, "{:<14}{}", "Closing", balance(summary.closing.as_ref()))?;
    writeln!(w, "{:<14}{}", "Variation", dash(summary.variation.map(euros)))?;
    writeln!(
        w,
        "{:<14}in {} / out {}",
        "Totals",
        dash(summary.total_inflow.map(euros)),
        dash(summary.total_outflow.map(euros))
    )?;
    write_reconciliation(w, "Balance check", reconcile_document(doc, tolerance).as_ref())?;

    writeln!(w)?;
    writeln!(
        w,
        "Transactions {} (in {}, out {})",
        stats.transaction_count, stats.inflow_count, stats.outflow_count
    )?;
    writeln!(
        w,
        "  inflow   total {:>10.2}  avg {:>9.2}  max {:>9.2}",
        stats.total_inflow, stats.average_inflow, stats.max_inflow
    )?;
    writeln!(
        w,
        "  outflow  total {:>10.2}  avg {:>9.2}  max {:>9.2}",
        stats.total_outflow, stats.average_outflow, stats.max_outflow
    )?;
    writeln!(w, "  net movement {:.2}", stats.net_movement)?;

    let spending = spending_by_category(stats);
    if !spending.is_empty() {
        writeln!(w)?;
        writeln!(w, "Spending by category")?;
        for (name, total) in spending {
            writeln!(w, "  {name:<24}{total:>10.2}")?;
        }
    }

    if let Some(net) = doc.interest.net_total {
        writeln!(w)?;
        writeln!(w, "Interest      {} rows, net {}", doc.interest.entries.len(), euros(net))?;
    }
    if let Some(avg) = doc.isee.average_balance {
        writeln!(w, "ISEE          average balance {}", euros(avg))?;
    }

    if !doc.issues.is_empty() {
        writeln!(w)?;
        writeln!(w, "Issues ({})", doc.issues.len())?;
        for issue in &doc.issues {
            writeln!(w, "  {issue}")?;
        }
    }
    writeln!(w)?;
    Ok(())
}

#[derive(Serialize)]
struct FileDocument<'a> {
    file: String,
    document: &'a StatementDocument,
}

/// One document is written as-is; several become `[{file, document}, ...]`.
pub fn write_json<W: Write>(w: &mut W, docs: &[(PathBuf, StatementDocument)]) -> Result<()> {
    if let [(_, doc)] = docs {
        serde_json::to_writer_pretty(&mut *w, doc)?;
    } else {
        let wrapped: Vec<FileDocument> = docs
            .iter()
            .map(|(path, document)| FileDocument {
                file: path.display().to_string(),
                document,
            })
            .collect();
        serde_json::to_writer_pretty(&mut *w, &wrapped)?;
    }
    writeln!(w)?;
    Ok(())
}

#[derive(Serialize)]
struct CsvRow<'a> {
    sequence: usize,
    transaction_date: Option<NaiveDate>,
    value_date: Option<NaiveDate>,
    net_amount: String,
    direction: &'static str,
    category: &'a str,
    description: &'a str,
    page: usize,
}

impl<'a> From<&'a TransactionRecord> for CsvRow<'a> {
    fn from(r: &'a TransactionRecord) -> Self {
        Self {
            sequence: r.sequence,
            transaction_date: r.transaction_date,
            value_date: r.value_date,
            net_amount: format!("{:.2}", r.net),
            direction: r.direction().label(),
            category: &r.category,
            description: &r.description,
            page: r.page,
        }
    }
}

pub fn write_csv<'d, W, I>(w: W, docs: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'d StatementDocument>,
{
    let mut wtr = csv::Writer::from_writer(w);
    for doc in docs {
        for record in &doc.transactions {
            wtr.serialize(CsvRow::from(record))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_import_report<W: Write>(
    w: &mut W,
    report: &ImportReport,
    ledger: &Path,
) -> Result<()> {
    writeln!(w, "Imported into {} (account {})", ledger.display(), report.account)?;
    writeln!(w, "{:<14}{}", "Imported", report.imported)?;
    writeln!(w, "{:<14}{}", "Duplicates", report.duplicates)?;
    writeln!(w, "{:<14}{}", "Annotations", report.skipped_annotations)?;
    writeln!(w, "{:<14}{}", "Errors", report.errors.len())?;
    for e in &report.errors {
        writeln!(w, "  #{} {}: {}", e.sequence, e.description, e.reason)?;
    }
    write_reconciliation(w, "Ledger check", report.reconciliation.as_ref())?;
    Ok(())
}
