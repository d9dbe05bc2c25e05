//! Deterministic rules mapping a parsed record onto ledger bookkeeping:
//! ledger category name, cash-flow kind and the tax-relevance flag.
//!
//! Pure keyword tables, no lookups against the store.

use saldo_core::FlowKind;
use saldo_ingest::TransactionRecord;

/// Ledger category for suggestions with no entry in the table
pub const LEDGER_FALLBACK: &str = "Altro Personale";

/// Longest description persisted in the ledger
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Suggested category (parser side) -> ledger category name
const CATEGORY_MAP: &[(&str, &str)] = &[
    ("Affitto", "Affitto Incassato"),
    ("Stipendio", "Stipendio Tirocinio"),
    ("Utenze", "Utenze Casa"),
    ("PayPal", "Acquisti Online"),
    ("Commissioni", "Commissioni Bancarie"),
    ("Prelievo", "Prelievo Contanti"),
    ("Spesa Alimentari", "Cibo e Spesa"),
    ("Trasporti", "Trasporti"),
    ("Ristorazione", "Svago e Intrattenimento"),
    ("Salute", "Salute e Benessere"),
    ("Shopping", "Shopping"),
    ("Carburante", "Trasporti"),
    ("Servizi", "Servizi Digitali"),
];

const TAX_RELEVANT_CATEGORIES: &[&str] = &["Salute e Benessere", "Tasse Scolastiche", "Formazione"];

const TAX_RELEVANT_KEYWORDS: &[&str] = &[
    "farmacia", "medico", "dottore", "analisi", "università", "tasse", "irpef", "f24",
];

/// Result of mapping one record
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped {
    pub ledger_category: &'static str,
    pub flow: FlowKind,
    pub tax_relevant: bool,
}

pub fn ledger_category(suggested: &str) -> &'static str {
    CATEGORY_MAP
        .iter()
        .find(|(from, _)| *from == suggested)
        .map(|(_, to)| *to)
        .unwrap_or(LEDGER_FALLBACK)
}

/// Every ledger category the mapping can produce, first-seen order, no repeats.
pub fn ledger_category_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for (_, to) in CATEGORY_MAP {
        if !names.contains(to) {
            names.push(to);
        }
    }
    names.push(LEDGER_FALLBACK);
    names
}

pub fn flow_kind(description: &str) -> FlowKind {
    let desc = description.to_lowercase();

    if ["affitto", "canone", "locazione"].iter().any(|k| desc.contains(k)) {
        return FlowKind::Property;
    }

    if ["irpef", "f24", "agenzia entrate"].iter().any(|k| desc.contains(k)) {
        return FlowKind::Tax;
    }

    FlowKind::Personal
}

pub fn is_tax_relevant(description: &str, ledger_category: &str) -> bool {
    if TAX_RELEVANT_CATEGORIES.contains(&ledger_category) {
        return true;
    }
    let desc = description.to_lowercase();
    TAX_RELEVANT_KEYWORDS.iter().any(|k| desc.contains(k))
}

pub fn map_record(record: &TransactionRecord) -> Mapped {
    let ledger_category = ledger_category(&record.category);
    Mapped {
        ledger_category,
        flow: flow_kind(&record.description),
        tax_relevant: is_tax_relevant(&record.description, ledger_category),
    }
}

pub fn truncate_description(description: &str) -> String {
    description.chars().take(MAX_DESCRIPTION_CHARS).collect()
}
