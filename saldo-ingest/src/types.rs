use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ParseIssue;

/// One page of extracted statement text, split into lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based position of the page in the statement.
    pub number: usize,
    pub lines: Vec<String>,
}

impl PageText {
    pub fn new(number: usize, lines: Vec<String>) -> Self {
        Self { number, lines }
    }

    pub fn from_text(number: usize, text: &str) -> Self {
        Self::new(number, text.lines().map(str::to_string).collect())
    }

    /// Split `pdftotext` style output (form feed between pages) into pages.
    ///
    /// The trailing form feed `pdftotext` writes after the last page does not
    /// produce an extra page.
    pub fn split_pages(text: &str) -> Vec<PageText> {
        let mut chunks: Vec<&str> = text.split('\x0c').collect();
        if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
            chunks.pop();
        }
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| PageText::from_text(i + 1, chunk))
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountHolder {
    pub name: String,
    pub address: String,
}

/// Account metadata. Every field is optional: `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// IBAN with all whitespace removed
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub holder: Option<AccountHolder>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub date: Option<NaiveDate>,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub opening: Option<BalanceEntry>,
    pub closing: Option<BalanceEntry>,
    pub total_inflow: Option<f64>,
    pub total_outflow: Option<f64>,
    /// closing - opening, rounded to cents; only when both balances exist
    pub variation: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "inflow")]
    Inflow,
    #[serde(rename = "outflow")]
    Outflow,
    /// Amount-free annotation row
    #[serde(rename = "none")]
    None,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Inflow => "inflow",
            Direction::Outflow => "outflow",
            Direction::None => "none",
        }
    }
}

/// A reconstructed row of the transaction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    pub outflow: Option<f64>,
    pub inflow: Option<f64>,
    /// +inflow, else -outflow, else 0
    pub net: f64,
    pub description: String,
    pub category: String,
    pub page: usize,
    /// 1-based, assigned after global chronological ordering
    pub sequence: usize,
}

impl TransactionRecord {
    pub fn direction(&self) -> Direction {
        if self.net > 0.0 {
            Direction::Inflow
        } else if self.net < 0.0 {
            Direction::Outflow
        } else {
            Direction::None
        }
    }

    pub fn is_annotation(&self) -> bool {
        self.outflow.is_none() && self.inflow.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestEntry {
    pub date: Option<NaiveDate>,
    pub rate: f64,
    /// Day-count basis ("numeri") the interest was computed on
    pub basis: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestSection {
    pub entries: Vec<InterestEntry>,
    pub net_total: Option<f64>,
}

/// Means-testing balance snapshot printed on some statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IseeInfo {
    pub average_balance: Option<f64>,
    pub year: Option<i32>,
    pub year_end_balance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub count: usize,
    pub total: f64,
    pub sequences: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementStatistics {
    pub transaction_count: usize,
    pub inflow_count: usize,
    pub outflow_count: usize,
    pub total_inflow: f64,
    /// Absolute value of the summed outflows
    pub total_outflow: f64,
    pub net_movement: f64,
    pub average_inflow: f64,
    pub average_outflow: f64,
    pub max_inflow: f64,
    pub max_outflow: f64,
    pub categories: BTreeMap<String, CategoryStats>,
}

/// Everything a single parse produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementDocument {
    pub account: AccountInfo,
    pub summary: StatementSummary,
    pub transactions: Vec<TransactionRecord>,
    pub interest: InterestSection,
    pub isee: IseeInfo,
    pub statistics: StatementStatistics,
    pub issues: Vec<ParseIssue>,
}
