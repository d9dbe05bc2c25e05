//! Whole-statement assembly.
//!
//! Per page: segment, reconstruct, categorize. Then one stable chronological
//! sort across pages, sequence numbers, the once-per-document sections and
//! the statistics pass.

use serde::{Deserialize, Serialize};

use crate::categorizer::{Categorizer, CategoryTable};
use crate::error::{IngestError, IssueLog};
use crate::fields::{
    capture, labeled_amount, labeled_balance, normalize_iban, parse_amount, parse_date_short,
    round_cents,
};
use crate::format::StatementFormat;
use crate::reconstructor::{DEFAULT_INFLOW_COLUMN, RecordReconstructor};
use crate::segmenter::TableSegmenter;
use crate::statistics;
use crate::types::{
    AccountHolder, AccountInfo, BalanceEntry, InterestEntry, InterestSection, IseeInfo, PageText,
    StatementDocument, StatementSummary, TransactionRecord,
};

/// External text-extraction collaborator: yields page text, in page order.
pub trait TextSource {
    fn extract(&self) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Fail the document when any issue was recorded
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_inflow_column")]
    pub inflow_column: usize,
    /// Text opening the holder block (usually the holder's name as printed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_marker: Option<String>,
}

fn default_inflow_column() -> usize {
    DEFAULT_INFLOW_COLUMN
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: false,
            inflow_column: DEFAULT_INFLOW_COLUMN,
            holder_marker: None,
        }
    }
}

/// Immutable parser configuration; `parse` keeps no state between calls.
#[derive(Debug, Clone)]
pub struct StatementParser {
    format: StatementFormat,
    categorizer: Categorizer,
    options: ParseOptions,
}

impl StatementParser {
    pub fn new(format: StatementFormat, categories: CategoryTable, options: ParseOptions) -> Self {
        Self {
            format,
            categorizer: Categorizer::new(categories),
            options,
        }
    }

    /// BPER format, default category table and options.
    pub fn bper() -> Result<Self, IngestError> {
        Ok(Self::new(
            StatementFormat::bper()?,
            CategoryTable::bper(),
            ParseOptions::default(),
        ))
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    pub fn parse_source(&self, source: &dyn TextSource) -> Result<StatementDocument, IngestError> {
        let pages = source.extract()?;
        self.parse(&pages)
    }

    pub fn parse(&self, pages: &[PageText]) -> Result<StatementDocument, IngestError> {
        let pages: Vec<&PageText> = pages.iter().filter(|p| !p.is_blank()).collect();
        if pages.is_empty() {
            return Err(IngestError::NoPages);
        }

        let mut issues = IssueLog::new();
        let full_text = pages.iter().map(|p| p.joined()).collect::<Vec<_>>().join("\n");

        let transactions = self.extract_transactions(&pages, &mut issues);
        let account = self.extract_account_info(&full_text);
        let summary = self.extract_summary(&full_text, &mut issues);
        let isee = self.extract_isee(&full_text, &mut issues);
        let interest = self.extract_interest(&pages, &mut issues);
        let statistics = statistics::compute(&transactions);

        tracing::info!(
            format = self.format.name,
            pages = pages.len(),
            transactions = transactions.len(),
            issues = issues.len(),
            "statement parsed"
        );

        if self.options.strict && !issues.is_empty() {
            return Err(IngestError::Strict(issues.into_vec()));
        }

        Ok(StatementDocument {
            account,
            summary,
            transactions,
            interest,
            isee,
            statistics,
            issues: issues.into_vec(),
        })
    }

    fn extract_transactions(
        &self,
        pages: &[&PageText],
        issues: &mut IssueLog,
    ) -> Vec<TransactionRecord> {
        let segmenter = TableSegmenter::new(&self.format);
        let reconstructor =
            RecordReconstructor::new(&self.format, &self.categorizer, self.options.inflow_column);

        let mut all = Vec::new();
        for page in pages {
            let Some(range) = segmenter.segment(&page.lines) else {
                tracing::debug!(page = page.number, "no transaction table on page");
                continue;
            };
            let records = reconstructor.reconstruct(page, range.clone(), issues);
            tracing::debug!(
                page = page.number,
                lines = ?range,
                records = records.len(),
                "transaction table"
            );
            all.extend(records);
        }

        // Stable: equal dates keep page/line order. Undated records go last.
        all.sort_by_key(|r| (r.transaction_date.is_none(), r.transaction_date));
        for (i, r) in all.iter_mut().enumerate() {
            r.sequence = i + 1;
        }
        all
    }

    fn extract_account_info(&self, text: &str) -> AccountInfo {
        AccountInfo {
            iban: capture(&self.format.iban, text).map(normalize_iban),
            bic: capture(&self.format.bic, text).map(str::to_string),
            holder: self.extract_holder(text),
            branch: capture(&self.format.branch, text).map(str::to_string),
        }
    }

    fn extract_holder(&self, text: &str) -> Option<AccountHolder> {
        let marker = self.options.holder_marker.as_deref().filter(|m| !m.is_empty())?;
        let start = text.find(marker)?;
        let block_end = self.format.holder_end.find(&text[start..])?.start();
        let block = text[start..start + block_end].trim();

        let lines: Vec<&str> = block.lines().collect();
        let name = lines.first()?.trim().to_string();
        let address = if lines.len() > 2 {
            lines[1..3].join(" ").trim().to_string()
        } else {
            String::new()
        };
        Some(AccountHolder { name, address })
    }

    fn extract_summary(&self, text: &str, issues: &mut IssueLog) -> StatementSummary {
        let mut balance = |re: &regex::Regex| {
            labeled_balance(re, text).map(|(date, amount)| BalanceEntry {
                date: issues.date(0, None, date),
                amount: issues.amount(0, None, amount),
            })
        };
        let opening = balance(&self.format.opening_balance);
        let closing = balance(&self.format.closing_balance);

        let total_inflow =
            labeled_amount(&self.format.total_inflow, text).map(|a| issues.amount(0, None, a));
        let total_outflow =
            labeled_amount(&self.format.total_outflow, text).map(|a| issues.amount(0, None, a));

        let variation = match (&opening, &closing) {
            (Some(o), Some(c)) => Some(round_cents(c.amount - o.amount)),
            _ => None,
        };

        StatementSummary {
            opening,
            closing,
            total_inflow,
            total_outflow,
            variation,
        }
    }

    fn extract_isee(&self, text: &str, issues: &mut IssueLog) -> IseeInfo {
        let average_balance =
            labeled_amount(&self.format.isee_average, text).map(|a| issues.amount(0, None, a));

        let (year, year_end_balance) = match self.format.isee_year_end.captures(text) {
            Some(caps) => (
                caps.get(1).and_then(|m| m.as_str().parse().ok()),
                caps.get(2).map(|m| issues.amount(0, None, parse_amount(m.as_str()))),
            ),
            None => (None, None),
        };

        IseeInfo {
            average_balance,
            year,
            year_end_balance,
        }
    }

    fn extract_interest(&self, pages: &[&PageText], issues: &mut IssueLog) -> InterestSection {
        let mut section = InterestSection::default();

        for page in pages {
            if !page.lines.iter().any(|l| l.contains(self.format.interest_marker)) {
                continue;
            }
            let n = page.number;
            // A row never spans lines.
            for line in &page.lines {
                if let Some(caps) = self.format.interest_row.captures(line) {
                    let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
                    section.entries.push(InterestEntry {
                        date: issues.date(n, None, parse_date_short(field(1))),
                        rate: issues.amount(n, None, parse_amount(field(2))),
                        basis: issues.amount(n, None, parse_amount(field(3))),
                        interest: issues.amount(n, None, parse_amount(field(4))),
                    });
                } else if let Some(total) = labeled_amount(&self.format.interest_total, line) {
                    section.net_total = Some(issues.amount(n, None, total));
                }
            }
        }

        section
    }
}
