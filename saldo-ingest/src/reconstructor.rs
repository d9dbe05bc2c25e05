//! Rebuilds transaction records from the lines of one table segment.
//!
//! A line starting with two `DD/MM/YY` dates opens a record, running-balance
//! rows are dropped, anything else continues the open record's description.
//!
//! Amount columns: the table prints USCITE (outflow) before ENTRATE (inflow).
//! With two tokens on a line the first is the outflow and the second the
//! inflow. A lone token is placed by its column offset from the value date.

use std::ops::Range;

use regex::Regex;

use crate::categorizer::Categorizer;
use crate::error::{IssueKind, IssueLog, ParseIssue};
use crate::fields::{normalize_whitespace, parse_amount, parse_date_short};
use crate::format::StatementFormat;
use crate::types::{PageText, TransactionRecord};

/// Default column offset separating the outflow and inflow columns.
///
/// Counted in characters from the end of the value-date token, not from the
/// start of the line. A lone amount starting more than this many characters
/// after the value date reads as inflow.
pub const DEFAULT_INFLOW_COLUMN: usize = 20;

/// Money tokens of a transaction line, assigned to their columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountSplit<'a> {
    pub outflow: Option<&'a str>,
    pub inflow: Option<&'a str>,
    /// Tokens beyond the second one; removed from the description
    pub extra: Vec<&'a str>,
    pub description: String,
}

/// Split the part of a transaction line following the value date.
///
/// `inflow_column` is compared to the character offset of a lone token
/// within `rest`; offsets past it read as inflow.
pub fn split_amounts<'a>(rest: &'a str, money: &Regex, inflow_column: usize) -> AmountSplit<'a> {
    let tokens: Vec<regex::Match<'a>> = money.find_iter(rest).collect();

    let mut description = String::with_capacity(rest.len());
    let mut cursor = 0;
    for m in &tokens {
        description.push_str(&rest[cursor..m.start()]);
        description.push(' ');
        cursor = m.end();
    }
    description.push_str(&rest[cursor..]);
    let description = normalize_whitespace(&description);

    let (outflow, inflow) = match tokens.as_slice() {
        [] => (None, None),
        [only] => {
            let offset = rest[..only.start()].chars().count();
            if offset > inflow_column {
                (None, Some(only.as_str()))
            } else {
                (Some(only.as_str()), None)
            }
        }
        [first, second, ..] => (Some(first.as_str()), Some(second.as_str())),
    };

    AmountSplit {
        outflow,
        inflow,
        extra: tokens.iter().skip(2).map(|m| m.as_str()).collect(),
        description,
    }
}

/// A record whose description may still grow.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    pub line: usize,
    pub transaction_date: Option<chrono::NaiveDate>,
    pub value_date: Option<chrono::NaiveDate>,
    pub outflow: Option<f64>,
    pub inflow: Option<f64>,
    pub description: String,
}

impl DraftRecord {
    pub fn push_continuation(&mut self, text: &str) {
        if self.description.is_empty() {
            self.description.push_str(text);
        } else {
            self.description.push(' ');
            self.description.push_str(text);
        }
    }

    pub fn net(&self) -> f64 {
        match (self.inflow, self.outflow) {
            (Some(inflow), _) => inflow,
            (None, Some(outflow)) => -outflow,
            (None, None) => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Start(DraftRecord),
    BalanceRow,
    Continuation(String),
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructorState {
    Idle,
    Building(DraftRecord),
}

impl ReconstructorState {
    /// Transition on one classified line; returns the record it completes.
    pub fn step(self, kind: LineKind) -> (Self, Option<DraftRecord>) {
        match (self, kind) {
            (state, LineKind::Start(draft)) => {
                (ReconstructorState::Building(draft), state.finish())
            }
            (state, LineKind::BalanceRow | LineKind::Blank) => (state, None),
            (ReconstructorState::Building(mut draft), LineKind::Continuation(text)) => {
                draft.push_continuation(&text);
                (ReconstructorState::Building(draft), None)
            }
            (ReconstructorState::Idle, LineKind::Continuation(_)) => {
                (ReconstructorState::Idle, None)
            }
        }
    }

    pub fn finish(self) -> Option<DraftRecord> {
        match self {
            ReconstructorState::Idle => None,
            ReconstructorState::Building(draft) => Some(draft),
        }
    }
}

pub struct RecordReconstructor<'a> {
    format: &'a StatementFormat,
    categorizer: &'a Categorizer,
    inflow_column: usize,
}

impl<'a> RecordReconstructor<'a> {
    pub fn new(
        format: &'a StatementFormat,
        categorizer: &'a Categorizer,
        inflow_column: usize,
    ) -> Self {
        Self {
            format,
            categorizer,
            inflow_column,
        }
    }

    /// Classify one line; `line_no` is 1-based within the page.
    pub fn classify(
        &self,
        raw: &str,
        page: usize,
        line_no: usize,
        issues: &mut IssueLog,
    ) -> LineKind {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return LineKind::Blank;
        }

        if let Some(caps) = self.format.transaction_start.captures(raw) {
            let (Some(whole), Some(booking), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                return LineKind::Continuation(trimmed.to_string());
            };
            let rest = &raw[whole.end()..];
            let split = split_amounts(rest, &self.format.money_token, self.inflow_column);

            let transaction_date =
                issues.date(page, Some(line_no), parse_date_short(booking.as_str()));
            if transaction_date.is_none() {
                issues.push(ParseIssue::new(
                    page,
                    Some(line_no),
                    IssueKind::UndatedRecord,
                    trimmed,
                ));
            }
            let value_date = issues.date(page, Some(line_no), parse_date_short(value.as_str()));
            if !split.extra.is_empty() {
                issues.push(ParseIssue::new(
                    page,
                    Some(line_no),
                    IssueKind::ExtraAmounts,
                    split.extra.join(" "),
                ));
            }

            let outflow = split
                .outflow
                .map(|t| issues.amount(page, Some(line_no), parse_amount(t)));
            let inflow = split
                .inflow
                .map(|t| issues.amount(page, Some(line_no), parse_amount(t)));

            return LineKind::Start(DraftRecord {
                line: line_no,
                transaction_date,
                value_date,
                outflow,
                inflow,
                description: split.description,
            });
        }

        if self.format.balance_row.is_match(raw) {
            return LineKind::BalanceRow;
        }

        LineKind::Continuation(trimmed.to_string())
    }

    /// Records of `range` within `page`, in line order, unsequenced.
    pub fn reconstruct(
        &self,
        page: &PageText,
        range: Range<usize>,
        issues: &mut IssueLog,
    ) -> Vec<TransactionRecord> {
        let end = range.end.min(page.lines.len());
        let start = range.start.min(end);

        let mut state = ReconstructorState::Idle;
        let mut drafts = Vec::new();
        for (i, raw) in page.lines[start..end].iter().enumerate() {
            let kind = self.classify(raw, page.number, start + i + 1, issues);
            let (next, done) = state.step(kind);
            state = next;
            drafts.extend(done);
        }
        drafts.extend(state.finish());

        drafts.into_iter().map(|d| self.finalize(d, page.number)).collect()
    }

    fn finalize(&self, draft: DraftRecord, page: usize) -> TransactionRecord {
        let net = draft.net();
        let description = self.clean_description(&draft.description);
        let category = self.categorizer.categorize(&description).to_string();
        TransactionRecord {
            transaction_date: draft.transaction_date,
            value_date: draft.value_date,
            outflow: draft.outflow,
            inflow: draft.inflow,
            net,
            description,
            category,
            page,
            sequence: 0,
        }
    }

    pub fn clean_description(&self, description: &str) -> String {
        let normalized = normalize_whitespace(description);
        self.format
            .reference_suffix
            .replace(&normalized, "")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn format() -> StatementFormat {
        StatementFormat::bper().unwrap()
    }

    fn page(lines: &[&str]) -> PageText {
        PageText::new(1, lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_split_two_amounts_is_outflow_then_inflow() {
        let f = format();
        let s = split_amounts(
            "  10,00   1.500,00  GIROCONTO",
            &f.money_token,
            DEFAULT_INFLOW_COLUMN,
        );
        assert_eq!(s.outflow, Some("10,00"));
        assert_eq!(s.inflow, Some("1.500,00"));
        assert_eq!(s.description, "GIROCONTO");
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_split_single_amount_by_column() {
        let f = format();
        let out = split_amounts("  45,90                PAGAMENTO POS", &f.money_token, 20);
        assert_eq!(out.outflow, Some("45,90"));
        assert_eq!(out.inflow, None);

        let inn = split_amounts("                       1.200,00  STIPENDIO", &f.money_token, 20);
        assert_eq!(inn.outflow, None);
        assert_eq!(inn.inflow, Some("1.200,00"));
        assert_eq!(inn.description, "STIPENDIO");
    }

    #[test]
    fn test_split_without_amounts() {
        let f = format();
        let s = split_amounts("  ANNULLO OPERAZIONE", &f.money_token, 20);
        assert_eq!((s.outflow, s.inflow), (None, None));
        assert_eq!(s.description, "ANNULLO OPERAZIONE");
    }

    #[test]
    fn test_split_extra_tokens_removed_from_description() {
        let f = format();
        let s = split_amounts(" 1,00 2,00 3,00 TRE IMPORTI", &f.money_token, 20);
        assert_eq!(s.extra, vec!["3,00"]);
        assert_eq!(s.description, "TRE IMPORTI");
    }

    #[test]
    fn test_state_transitions() {
        let draft = |line: usize| DraftRecord {
            line,
            transaction_date: None,
            value_date: None,
            outflow: Some(1.0),
            inflow: None,
            description: format!("R{line}"),
        };

        let (s, done) = ReconstructorState::Idle.step(LineKind::Continuation("orphan".into()));
        assert_eq!(s, ReconstructorState::Idle);
        assert!(done.is_none());

        let (s, done) = s.step(LineKind::Start(draft(1)));
        assert!(done.is_none());
        let (s, _) = s.step(LineKind::BalanceRow);
        let (s, _) = s.step(LineKind::Continuation("wrapped".into()));
        let (s, done) = s.step(LineKind::Start(draft(3)));
        assert_eq!(done.unwrap().description, "R1 wrapped");
        assert_eq!(s.finish().unwrap().description, "R3");
    }

    #[test]
    fn test_reconstruct_wrapped_and_balance_rows() {
        let f = format();
        let c = Categorizer::default();
        let r = RecordReconstructor::new(&f, &c, DEFAULT_INFLOW_COLUMN);
        let p = page(&[
            "orphan line before any record",
            "31/01/25 1.000,00 SALDO INIZIALE",
            "03/02/25 03/02/25  45,90                PAGAMENTO POS CONAD",
            "          CARTA 1234 ROMA",
            "",
            "05/02/25 06/02/25                       1.200,00  BONIFICO SEPA DA ACME SRL",
            "          -RIF. 12345/678",
        ]);
        let mut issues = IssueLog::new();
        let records = r.reconstruct(&p, 0..p.lines.len(), &mut issues);

        assert!(issues.is_empty());
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].transaction_date, NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(records[0].outflow, Some(45.90));
        assert_eq!(records[0].net, -45.90);
        assert_eq!(records[0].description, "PAGAMENTO POS CONAD CARTA 1234 ROMA");
        assert_eq!(records[0].category, "Spesa Alimentari");

        assert_eq!(records[1].value_date, NaiveDate::from_ymd_opt(2025, 2, 6));
        assert_eq!(records[1].inflow, Some(1200.0));
        assert_eq!(records[1].net, 1200.0);
        assert_eq!(records[1].description, "BONIFICO SEPA DA ACME SRL");
        assert_eq!(records[1].category, "Stipendio");
        assert_eq!(records[1].page, 1);
    }

    #[test]
    fn test_amount_free_row_is_kept_with_zero_net() {
        let f = format();
        let c = Categorizer::default();
        let r = RecordReconstructor::new(&f, &c, DEFAULT_INFLOW_COLUMN);
        let p = page(&["10/02/25 10/02/25  STORNO SCRITTURA"]);
        let mut issues = IssueLog::new();
        let records = r.reconstruct(&p, 0..1, &mut issues);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_annotation());
        assert_eq!(records[0].net, 0.0);
    }

    #[test]
    fn test_bad_dates_are_recorded_not_fatal() {
        let f = format();
        let c = Categorizer::default();
        let r = RecordReconstructor::new(&f, &c, DEFAULT_INFLOW_COLUMN);
        let p = page(&["31/02/25 01/03/25  5,00  COMMISSIONI"]);
        let mut issues = IssueLog::new();
        let records = r.reconstruct(&p, 0..1, &mut issues);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_date, None);
        let kinds: Vec<IssueKind> = issues.into_vec().into_iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::MalformedDate, IssueKind::UndatedRecord]);
    }

    #[test]
    fn test_clean_description_strips_reference_suffix() {
        let f = format();
        let c = Categorizer::default();
        let r = RecordReconstructor::new(&f, &c, DEFAULT_INFLOW_COLUMN);
        assert_eq!(r.clean_description("  GIROCONTO   -RIF. 998/12 "), "GIROCONTO");
        assert_eq!(r.clean_description("RIF. 998/12 IN MEZZO"), "RIF. 998/12 IN MEZZO");
    }
}
