//! Document-level failures and the per-field issues collected alongside a parse.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failures that abort a whole parse. Nothing partial is returned.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("text extraction produced no pages")]
    NoPages,

    #[error("text extraction failed for {origin}")]
    Extraction {
        origin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid statement pattern {name}: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("strict mode: {} issue(s), first: {}", .0.len(), first_issue(.0))]
    Strict(Vec<ParseIssue>),
}

fn first_issue(issues: &[ParseIssue]) -> String {
    issues
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

/// A token that matched its surrounding pattern but could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("malformed amount {0:?}")]
    Amount(String),
    #[error("malformed date {0:?}")]
    Date(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "malformed-amount")]
    MalformedAmount,
    #[serde(rename = "malformed-date")]
    MalformedDate,
    /// More than two amount tokens on a transaction line
    #[serde(rename = "extra-amounts")]
    ExtraAmounts,
    /// Transaction line whose booking date did not parse
    #[serde(rename = "undated-record")]
    UndatedRecord,
}

/// A field or record level problem absorbed by the lenient parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// 0 for sections read from the whole document text
    pub page: usize,
    /// 1-based line within the page, when known
    pub line: Option<usize>,
    pub kind: IssueKind,
    pub text: String,
}

impl ParseIssue {
    pub fn new(page: usize, line: Option<usize>, kind: IssueKind, text: impl Into<String>) -> Self {
        Self {
            page,
            line,
            kind,
            text: text.into(),
        }
    }

    pub fn from_field(page: usize, line: Option<usize>, err: &FieldError) -> Self {
        match err {
            FieldError::Amount(t) => Self::new(page, line, IssueKind::MalformedAmount, t.clone()),
            FieldError::Date(t) => Self::new(page, line, IssueKind::MalformedDate, t.clone()),
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "page {} line {}: {:?} {:?}",
                self.page, line, self.kind, self.text
            ),
            None => write!(f, "page {}: {:?} {:?}", self.page, self.kind, self.text),
        }
    }
}

/// Collects the issues of one parse; lenient conversions go through here.
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Vec<ParseIssue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ParseIssue) {
        tracing::warn!(
            page = issue.page,
            line = ?issue.line,
            kind = ?issue.kind,
            text = %issue.text,
            "statement parse issue"
        );
        self.issues.push(issue);
    }

    /// Unwrap an amount, recording the failure and falling back to 0.0.
    pub fn amount(
        &mut self,
        page: usize,
        line: Option<usize>,
        parsed: Result<f64, FieldError>,
    ) -> f64 {
        match parsed {
            Ok(v) => v,
            Err(e) => {
                self.push(ParseIssue::from_field(page, line, &e));
                0.0
            }
        }
    }

    /// Unwrap a date, recording the failure and yielding `None`.
    pub fn date(
        &mut self,
        page: usize,
        line: Option<usize>,
        parsed: Result<chrono::NaiveDate, FieldError>,
    ) -> Option<chrono::NaiveDate> {
        match parsed {
            Ok(d) => Some(d),
            Err(e) => {
                self.push(ParseIssue::from_field(page, line, &e));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_vec(self) -> Vec<ParseIssue> {
        self.issues
    }
}
