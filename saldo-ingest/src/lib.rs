//! saldo-ingest: bank-statement ingestion from extracted page text.
//!
//! Pipeline per statement: [`segmenter`] finds the transaction table on each
//! page, [`reconstructor`] rebuilds records from its lines, [`categorizer`]
//! suggests a category, [`assembler`] orders everything and adds the account,
//! summary, ISEE and interest sections, [`statistics`] closes the document.

pub mod assembler;
pub mod categorizer;
pub mod error;
pub mod fields;
pub mod format;
pub mod reconstructor;
pub mod segmenter;
pub mod statistics;
pub mod types;

pub use assembler::{ParseOptions, StatementParser, TextSource};
pub use categorizer::{Categorizer, CategoryRule, CategoryTable};
pub use error::{FieldError, IngestError, IssueKind, ParseIssue};
pub use format::StatementFormat;
pub use types::{
    AccountHolder, AccountInfo, BalanceEntry, CategoryStats, Direction, InterestEntry,
    InterestSection, IseeInfo, PageText, StatementDocument, StatementStatistics, StatementSummary,
    TransactionRecord,
};
