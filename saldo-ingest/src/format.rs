//! Pattern tables for one statement family.
//!
//! Supporting another layout means building another `StatementFormat`; the
//! segmenter, reconstructor and assembler only ever see this table.

use regex::Regex;

use crate::error::IngestError;

#[derive(Debug, Clone)]
pub struct StatementFormat {
    pub name: &'static str,

    // transaction table
    pub table_header: Regex,
    pub table_footers: Vec<Regex>,
    /// Groups: booking date, value date (both DD/MM/YY)
    pub transaction_start: Regex,
    pub balance_row: Regex,
    pub money_token: Regex,
    pub reference_suffix: Regex,

    // account metadata
    pub iban: Regex,
    pub bic: Regex,
    pub branch: Regex,
    pub holder_end: Regex,

    // summary
    pub opening_balance: Regex,
    pub closing_balance: Regex,
    pub total_inflow: Regex,
    pub total_outflow: Regex,

    // auxiliary sections
    pub isee_average: Regex,
    pub isee_year_end: Regex,
    pub interest_marker: &'static str,
    pub interest_row: Regex,
    pub interest_total: Regex,
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, IngestError> {
    Regex::new(pattern).map_err(|source| IngestError::InvalidPattern { name, source })
}

impl StatementFormat {
    /// BPER current-account statement ("estratto conto").
    pub fn bper() -> Result<Self, IngestError> {
        Ok(Self {
            name: "bper",
            table_header: compile(
                "table_header",
                r"DATA\s+VALUTA\s+USCITE\s+ENTRATE\s+DESCRIZIONE",
            )?,
            table_footers: vec![
                compile("footer_isee", r"Dati da utilizzare")?,
                compile("footer_form", r"Mod\.\s*05\.13\.0011")?,
                compile("footer_page", r"^\s*Pagina\s+\d+")?,
            ],
            transaction_start: compile(
                "transaction_start",
                r"^\s*(\d{2}/\d{2}/\d{2})\s+(\d{2}/\d{2}/\d{2})\b",
            )?,
            balance_row: compile("balance_row", r"^\s*\d{2}/\d{2}/\d{2}\s+[\d.,]+\s+SALDO\b")?,
            money_token: compile("money_token", r"\b(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}\b")?,
            reference_suffix: compile("reference_suffix", r"-RIF\.\s*\d+/\d+$")?,

            iban: compile(
                "iban",
                r"IBAN\s+([A-Z]{2}\s*\d{2}\s*[A-Z]\s*\d{5}\s*\d{5}\s*\d+)",
            )?,
            bic: compile("bic", r"BIC\s+([A-Z0-9\s]+XXX)")?,
            branch: compile("branch", r"(?:Filiale|presso)\s+([A-Z\-]+)")?,
            holder_end: compile("holder_end", r"Riepilogo|Coordinate")?,

            opening_balance: compile(
                "opening_balance",
                r"Saldo iniziale al\s*(\d{2}/\d{2}/\d{4})\s*([\d.,]+)\s*€",
            )?,
            closing_balance: compile(
                "closing_balance",
                r"Saldo finale al\s*(\d{2}/\d{2}/\d{4})\s*([\d.,]+)\s*€",
            )?,
            total_inflow: compile("total_inflow", r"Totale Entrate\s*([\d.,]+)\s*€")?,
            total_outflow: compile("total_outflow", r"Totale Uscite\s*([\d.,]+)\s*€")?,

            isee_average: compile(
                "isee_average",
                r"(?s)Dati da utilizzare.*?ISEE.*?Giacenza media.*?([\d.,]+)\s*€",
            )?,
            isee_year_end: compile("isee_year_end", r"Saldo al\s*31/12/(\d{4})\s*([\d.,]+)\s*€")?,
            interest_marker: "INTERESSI CREDITORI MATURATI",
            interest_row: compile(
                "interest_row",
                r"(\d{2}/\d{2}/\d{2})\s+([\d.,]+)\s+([\d.,]+)\s+([\d.,]+)",
            )?,
            interest_total: compile("interest_total", r"TOTALE NETTO\s+([\d.,]+)")?,
        })
    }

    pub fn is_footer(&self, line: &str) -> bool {
        self.table_footers.iter().any(|re| re.is_match(line))
    }
}
