//! Keyword categorization of transaction descriptions.
//!
//! Rules are tried in declaration order and the first keyword hit wins, so a
//! description matching several rules lands in the earliest one.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered category table plus the label used when nothing matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default)]
    pub rules: Vec<CategoryRule>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self {
            fallback: default_fallback(),
            rules,
        }
    }

    /// Table tuned on BPER current-account descriptions.
    pub fn bper() -> Self {
        Self::new(vec![
            CategoryRule::new("Affitto", &["affitto", "canone affitto", "fitto"]),
            CategoryRule::new("Stipendio", &["stipendio", "bonifico o/c", "bonifico sepa"]),
            CategoryRule::new("Utenze", &["italia power", "gas", "luce", "energia"]),
            CategoryRule::new("PayPal", &["paypal"]),
            CategoryRule::new(
                "Commissioni",
                &["commissioni", "canone mensile", "spese su prelievo"],
            ),
            CategoryRule::new("Prelievo", &["prel. atm", "prelievo atm"]),
            CategoryRule::new("Spesa Alimentari", &["supermercato", "conad"]),
            CategoryRule::new("Trasporti", &["atac", "trenitalia", "unicocampania"]),
            CategoryRule::new(
                "Ristorazione",
                &["bar", "caffetterie", "pizzeria", "ristorante"],
            ),
            CategoryRule::new("Salute", &["farmacia", "diagnostica"]),
            CategoryRule::new("Shopping", &["libraccio", "klarna"]),
            CategoryRule::new("Carburante", &["stazione energas"]),
            CategoryRule::new("Servizi", &["glovo", "sharenow"]),
        ])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|r| r.label.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::bper()
    }
}

#[derive(Debug, Clone)]
pub struct Categorizer {
    table: CategoryTable,
}

impl Categorizer {
    pub fn new(table: CategoryTable) -> Self {
        let rules = table
            .rules
            .into_iter()
            .map(|r| CategoryRule {
                label: r.label,
                keywords: r
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self {
            table: CategoryTable {
                fallback: table.fallback,
                rules,
            },
        }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn categorize(&self, description: &str) -> &str {
        let desc = description.to_lowercase();
        self.table
            .rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| desc.contains(k.as_str())))
            .map(|rule| rule.label.as_str())
            .unwrap_or(&self.table.fallback)
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(CategoryTable::bper())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_declared_rule_wins() {
        let c = Categorizer::new(CategoryTable::new(vec![
            CategoryRule::new("Salute", &["farmacia"]),
            CategoryRule::new("PayPal", &["paypal"]),
        ]));
        assert_eq!(c.categorize("Pagamento PayPal farmacia"), "Salute");
        assert_eq!(c.categorize("PAYPAL *EBAY"), "PayPal");
    }

    #[test]
    fn test_fallback() {
        let c = Categorizer::default();
        assert_eq!(c.categorize("BONIFICO ESTERO"), DEFAULT_FALLBACK);
        assert_eq!(c.categorize(""), DEFAULT_FALLBACK);
    }

    #[test]
    fn test_bper_table() {
        let c = Categorizer::default();
        assert_eq!(c.categorize("PAGAMENTO POS CONAD SUPERSTORE"), "Spesa Alimentari");
        assert_eq!(c.categorize("PREL. ATM BANCOMAT 1234"), "Prelievo");
        assert_eq!(c.categorize("ABBONAMENTO ATAC METREBUS"), "Trasporti");
        assert_eq!(c.categorize("CANONE AFFITTO MARZO"), "Affitto");
        assert_eq!(c.categorize("FARMACIA SAN CARLO"), "Salute");
    }

    #[test]
    fn test_keywords_are_case_insensitive_and_ordered_labels() {
        let table = CategoryTable::new(vec![CategoryRule::new("Caffè", &["BAR Sport"])]);
        let c = Categorizer::new(table);
        assert_eq!(c.categorize("pagamento bar sport milano"), "Caffè");
        let labels: Vec<&str> = c.table().labels().collect();
        assert_eq!(labels, vec!["Caffè", "Other"]);
    }

    #[test]
    fn test_table_from_toml_like_json() {
        let json = r#"{"rules":[{"label":"Casa","keywords":["ikea"]}]}"#;
        let table: CategoryTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.fallback, "Other");
        assert_eq!(Categorizer::new(table).categorize("IKEA ROMA"), "Casa");
    }
}
