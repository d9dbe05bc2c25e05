use anyhow::{Context, Result};
use saldo_finance::DEFAULT_TOLERANCE;
use saldo_ingest::categorizer::DEFAULT_FALLBACK;
use saldo_ingest::{CategoryRule, CategoryTable, ParseOptions, StatementFormat, StatementParser};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_saldo_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserSection,
    #[serde(default)]
    pub reconcile: ReconcileSection,
    /// Ordered keyword rules; the first matching rule wins
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserSection {
    #[serde(flatten)]
    pub options: ParseOptions,
    /// Label for descriptions no rule matches
    #[serde(default = "default_fallback")]
    pub fallback_category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSection {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_categories() -> Vec<CategoryRule> {
    CategoryTable::bper().rules
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for ParserSection {
    fn default() -> Self {
        Self {
            options: ParseOptions::default(),
            fallback_category: default_fallback(),
        }
    }
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parser: ParserSection::default(),
            reconcile: ReconcileSection::default(),
            categories: default_categories(),
        }
    }
}

impl Config {
    pub fn category_table(&self) -> CategoryTable {
        CategoryTable {
            fallback: self.parser.fallback_category.clone(),
            rules: self.categories.clone(),
        }
    }

    /// Parser for the BPER layout with this config's categories and options.
    pub fn statement_parser(&self, strict: bool) -> Result<StatementParser> {
        let mut options = self.parser.options.clone();
        options.strict |= strict;
        let format = StatementFormat::bper().context("compile statement format")?;
        Ok(StatementParser::new(format, self.category_table(), options))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_saldo_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
