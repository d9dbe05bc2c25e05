//! Ledger persistence boundary.
//!
//! The importer only talks to [`LedgerStore`]. [`MemoryLedger`] keeps
//! everything in memory and can round-trip through a JSON file.

use chrono::NaiveDate;
use saldo_core::{CategoryId, LedgerCategory, LedgerEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("category already exists: {0}")]
    DuplicateCategory(String),

    #[error("unknown category id {0}")]
    UnknownCategory(CategoryId),

    #[error("invalid entry {id}: {reason}")]
    InvalidEntry { id: String, reason: String },

    #[error("reading/writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait LedgerStore {
    fn categories(&self) -> Result<Vec<LedgerCategory>, StoreError>;

    fn create_category(&mut self, name: &str) -> Result<LedgerCategory, StoreError>;

    /// Opening balance recorded when the account was first seen
    fn account_opening(&self, account: &str) -> Result<Option<f64>, StoreError>;

    fn open_account(&mut self, account: &str, opening: f64) -> Result<(), StoreError>;

    fn transactions(&self, account: &str) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Entries of `account` with `from <= date <= to`
    fn transactions_between(
        &self,
        account: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    fn insert_transaction(&mut self, entry: LedgerEntry) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    #[serde(default)]
    categories: Vec<LedgerCategory>,
    #[serde(default)]
    accounts: BTreeMap<String, f64>,
    #[serde(default)]
    entries: Vec<LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&s)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    fn next_category_id(&self) -> CategoryId {
        self.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }
}

impl LedgerStore for MemoryLedger {
    fn categories(&self) -> Result<Vec<LedgerCategory>, StoreError> {
        Ok(self.categories.clone())
    }

    fn create_category(&mut self, name: &str) -> Result<LedgerCategory, StoreError> {
        if self.categories.iter().any(|c| c.name == name) {
            return Err(StoreError::DuplicateCategory(name.to_string()));
        }
        let category = LedgerCategory {
            id: self.next_category_id(),
            name: name.to_string(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    fn account_opening(&self, account: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.accounts.get(account).copied())
    }

    fn open_account(&mut self, account: &str, opening: f64) -> Result<(), StoreError> {
        self.accounts.insert(account.to_string(), opening);
        Ok(())
    }

    fn transactions(&self, account: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.account == account)
            .cloned()
            .collect())
    }

    fn transactions_between(
        &self,
        account: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.account == account && e.date >= from && e.date <= to)
            .cloned()
            .collect())
    }

    fn insert_transaction(&mut self, entry: LedgerEntry) -> Result<(), StoreError> {
        if entry.amount == 0.0 {
            return Err(StoreError::InvalidEntry {
                id: entry.id,
                reason: "amount must not be zero".to_string(),
            });
        }
        if entry.description.trim().is_empty() {
            return Err(StoreError::InvalidEntry {
                id: entry.id,
                reason: "description is required".to_string(),
            });
        }
        if !self.categories.iter().any(|c| c.id == entry.category_id) {
            return Err(StoreError::UnknownCategory(entry.category_id));
        }
        self.entries.push(entry);
        Ok(())
    }
}
