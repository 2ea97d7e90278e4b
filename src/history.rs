//! Transaction history store
//!
//! A JSON-file-backed record of sends: load-all on open, mutate in memory,
//! save-all on every change. A history item's signature is unique and
//! immutable once recorded; only its status and error fields mutate
//! afterwards. Concurrent processes race last-writer-wins on the file,
//! which is accepted for a local tool.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::TxStatus;

/// What a history entry was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    SolTransfer,
    TokenTransfer,
    Bundle,
    Other,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SolTransfer => "sol_transfer",
            Self::TokenTransfer => "token_transfer",
            Self::Bundle => "bundle",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// One persisted send record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHistoryItem {
    pub signature: String,
    pub kind: TxKind,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
    pub amount_lamports: Option<u64>,
    pub description: String,
    pub error: Option<String>,
}

impl TransactionHistoryItem {
    /// New record at send time
    pub fn new(
        signature: impl Into<String>,
        kind: TxKind,
        amount_lamports: Option<u64>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            signature: signature.into(),
            kind,
            status: TxStatus::Sent,
            timestamp: Utc::now(),
            amount_lamports,
            description: description.into(),
            error: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Signature {0} already recorded")]
    Duplicate(String),

    #[error("Signature {0} not found in history")]
    NotFound(String),
}

/// File-backed history store
pub struct HistoryStore {
    path: PathBuf,
    items: Mutex<Vec<TransactionHistoryItem>>,
}

impl HistoryStore {
    /// Open (or create) the store at `path`. A missing file is an empty
    /// history, not an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Record a new send. Signatures are unique; recording a known one is
    /// an error rather than an overwrite.
    pub fn record(&self, item: TransactionHistoryItem) -> Result<(), HistoryError> {
        let mut items = self.items.lock();
        if items.iter().any(|i| i.signature == item.signature) {
            return Err(HistoryError::Duplicate(item.signature));
        }
        items.push(item);
        self.persist(&items)
    }

    /// Mutate the status (and error) of an existing record. Everything
    /// else on the item is immutable after `record`.
    pub fn update_status(
        &self,
        signature: &str,
        status: TxStatus,
        error: Option<String>,
    ) -> Result<(), HistoryError> {
        let mut items = self.items.lock();
        let item = items
            .iter_mut()
            .find(|i| i.signature == signature)
            .ok_or_else(|| HistoryError::NotFound(signature.to_string()))?;
        item.status = status;
        item.error = error;
        self.persist(&items)
    }

    /// All records in insertion order
    pub fn items(&self) -> Vec<TransactionHistoryItem> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drop every record and persist the empty history
    pub fn clear(&self) -> Result<(), HistoryError> {
        let mut items = self.items.lock();
        items.clear();
        self.persist(&items)
    }

    fn persist(&self, items: &[TransactionHistoryItem]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
