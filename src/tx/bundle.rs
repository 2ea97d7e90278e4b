//! Jito atomic bundle submission
//!
//! A bundle is an ordered list of 1-5 signed transactions that execute
//! atomically in a single slot. The tip transfer must be the last
//! instruction of the last transaction; [`JitoBundler::tip_instruction`]
//! builds one against a well-known tip account.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::seq::SliceRandom;
use serde_json::json;
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, system_instruction,
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::errors::TxError;
use crate::config::JitoConfig;

/// Bundles larger than this are rejected by the block engine
pub const MAX_BUNDLE_TRANSACTIONS: usize = 5;

/// Mainnet tip accounts published by Jito; one is picked at random per tip
const TIP_ACCOUNTS: [&str; 8] = [
    "96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5",
    "HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe",
    "Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY",
    "ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49",
    "DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh",
    "ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt",
    "DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL",
    "3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT",
];

/// One member of a bundle
#[derive(Debug, Clone)]
pub struct BundleTransaction {
    /// Caller-facing label used in logs and results
    pub label: String,
    pub transaction: VersionedTransaction,
}

/// Status of a previously submitted bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleStatus {
    /// Queued but not yet observed on-chain
    Pending,
    /// Landed on-chain in the given slot
    Landed { slot: u64 },
    /// Dropped or failed
    Failed { reason: String },
    /// The block engine has no record; it may have expired
    Unknown,
}

impl BundleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Landed { .. } | Self::Failed { .. })
    }

    pub fn is_landed(&self) -> bool {
        matches!(self, Self::Landed { .. })
    }
}

impl std::fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Landed { slot } => write!(f, "landed (slot {slot})"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Aggregate outcome of a co-submitted transaction group
#[derive(Debug, Clone)]
pub struct JitoBundleResult {
    pub bundle_id: String,
    pub landed: bool,
    pub signatures: Vec<Signature>,
    pub tip_lamports: u64,
    pub error: Option<String>,
}

/// Submits signed transaction groups to a Jito block engine over JSON-RPC
pub struct JitoBundler {
    endpoint: String,
    http: reqwest::Client,
    tip_lamports: u64,
    poll_interval: Duration,
    status_timeout: Duration,
}

impl JitoBundler {
    pub fn new(endpoint: impl Into<String>, tip_lamports: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
            tip_lamports,
            poll_interval: Duration::from_millis(1_000),
            status_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &JitoConfig) -> Self {
        Self::new(config.block_engine_url.clone(), config.tip_lamports)
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    pub fn tip_lamports(&self) -> u64 {
        self.tip_lamports
    }

    /// Tip transfer to a randomly chosen tip account. Must be appended as
    /// the last instruction of the bundle's last transaction.
    pub fn tip_instruction(&self, payer: &Pubkey) -> Result<Instruction, TxError> {
        let account = TIP_ACCOUNTS
            .choose(&mut rand::thread_rng())
            .and_then(|s| Pubkey::from_str(s).ok())
            .ok_or_else(|| TxError::bundle("no usable tip account"))?;
        Ok(system_instruction::transfer(
            payer,
            &account,
            self.tip_lamports,
        ))
    }

    /// Submit a bundle and poll it to a terminal (or unknown) status
    pub async fn submit(&self, txs: &[BundleTransaction]) -> Result<JitoBundleResult, TxError> {
        if txs.is_empty() || txs.len() > MAX_BUNDLE_TRANSACTIONS {
            return Err(TxError::bundle(format!(
                "bundle must contain 1-{} transactions, got {}",
                MAX_BUNDLE_TRANSACTIONS,
                txs.len()
            )));
        }

        let mut encoded = Vec::with_capacity(txs.len());
        for tx in txs {
            let bytes = bincode::serialize(&tx.transaction)
                .map_err(|e| TxError::bundle(format!("serialize {}: {e}", tx.label)))?;
            encoded.push(BASE64.encode(bytes));
        }

        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendBundle",
            "params": [encoded, {"encoding": "base64"}],
        });
        let body: serde_json::Value = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| TxError::bundle(format!("block engine request: {e}")))?
            .json()
            .await
            .map_err(|e| TxError::bundle(format!("block engine response: {e}")))?;

        if let Some(err) = body.get("error") {
            return Err(TxError::bundle(format!("sendBundle rejected: {err}")));
        }
        let bundle_id = body
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| TxError::bundle("sendBundle response missing bundle id"))?
            .to_string();
        debug!(%bundle_id, txs = txs.len(), "bundle accepted by block engine");

        let signatures: Vec<Signature> = txs
            .iter()
            .filter_map(|tx| tx.transaction.signatures.first().copied())
            .collect();

        let status = self.poll_status(&bundle_id).await;
        let error = match &status {
            BundleStatus::Failed { reason } => Some(reason.clone()),
            BundleStatus::Unknown => Some("bundle fate unknown after timeout".to_string()),
            _ => None,
        };
        Ok(JitoBundleResult {
            landed: status.is_landed(),
            bundle_id,
            signatures,
            tip_lamports: self.tip_lamports,
            error,
        })
    }

    async fn poll_status(&self, bundle_id: &str) -> BundleStatus {
        let deadline = Instant::now() + self.status_timeout;
        loop {
            match self.fetch_status(bundle_id).await {
                Ok(status) if status.is_terminal() => return status,
                Ok(_) => {}
                Err(err) => warn!(%bundle_id, error = %err, "bundle status poll failed"),
            }
            if Instant::now() >= deadline {
                return BundleStatus::Unknown;
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn fetch_status(&self, bundle_id: &str) -> Result<BundleStatus, TxError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBundleStatuses",
            "params": [[bundle_id]],
        });
        let body: serde_json::Value = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| TxError::bundle(format!("status request: {e}")))?
            .json()
            .await
            .map_err(|e| TxError::bundle(format!("status response: {e}")))?;

        let entry = match body.pointer("/result/value/0") {
            Some(entry) if !entry.is_null() => entry,
            _ => return Ok(BundleStatus::Pending),
        };
        if let Some(err) = entry.get("err") {
            // "Ok" encodes success; anything else is an execution failure
            if !err.is_null() && err.get("Ok").is_none() {
                return Ok(BundleStatus::Failed {
                    reason: err.to_string(),
                });
            }
        }
        match entry.get("confirmation_status").and_then(|s| s.as_str()) {
            Some("confirmed") | Some("finalized") => Ok(BundleStatus::Landed {
                slot: entry.get("slot").and_then(|s| s.as_u64()).unwrap_or(0),
            }),
            _ => Ok(BundleStatus::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal_classification() {
        assert!(!BundleStatus::Pending.is_terminal());
        assert!(BundleStatus::Landed { slot: 42 }.is_terminal());
        assert!(BundleStatus::Failed {
            reason: "sim fail".into()
        }
        .is_terminal());
        assert!(!BundleStatus::Unknown.is_terminal());
        assert!(BundleStatus::Landed { slot: 42 }.is_landed());
        assert!(!BundleStatus::Unknown.is_landed());
    }

    #[test]
    fn test_tip_accounts_parse() {
        for account in TIP_ACCOUNTS {
            assert!(Pubkey::from_str(account).is_ok(), "bad tip account {account}");
        }
    }

    #[tokio::test]
    async fn test_empty_bundle_rejected() {
        let bundler = JitoBundler::new("http://localhost:0", 10_000);
        let err = bundler.submit(&[]).await.err().unwrap();
        assert!(matches!(err, TxError::Bundle(_)));
    }
}
