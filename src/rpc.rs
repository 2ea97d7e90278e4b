//! Cluster RPC access
//!
//! The pipeline talks to the cluster through the [`ClusterRpc`] trait so the
//! send/confirm state machine and the fee calculator can run against a mock
//! in tests. [`SolanaRpc`] is the production implementation over the
//! nonblocking `solana-client`.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError, VersionedTransaction},
};
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::RpcConfig;

/// RPC-layer error taxonomy
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Network/connection-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error response from the RPC node
    #[error("RPC response error: {0}")]
    Response(String),

    /// Unrecognized commitment level in configuration
    #[error("Invalid commitment level: {0}")]
    InvalidCommitment(String),
}

impl RpcError {
    /// Whether retrying the call might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Response(msg) => {
                let msg = msg.to_lowercase();
                ["timeout", "rate limit", "too many requests", "429", "502", "503", "504"]
                    .iter()
                    .any(|p| msg.contains(p))
            }
            Self::InvalidCommitment(_) => false,
        }
    }
}

impl From<solana_client::client_error::ClientError> for RpcError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        use solana_client::client_error::ClientErrorKind;
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
                Self::Transport(err.to_string())
            }
            _ => Self::Response(err.to_string()),
        }
    }
}

/// Raw simulation response, one step above the wire
#[derive(Debug, Clone)]
pub struct SimulationResponse {
    pub err: Option<TransactionError>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// One slot's worth of recent prioritization fee data
#[derive(Debug, Clone, Copy)]
pub struct PrioritizationFeeSample {
    pub slot: u64,
    pub micro_lamports: u64,
}

/// The cluster operations the pipeline needs.
///
/// Failures surface as [`RpcError`]; callers decide whether to retry based
/// on `is_retryable`.
#[async_trait]
pub trait ClusterRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// Broadcast a signed transaction. Node-side rebroadcast is disabled;
    /// the retry manager owns resubmission.
    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature, RpcError>;

    /// Status of a signature at the configured commitment.
    ///
    /// `None` means not yet observed at that commitment; `Some(Err(_))`
    /// means the transaction executed and failed on-chain.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError>;

    async fn simulate_legacy(&self, tx: &Transaction) -> Result<SimulationResponse, RpcError>;

    async fn simulate_versioned(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<SimulationResponse, RpcError>;

    async fn recent_prioritization_fees(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<PrioritizationFeeSample>, RpcError>;

    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError>;
}

/// Production [`ClusterRpc`] backed by a single endpoint
pub struct SolanaRpc {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaRpc {
    pub fn new(url: &str, timeout: Duration, commitment: &str) -> Result<Self, RpcError> {
        let commitment = CommitmentConfig::from_str(commitment)
            .map_err(|_| RpcError::InvalidCommitment(commitment.to_string()))?;
        Ok(Self {
            client: RpcClient::new_with_timeout_and_commitment(
                url.to_string(),
                timeout,
                commitment,
            ),
            commitment,
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self, RpcError> {
        Self::new(
            &config.url,
            Duration::from_secs(config.timeout_secs),
            &config.commitment,
        )
    }

    fn simulation_config(&self) -> RpcSimulateTransactionConfig {
        RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSimulateTransactionConfig::default()
        }
    }
}

#[async_trait]
impl ClusterRpc for SolanaRpc {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature, RpcError> {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            // The retry manager re-signs and resubmits on its own schedule
            max_retries: Some(0),
            min_context_slot: None,
        };
        Ok(self.client.send_transaction_with_config(tx, config).await?)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError> {
        let response = self.client.get_signature_statuses(&[*signature]).await?;
        let status = match response.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(None),
        };
        if !status.satisfies_commitment(self.commitment) {
            return Ok(None);
        }
        Ok(Some(match status.err {
            Some(err) => Err(err),
            None => Ok(()),
        }))
    }

    async fn simulate_legacy(&self, tx: &Transaction) -> Result<SimulationResponse, RpcError> {
        let response = self
            .client
            .simulate_transaction_with_config(tx, self.simulation_config())
            .await?;
        let value = response.value;
        Ok(SimulationResponse {
            err: value.err,
            logs: value.logs.unwrap_or_default(),
            units_consumed: value.units_consumed,
        })
    }

    async fn simulate_versioned(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<SimulationResponse, RpcError> {
        let response = self
            .client
            .simulate_transaction_with_config(tx, self.simulation_config())
            .await?;
        let value = response.value;
        Ok(SimulationResponse {
            err: value.err,
            logs: value.logs.unwrap_or_default(),
            units_consumed: value.units_consumed,
        })
    }

    async fn recent_prioritization_fees(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<PrioritizationFeeSample>, RpcError> {
        let fees = self.client.get_recent_prioritization_fees(addresses).await?;
        Ok(fees
            .into_iter()
            .map(|fee| PrioritizationFeeSample {
                slot: fee.slot,
                micro_lamports: fee.prioritization_fee,
            })
            .collect())
    }

    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.client.get_balance(pubkey).await?)
    }
}
