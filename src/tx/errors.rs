//! Error types for the transaction pipeline

use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::rpc::RpcError;

/// Error type covering the transaction lifecycle: planning, signing,
/// simulation, broadcast, and confirmation.
#[derive(Debug, Error)]
pub enum TxError {
    /// Input rejected before any network call (missing fee payer,
    /// empty instruction list, non-positive amount)
    #[error("Validation error: {0}")]
    Validation(String),

    /// RPC communication failure
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Failed to sign or assemble the transaction
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Message compilation failed (v0 account resolution)
    #[error("Message compile error: {0}")]
    Compile(String),

    /// A preflight simulation reported failure; the send guard refuses
    /// to broadcast such a transaction
    #[error("Simulation failed: {0}")]
    SimulationFailed(String),

    /// The transaction executed on-chain and failed there.
    /// Never resubmitted: the fee was paid and the fate is known.
    #[error("Transaction {signature} failed on-chain: {error}")]
    OnChain { signature: Signature, error: String },

    /// Retry budget exhausted without observing a confirmation.
    /// The last signature may still land; its fate is unknown.
    #[error("Confirmation timed out after {submissions} submission(s)")]
    TimedOut {
        signature: Option<Signature>,
        submissions: u32,
    },

    /// Bundle preparation or submission failure
    #[error("Bundle error: {0}")]
    Bundle(String),
}

impl TxError {
    /// Whether retrying the operation might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(err) => err.is_retryable(),
            Self::Validation(_)
            | Self::Signing(_)
            | Self::Compile(_)
            | Self::SimulationFailed(_)
            | Self::OnChain { .. }
            | Self::TimedOut { .. }
            | Self::Bundle(_) => false,
        }
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Rpc(_) => "rpc",
            Self::Signing(_) => "signing",
            Self::Compile(_) => "compile",
            Self::SimulationFailed(_) => "simulation",
            Self::OnChain { .. } => "onchain",
            Self::TimedOut { .. } => "timeout",
            Self::Bundle(_) => "bundle",
        }
    }

    /// Signature of the transaction involved, where one exists
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::OnChain { signature, .. } => Some(*signature),
            Self::TimedOut { signature, .. } => *signature,
            _ => None,
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Signing(reason.into())
    }

    pub fn bundle(reason: impl Into<String>) -> Self {
        Self::Bundle(reason.into())
    }
}
