//! Transaction simulation
//!
//! Dry-runs a built transaction against cluster state and maps the cluster
//! response into a uniform [`SimulationResult`]. A simulation that reports
//! an execution error is a successful call with `success = false`; only
//! transport problems error out. Legacy and versioned transactions go
//! through distinct RPC paths.

use std::sync::Arc;
use tracing::debug;

use super::builder::BuiltTransaction;
use super::errors::TxError;
use crate::rpc::{ClusterRpc, SimulationResponse};
use crate::types::SimulationResult;
use solana_sdk::transaction::{Transaction, VersionedTransaction};

pub struct TransactionSimulator {
    rpc: Arc<dyn ClusterRpc>,
}

impl TransactionSimulator {
    pub fn new(rpc: Arc<dyn ClusterRpc>) -> Self {
        Self { rpc }
    }

    /// Simulate a built transaction, dispatching on its format
    pub async fn simulate(&self, tx: &BuiltTransaction) -> Result<SimulationResult, TxError> {
        match tx {
            BuiltTransaction::Legacy(tx) => self.simulate_legacy(tx).await,
            BuiltTransaction::Versioned(tx) => self.simulate_versioned(tx).await,
        }
    }

    pub async fn simulate_legacy(&self, tx: &Transaction) -> Result<SimulationResult, TxError> {
        let response = self.rpc.simulate_legacy(tx).await?;
        Ok(into_result(response))
    }

    pub async fn simulate_versioned(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<SimulationResult, TxError> {
        let response = self.rpc.simulate_versioned(tx).await?;
        Ok(into_result(response))
    }
}

fn into_result(response: SimulationResponse) -> SimulationResult {
    let error = response.err.map(|e| e.to_string());
    if let Some(err) = &error {
        debug!(error = %err, units = ?response.units_consumed, "simulation reported failure");
    }
    SimulationResult {
        success: error.is_none(),
        error,
        logs: response.logs,
        units_consumed: response.units_consumed,
    }
}

/// Send guard: a transaction whose simulation failed must not be broadcast
pub fn ensure_sendable(result: &SimulationResult) -> Result<(), TxError> {
    if result.success {
        return Ok(());
    }
    Err(TxError::SimulationFailed(
        result
            .error
            .clone()
            .unwrap_or_else(|| "simulation reported failure".to_string()),
    ))
}
