//! Test utilities
//!
//! A scripted mock of the cluster RPC for deterministic pipeline tests.
//! Signature-status responses pop from a queue (falling back to a
//! default), blockhashes are a deterministic distinct sequence, and every
//! broadcast signature is captured so tests can count resubmissions.
//!
//! Only compiled for tests or with the `test_utils` feature.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{
    hash::{hashv, Hash},
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError, VersionedTransaction},
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::rpc::{ClusterRpc, PrioritizationFeeSample, RpcError, SimulationResponse};

type StatusEntry = Option<Result<(), TransactionError>>;

pub struct MockClusterRpc {
    blockhash_counter: AtomicU64,
    status_calls: AtomicU64,
    status_script: Mutex<VecDeque<StatusEntry>>,
    status_errors: Mutex<std::collections::HashSet<u64>>,
    default_status: StatusEntry,
    sent: Mutex<Vec<Signature>>,
    fee_samples: Vec<PrioritizationFeeSample>,
    fail_fees: bool,
    simulation: SimulationResponse,
    balance: u64,
}

impl Default for MockClusterRpc {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterRpc {
    pub fn new() -> Self {
        Self {
            blockhash_counter: AtomicU64::new(0),
            status_calls: AtomicU64::new(0),
            status_script: Mutex::new(VecDeque::new()),
            status_errors: Mutex::new(std::collections::HashSet::new()),
            default_status: None,
            sent: Mutex::new(Vec::new()),
            fee_samples: Vec::new(),
            fail_fees: false,
            simulation: SimulationResponse {
                err: None,
                logs: vec!["Program 11111111111111111111111111111111 success".to_string()],
                units_consumed: Some(150),
            },
            balance: 1_000_000_000,
        }
    }

    /// Status polls return "not seen" until the nth call, which confirms
    pub fn confirm_on_poll(self, n: u64) -> Self {
        let mut script = VecDeque::new();
        for _ in 1..n {
            script.push_back(None);
        }
        script.push_back(Some(Ok(())));
        *self.status_script.lock() = script;
        self
    }

    /// Every status poll returns "not seen"
    pub fn never_confirm(self) -> Self {
        *self.status_script.lock() = VecDeque::new();
        self
    }

    /// The nth status call reports an on-chain execution error
    pub fn fail_on_poll(self, n: u64, err: TransactionError) -> Self {
        let mut script = VecDeque::new();
        for _ in 1..n {
            script.push_back(None);
        }
        script.push_back(Some(Err(err)));
        *self.status_script.lock() = script;
        self
    }

    /// Explicit per-call script; the default applies once it runs out
    pub fn with_status_script(self, script: Vec<StatusEntry>) -> Self {
        *self.status_script.lock() = script.into();
        self
    }

    /// The nth status call (1-based) fails at the transport level; the
    /// script is not consumed by the failed call.
    pub fn error_on_poll(self, n: u64) -> Self {
        self.status_errors.lock().insert(n);
        self
    }

    pub fn with_fee_samples(mut self, micro_lamports: Vec<u64>) -> Self {
        self.fee_samples = micro_lamports
            .into_iter()
            .enumerate()
            .map(|(i, fee)| PrioritizationFeeSample {
                slot: 1000 + i as u64,
                micro_lamports: fee,
            })
            .collect();
        self
    }

    pub fn with_fee_failure(mut self) -> Self {
        self.fail_fees = true;
        self
    }

    pub fn with_simulation(mut self, response: SimulationResponse) -> Self {
        self.simulation = response;
        self
    }

    pub fn with_simulation_error(mut self, err: TransactionError) -> Self {
        self.simulation = SimulationResponse {
            err: Some(err),
            logs: vec!["Program failed".to_string()],
            units_consumed: Some(200),
        };
        self
    }

    pub fn with_balance(mut self, lamports: u64) -> Self {
        self.balance = lamports;
        self
    }

    /// Every signature handed out by `send_transaction`, in order
    pub fn sent_signatures(&self) -> Vec<Signature> {
        self.sent.lock().clone()
    }

    pub fn status_call_count(&self) -> u64 {
        self.status_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClusterRpc for MockClusterRpc {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        let n = self.blockhash_counter.fetch_add(1, Ordering::Relaxed);
        Ok(hashv(&[b"mock-blockhash", &n.to_le_bytes()]))
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        _skip_preflight: bool,
    ) -> Result<Signature, RpcError> {
        let signature = tx
            .signatures
            .first()
            .copied()
            .ok_or_else(|| RpcError::Response("unsigned transaction".to_string()))?;
        self.sent.lock().push(signature);
        Ok(signature)
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError> {
        let call = self.status_calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.status_errors.lock().contains(&call) {
            return Err(RpcError::Transport("mock status poll failure".to_string()));
        }
        let scripted = self.status_script.lock().pop_front();
        Ok(match scripted {
            Some(entry) => entry,
            None => self.default_status.clone(),
        })
    }

    async fn simulate_legacy(&self, _tx: &Transaction) -> Result<SimulationResponse, RpcError> {
        Ok(self.simulation.clone())
    }

    async fn simulate_versioned(
        &self,
        _tx: &VersionedTransaction,
    ) -> Result<SimulationResponse, RpcError> {
        Ok(self.simulation.clone())
    }

    async fn recent_prioritization_fees(
        &self,
        _addresses: &[Pubkey],
    ) -> Result<Vec<PrioritizationFeeSample>, RpcError> {
        if self.fail_fees {
            return Err(RpcError::Transport("mock fee query failure".to_string()));
        }
        Ok(self.fee_samples.clone())
    }

    async fn balance(&self, _pubkey: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.balance)
    }
}
