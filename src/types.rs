//! Common types shared across the transaction pipeline and search tools

use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a transaction send cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// No send in progress
    Idle,
    /// Broadcasting to the cluster
    Sending,
    /// Broadcast accepted, signature known
    Sent,
    /// Polling signature status
    Confirming,
    /// Confirmed with no on-chain error (terminal)
    Confirmed,
    /// Executed on-chain but the transaction itself failed (terminal)
    Failed,
    /// Retry budget exhausted without confirmation (terminal)
    TimedOut,
}

impl TxStatus {
    /// Terminal states end a send cycle; no further updates follow them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Progress update emitted during a send cycle.
///
/// `attempt` is the poll number within the current confirmation cycle for
/// `Confirming` updates, and the submission number (1-based) for all other
/// states. Updates are emitted strictly in transition order.
#[derive(Debug, Clone)]
pub struct TransactionUpdate {
    pub status: TxStatus,
    pub signature: Option<Signature>,
    pub error: Option<String>,
    pub attempt: u32,
}

impl TransactionUpdate {
    pub fn new(status: TxStatus, attempt: u32) -> Self {
        Self {
            status,
            signature: None,
            error: None,
            attempt,
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Speed tier for priority fee selection, ordered cheapest to fastest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSpeed {
    Slow,
    Normal,
    Fast,
    Turbo,
}

impl FeeSpeed {
    pub const ALL: [FeeSpeed; 4] = [Self::Slow, Self::Normal, Self::Fast, Self::Turbo];
}

impl fmt::Display for FeeSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Turbo => "turbo",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for FeeSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            "turbo" => Ok(Self::Turbo),
            other => Err(format!("unknown fee speed: {other}")),
        }
    }
}

/// Where a fee estimate came from.
///
/// `Fallback` means the cluster query failed or returned no usable samples
/// and the static defaults are in effect; callers should treat it as
/// best-effort, not authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSource {
    Cluster,
    Fallback,
}

/// Base priority fee derived from recent cluster fee history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityFeeEstimate {
    pub base_micro_lamports: u64,
    pub source: FeeSource,
}

/// One speed tier of the fee recommendation table
#[derive(Debug, Clone, Serialize)]
pub struct FeeRecommendation {
    pub speed: FeeSpeed,
    pub micro_lamports: u64,
    pub estimated_time: &'static str,
    pub description: &'static str,
}

/// Outcome of a dry-run against cluster state.
///
/// A failed simulation is a successful call with `success = false`; only
/// transport problems surface as errors.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub success: bool,
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// Throughput snapshot emitted by a running brute-force search
#[derive(Debug, Clone, Copy)]
pub struct SearchProgress {
    /// Attempts performed so far across all workers
    pub attempts: u64,
    /// Wall-clock time since the search started
    pub elapsed: Duration,
    /// Attempts per second over the whole run
    pub rate: f64,
}

impl SearchProgress {
    pub fn new(attempts: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 { attempts as f64 / secs } else { 0.0 };
        Self {
            attempts,
            elapsed,
            rate,
        }
    }
}
