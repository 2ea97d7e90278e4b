//! Send/confirm state machine
//!
//! Drives a transaction from broadcast to a terminal state:
//!
//! ```text
//! Idle -> Sending -> Sent -> Confirming -> Confirmed
//!                               |             (terminal success)
//!                               +-> Failed    (on-chain error, terminal)
//!                               +-> TimedOut  (retries exhausted, terminal)
//! ```
//!
//! A confirmation window that elapses with retries remaining triggers a
//! backoff delay, a fresh blockhash, and a re-signed resubmission carrying
//! a new signature; the old signature leaves active tracking. An on-chain
//! failure is never resubmitted. Before `TimedOut` is declared the last
//! signature's status is checked once more, so a transaction that landed
//! late is still reported as confirmed.

use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::builder::{assemble_signed, TransactionPlan};
use super::errors::TxError;
use crate::config::RetryConfig;
use crate::rpc::ClusterRpc;
use crate::types::{TransactionUpdate, TxStatus};
use crate::wallet::TransactionSigner;
use solana_sdk::signature::Signature;
use std::time::Duration;

/// Retry/confirmation tuning. All timing knobs are explicit configuration,
/// not hardcoded constants.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Resubmissions allowed after the first send; total submissions is
    /// `max_retries + 1`
    pub max_retries: u32,
    /// Interval between signature status polls
    pub poll_interval: Duration,
    /// Confirmation window per submission
    pub confirmation_timeout: Duration,
    /// Base backoff delay before the first resubmission; doubles per retry
    pub backoff_base: Duration,
    /// Backoff delay cap
    pub backoff_max: Duration,
    /// Skip preflight simulation on broadcast
    pub skip_preflight: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(30),
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(4),
            skip_preflight: true,
        }
    }
}

impl From<&RetryConfig> for RetryOptions {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            poll_interval: config.poll_interval(),
            confirmation_timeout: config.confirmation_timeout(),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            skip_preflight: config.skip_preflight,
        }
    }
}

impl RetryOptions {
    /// Delay before resubmission number `resubmission` (1-based),
    /// exponential with a cap
    pub fn backoff_delay(&self, resubmission: u32) -> Duration {
        let exponent = resubmission.saturating_sub(1).min(20);
        let delay = self.backoff_base.saturating_mul(1u32 << exponent);
        delay.min(self.backoff_max)
    }
}

/// Successful send cycle summary
#[derive(Debug, Clone, Copy)]
pub struct SendOutcome {
    /// Signature that confirmed
    pub signature: Signature,
    /// Total submissions performed (1 = no resubmission needed)
    pub submissions: u32,
}

/// Drives the send/confirm state machine over a [`ClusterRpc`]
pub struct RetryManager {
    rpc: Arc<dyn ClusterRpc>,
    options: RetryOptions,
}

impl RetryManager {
    pub fn new(rpc: Arc<dyn ClusterRpc>, options: RetryOptions) -> Self {
        Self { rpc, options }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Send a planned transaction and poll it to a terminal state.
    ///
    /// `on_update` observes every state transition in order: `Sending`
    /// once, `Sent` per submission (with that submission's signature),
    /// `Confirming` per poll (attempt = poll number within the current
    /// window), then exactly one terminal update.
    ///
    /// There is no mid-send cancellation; the exits are confirmation,
    /// on-chain failure, a propagated RPC error, or retry exhaustion.
    pub async fn send_with_retry<F>(
        &self,
        plan: &TransactionPlan,
        signer: &dyn TransactionSigner,
        on_update: F,
    ) -> Result<SendOutcome, TxError>
    where
        F: FnMut(TransactionUpdate) + Send,
    {
        let correlation_id = Uuid::new_v4();
        let span = tracing::info_span!("send_cycle", %correlation_id);
        self.send_inner(plan, signer, on_update).instrument(span).await
    }

    async fn send_inner<F>(
        &self,
        plan: &TransactionPlan,
        signer: &dyn TransactionSigner,
        mut on_update: F,
    ) -> Result<SendOutcome, TxError>
    where
        F: FnMut(TransactionUpdate) + Send,
    {
        let mut submissions: u32 = 0;
        let mut last_signature: Option<Signature> = None;

        on_update(TransactionUpdate::new(TxStatus::Sending, 1));

        loop {
            if submissions > 0 {
                let delay = self.options.backoff_delay(submissions);
                debug!(
                    resubmission = submissions,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before resubmission"
                );
                sleep(delay).await;
            }

            let blockhash = self.rpc.latest_blockhash().await?;
            let built = assemble_signed(plan, blockhash, signer)?;
            let wire = built.to_versioned();
            let signature = self
                .rpc
                .send_transaction(&wire, self.options.skip_preflight)
                .await?;
            submissions += 1;
            // The new signature supersedes the previous one; only the
            // latest submission is tracked from here on.
            last_signature = Some(signature);
            info!(%signature, submission = submissions, "transaction broadcast");
            on_update(
                TransactionUpdate::new(TxStatus::Sent, submissions).with_signature(signature),
            );

            let deadline = Instant::now() + self.options.confirmation_timeout;
            let mut polls: u32 = 0;
            loop {
                polls += 1;
                on_update(
                    TransactionUpdate::new(TxStatus::Confirming, polls)
                        .with_signature(signature),
                );
                match self.rpc.signature_status(&signature).await {
                    Ok(Some(Ok(()))) => {
                        info!(%signature, polls, "transaction confirmed");
                        on_update(
                            TransactionUpdate::new(TxStatus::Confirmed, submissions)
                                .with_signature(signature),
                        );
                        return Ok(SendOutcome {
                            signature,
                            submissions,
                        });
                    }
                    Ok(Some(Err(tx_err))) => {
                        // Executed but failed: the fee is spent, so a
                        // resubmission would only fail again.
                        let error = tx_err.to_string();
                        warn!(%signature, error = %error, "transaction failed on-chain");
                        on_update(
                            TransactionUpdate::new(TxStatus::Failed, submissions)
                                .with_signature(signature)
                                .with_error(error.clone()),
                        );
                        return Err(TxError::OnChain { signature, error });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        // Transient poll failures ride out the window
                        warn!(%signature, error = %err, "status poll failed");
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                sleep(self.options.poll_interval).await;
            }

            if submissions > self.options.max_retries {
                break;
            }
            debug!(
                submission = submissions,
                "confirmation window elapsed; resubmitting with fresh blockhash"
            );
        }

        // Retries exhausted. The last submission may still have landed:
        // check its fate once before declaring it unknown.
        let signature = match last_signature {
            Some(sig) => sig,
            None => {
                return Err(TxError::TimedOut {
                    signature: None,
                    submissions,
                })
            }
        };
        match self.rpc.signature_status(&signature).await {
            Ok(Some(Ok(()))) => {
                info!(%signature, "late confirmation observed on final check");
                on_update(
                    TransactionUpdate::new(TxStatus::Confirmed, submissions)
                        .with_signature(signature),
                );
                Ok(SendOutcome {
                    signature,
                    submissions,
                })
            }
            Ok(Some(Err(tx_err))) => {
                let error = tx_err.to_string();
                on_update(
                    TransactionUpdate::new(TxStatus::Failed, submissions)
                        .with_signature(signature)
                        .with_error(error.clone()),
                );
                Err(TxError::OnChain { signature, error })
            }
            Ok(None) | Err(_) => {
                warn!(%signature, submissions, "confirmation timed out; fate unknown");
                on_update(
                    TransactionUpdate::new(TxStatus::TimedOut, submissions)
                        .with_signature(signature),
                );
                Err(TxError::TimedOut {
                    signature: Some(signature),
                    submissions,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let options = RetryOptions {
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(1),
            ..RetryOptions::default()
        };
        assert_eq!(options.backoff_delay(1), Duration::from_millis(250));
        assert_eq!(options.backoff_delay(2), Duration::from_millis(500));
        assert_eq!(options.backoff_delay(3), Duration::from_secs(1));
        assert_eq!(options.backoff_delay(10), Duration::from_secs(1));
    }

    #[test]
    fn test_options_from_config() {
        let config = RetryConfig::default();
        let options = RetryOptions::from(&config);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.poll_interval, Duration::from_millis(500));
        assert!(options.skip_preflight);
    }
}
