//! Send/confirm state machine tests
//!
//! All timing runs under tokio paused time, so polls and backoffs are
//! deterministic and instant.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::TransactionError;

use crate::rpc::ClusterRpc;
use crate::test_utils::MockClusterRpc;
use crate::tx::instructions::sol_transfer;
use crate::tx::{PriorityFee, RetryManager, RetryOptions, TransactionBuilder, TransactionPlan, TxError};
use crate::types::TxStatus;
use crate::wallet::WalletManager;

async fn make_plan(rpc: Arc<dyn ClusterRpc>, wallet: &WalletManager) -> TransactionPlan {
    TransactionBuilder::new(rpc)
        .fee_payer(wallet.pubkey())
        .instruction(sol_transfer(&wallet.pubkey(), &Pubkey::new_unique(), 10_000).unwrap())
        .priority_fee(PriorityFee::Manual {
            micro_lamports: 1_000,
        })
        .plan()
        .await
        .unwrap()
}

fn fast_options(max_retries: u32) -> RetryOptions {
    RetryOptions {
        max_retries,
        poll_interval: Duration::from_millis(10),
        confirmation_timeout: Duration::from_millis(25),
        backoff_base: Duration::from_millis(5),
        backoff_max: Duration::from_millis(40),
        skip_preflight: true,
    }
}

#[tokio::test(start_paused = true)]
async fn test_state_sequence_confirm_on_nth_poll() {
    let mock = Arc::new(MockClusterRpc::new().confirm_on_poll(3));
    let wallet = WalletManager::from_keypair(Keypair::new());
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let plan = make_plan(Arc::clone(&rpc), &wallet).await;

    let retry = RetryManager::new(rpc, RetryOptions::default());
    let mut observed: Vec<(TxStatus, u32)> = Vec::new();
    let outcome = retry
        .send_with_retry(&plan, &wallet, |u| observed.push((u.status, u.attempt)))
        .await
        .unwrap();

    assert_eq!(outcome.submissions, 1);
    // Exactly Sending, Sent, Confirming x3, Confirmed; nothing skipped,
    // nothing reordered, nothing duplicated.
    assert_eq!(
        observed,
        vec![
            (TxStatus::Sending, 1),
            (TxStatus::Sent, 1),
            (TxStatus::Confirming, 1),
            (TxStatus::Confirming, 2),
            (TxStatus::Confirming, 3),
            (TxStatus::Confirmed, 1),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_yields_one_distinct_signature_per_submission() {
    let max_retries = 2;
    let mock = Arc::new(MockClusterRpc::new().never_confirm());
    let wallet = WalletManager::from_keypair(Keypair::new());
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let plan = make_plan(Arc::clone(&rpc), &wallet).await;

    let retry = RetryManager::new(rpc, fast_options(max_retries));
    let mut observed: Vec<TxStatus> = Vec::new();
    let err = retry
        .send_with_retry(&plan, &wallet, |u| observed.push(u.status))
        .await
        .unwrap_err();

    match err {
        TxError::TimedOut {
            signature,
            submissions,
        } => {
            assert!(signature.is_some());
            assert_eq!(submissions, max_retries + 1);
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }

    // Each resubmission re-signs against a fresh blockhash, so every
    // broadcast carries a new signature.
    let sent = mock.sent_signatures();
    assert_eq!(sent.len(), (max_retries + 1) as usize);
    let distinct: HashSet<_> = sent.iter().collect();
    assert_eq!(distinct.len(), sent.len());

    assert_eq!(observed.last(), Some(&TxStatus::TimedOut));
    assert_eq!(
        observed.iter().filter(|s| **s == TxStatus::Sent).count(),
        (max_retries + 1) as usize
    );
    assert_eq!(
        observed.iter().filter(|s| **s == TxStatus::Sending).count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_on_chain_failure_is_terminal_and_never_resubmitted() {
    let mock = Arc::new(
        MockClusterRpc::new().fail_on_poll(2, TransactionError::InsufficientFundsForFee),
    );
    let wallet = WalletManager::from_keypair(Keypair::new());
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let plan = make_plan(Arc::clone(&rpc), &wallet).await;

    let retry = RetryManager::new(rpc, fast_options(3));
    let mut observed: Vec<TxStatus> = Vec::new();
    let err = retry
        .send_with_retry(&plan, &wallet, |u| observed.push(u.status))
        .await
        .unwrap_err();

    assert!(matches!(err, TxError::OnChain { .. }));
    assert_eq!(observed.last(), Some(&TxStatus::Failed));
    // An executed-but-failed transaction is not rebroadcast
    assert_eq!(mock.sent_signatures().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_confirmation_honored_on_final_check() {
    // Never confirmed inside either confirmation window; the status only
    // flips on the final re-check after retries are exhausted.
    let mock = Arc::new(MockClusterRpc::new().with_status_script(vec![
        None,
        None,
        Some(Ok(())),
    ]));
    let wallet = WalletManager::from_keypair(Keypair::new());
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let plan = make_plan(Arc::clone(&rpc), &wallet).await;

    let options = RetryOptions {
        max_retries: 1,
        // zero-width window: exactly one poll per submission
        confirmation_timeout: Duration::ZERO,
        poll_interval: Duration::from_millis(10),
        backoff_base: Duration::from_millis(5),
        backoff_max: Duration::from_millis(10),
        skip_preflight: true,
    };
    let retry = RetryManager::new(rpc, options);
    let mut observed: Vec<TxStatus> = Vec::new();
    let outcome = retry
        .send_with_retry(&plan, &wallet, |u| observed.push(u.status))
        .await
        .unwrap();

    assert_eq!(outcome.submissions, 2);
    assert_eq!(observed.last(), Some(&TxStatus::Confirmed));
    assert_eq!(mock.status_call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_errors_ride_out_the_window() {
    // First poll errors at the transport level, the next scripted entry
    // confirms; the cycle must absorb the hiccup instead of aborting.
    let mock = Arc::new(MockClusterRpc::new().confirm_on_poll(2).error_on_poll(1));
    let wallet = WalletManager::from_keypair(Keypair::new());
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let plan = make_plan(Arc::clone(&rpc), &wallet).await;

    let retry = RetryManager::new(rpc, RetryOptions::default());
    let outcome = retry
        .send_with_retry(&plan, &wallet, |_| {})
        .await
        .unwrap();
    assert_eq!(outcome.submissions, 1);
}
