//! End-to-end pipeline tests: build -> simulate -> guard -> send

use std::sync::Arc;

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::TransactionError;

use crate::rpc::ClusterRpc;
use crate::test_utils::MockClusterRpc;
use crate::tx::instructions::sol_transfer;
use crate::tx::{
    ensure_sendable, PriorityFee, RetryManager, RetryOptions, TransactionBuilder,
    TransactionSimulator, TxError,
};
use crate::types::FeeSpeed;
use crate::wallet::WalletManager;

fn transfer_builder(rpc: Arc<dyn ClusterRpc>, wallet: &WalletManager) -> TransactionBuilder {
    let lamports = LAMPORTS_PER_SOL / 100; // 0.01 SOL
    TransactionBuilder::new(rpc)
        .fee_payer(wallet.pubkey())
        .instruction(sol_transfer(&wallet.pubkey(), &Pubkey::new_unique(), lamports).unwrap())
        .priority_fee(PriorityFee::Speed(FeeSpeed::Fast))
}

#[tokio::test]
async fn test_failed_simulation_blocks_send() {
    let mock = Arc::new(
        MockClusterRpc::new()
            .with_fee_samples(vec![1500, 1500])
            .with_simulation_error(TransactionError::InsufficientFundsForFee),
    );
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let wallet = WalletManager::from_keypair(Keypair::new());

    let built = transfer_builder(Arc::clone(&rpc), &wallet)
        .build(&wallet)
        .await
        .unwrap();
    let simulator = TransactionSimulator::new(Arc::clone(&rpc));
    let simulation = simulator.simulate(&built).await.unwrap();

    assert!(!simulation.success);
    assert!(simulation.error.is_some());
    // The guard refuses to send; nothing was ever broadcast
    assert!(matches!(
        ensure_sendable(&simulation),
        Err(TxError::SimulationFailed(_))
    ));
    assert!(mock.sent_signatures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clean_simulation_allows_send_to_confirmation() {
    let mock = Arc::new(
        MockClusterRpc::new()
            .with_fee_samples(vec![1500, 1500])
            .confirm_on_poll(2),
    );
    let rpc: Arc<dyn ClusterRpc> = mock.clone();
    let wallet = WalletManager::from_keypair(Keypair::new());

    let builder = transfer_builder(Arc::clone(&rpc), &wallet);
    let plan = builder.plan().await.unwrap();
    let built = builder.build(&wallet).await.unwrap();

    let simulator = TransactionSimulator::new(Arc::clone(&rpc));
    let simulation = simulator.simulate(&built).await.unwrap();
    assert!(simulation.success);
    assert_eq!(simulation.units_consumed, Some(150));
    ensure_sendable(&simulation).unwrap();

    let retry = RetryManager::new(rpc, RetryOptions::default());
    let outcome = retry.send_with_retry(&plan, &wallet, |_| {}).await.unwrap();
    assert_eq!(outcome.submissions, 1);
    assert_eq!(mock.sent_signatures().len(), 1);
}

#[tokio::test]
async fn test_legacy_and_versioned_paths_both_simulate() {
    let rpc: Arc<dyn ClusterRpc> = Arc::new(MockClusterRpc::new().with_fee_samples(vec![1500]));
    let wallet = WalletManager::from_keypair(Keypair::new());
    let simulator = TransactionSimulator::new(Arc::clone(&rpc));

    let legacy = transfer_builder(Arc::clone(&rpc), &wallet)
        .build(&wallet)
        .await
        .unwrap();
    assert!(simulator.simulate(&legacy).await.unwrap().success);

    let versioned = transfer_builder(Arc::clone(&rpc), &wallet)
        .version(crate::tx::TxVersion::V0)
        .build(&wallet)
        .await
        .unwrap();
    assert!(simulator.simulate(&versioned).await.unwrap().success);
}
