//! Transaction builder tests

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::rpc::ClusterRpc;
use crate::test_utils::MockClusterRpc;
use crate::tx::instructions::{
    decode_compute_unit_limit, decode_compute_unit_price, sol_transfer,
};
use crate::tx::{assemble_signed, BuiltTransaction, PriorityFee, TransactionBuilder, TxError, TxVersion};
use crate::types::FeeSpeed;
use crate::wallet::WalletManager;

fn mock_rpc() -> Arc<dyn ClusterRpc> {
    Arc::new(MockClusterRpc::new())
}

fn transfer_builder(rpc: Arc<dyn ClusterRpc>, wallet: &WalletManager) -> TransactionBuilder {
    TransactionBuilder::new(rpc)
        .fee_payer(wallet.pubkey())
        .instruction(sol_transfer(&wallet.pubkey(), &Pubkey::new_unique(), 5_000).unwrap())
}

#[tokio::test]
async fn test_manual_fee_decodes_to_exact_value() {
    let wallet = WalletManager::from_keypair(Keypair::new());
    let plan = transfer_builder(mock_rpc(), &wallet)
        .priority_fee(PriorityFee::Manual {
            micro_lamports: 7_777,
        })
        .compute_unit_limit(300_000)
        .plan()
        .await
        .unwrap();

    // limit, price, then the payload in caller order
    assert_eq!(plan.instructions.len(), 3);
    assert_eq!(decode_compute_unit_limit(&plan.instructions[0]), Some(300_000));
    assert_eq!(decode_compute_unit_price(&plan.instructions[1]), Some(7_777));
    assert_eq!(
        plan.instructions[2].program_id,
        solana_sdk::system_program::id()
    );
    assert_eq!(plan.priority_fee_micro_lamports, 7_777);
}

#[tokio::test]
async fn test_speed_fee_resolves_from_cluster_samples() {
    // Non-zero samples sorted: [1000, 2000, 3000, 4000]; p75 picks 3000
    let rpc: Arc<dyn ClusterRpc> = Arc::new(
        MockClusterRpc::new().with_fee_samples(vec![0, 3000, 1000, 4000, 2000]),
    );
    let wallet = WalletManager::from_keypair(Keypair::new());
    let plan = transfer_builder(rpc, &wallet)
        .priority_fee(PriorityFee::Speed(FeeSpeed::Fast))
        .plan()
        .await
        .unwrap();
    assert_eq!(plan.priority_fee_micro_lamports, 6_000);
}

#[tokio::test]
async fn test_speed_fee_falls_back_on_rpc_failure() {
    let rpc: Arc<dyn ClusterRpc> = Arc::new(MockClusterRpc::new().with_fee_failure());
    let wallet = WalletManager::from_keypair(Keypair::new());
    let plan = transfer_builder(rpc, &wallet)
        .priority_fee(PriorityFee::Speed(FeeSpeed::Normal))
        .plan()
        .await
        .unwrap();
    assert_eq!(plan.priority_fee_micro_lamports, 1_000);
}

#[tokio::test]
async fn test_missing_fee_payer_rejected() {
    let err = TransactionBuilder::new(mock_rpc())
        .instruction(
            sol_transfer(&Pubkey::new_unique(), &Pubkey::new_unique(), 1).unwrap(),
        )
        .plan()
        .await
        .unwrap_err();
    assert!(matches!(err, TxError::Validation(_)));
}

#[tokio::test]
async fn test_empty_instruction_list_rejected() {
    let err = TransactionBuilder::new(mock_rpc())
        .fee_payer(Pubkey::new_unique())
        .plan()
        .await
        .unwrap_err();
    assert!(matches!(err, TxError::Validation(_)));
}

#[tokio::test]
async fn test_build_legacy_sets_payer_and_blockhash() {
    let wallet = WalletManager::from_keypair(Keypair::new());
    let built = transfer_builder(mock_rpc(), &wallet)
        .build(&wallet)
        .await
        .unwrap();

    match built {
        BuiltTransaction::Legacy(tx) => {
            assert_eq!(tx.signatures.len(), 1);
            assert_eq!(tx.message.account_keys[0], wallet.pubkey());
            assert_ne!(tx.message.recent_blockhash, solana_sdk::hash::Hash::default());
            assert!(tx.verify().is_ok());
        }
        BuiltTransaction::Versioned(_) => panic!("expected legacy"),
    }
}

#[tokio::test]
async fn test_build_versioned_signs_v0_message() {
    let wallet = WalletManager::from_keypair(Keypair::new());
    let built = transfer_builder(mock_rpc(), &wallet)
        .version(TxVersion::V0)
        .build(&wallet)
        .await
        .unwrap();

    match built {
        BuiltTransaction::Versioned(tx) => {
            assert_eq!(tx.signatures.len(), 1);
            let serialized = tx.message.serialize();
            assert!(tx.signatures[0].verify(wallet.pubkey().as_ref(), &serialized));
        }
        BuiltTransaction::Legacy(_) => panic!("expected versioned"),
    }
}

#[tokio::test]
async fn test_signer_must_match_fee_payer() {
    let wallet = WalletManager::from_keypair(Keypair::new());
    let other = WalletManager::from_keypair(Keypair::new());
    let plan = transfer_builder(mock_rpc(), &wallet).plan().await.unwrap();
    let err = assemble_signed(&plan, solana_sdk::hash::Hash::new_unique(), &other).unwrap_err();
    assert!(matches!(err, TxError::Signing(_)));
}
