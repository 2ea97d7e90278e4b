//! Jito bundler tests against a mocked block engine

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::rpc::ClusterRpc;
use crate::test_utils::MockClusterRpc;
use crate::tx::instructions::sol_transfer;
use crate::tx::{BundleTransaction, JitoBundler, PriorityFee, TransactionBuilder, TxError, TxVersion};
use crate::wallet::WalletManager;

async fn signed_bundle_tx(label: &str) -> BundleTransaction {
    let rpc: Arc<dyn ClusterRpc> = Arc::new(MockClusterRpc::new());
    let wallet = WalletManager::from_keypair(Keypair::new());
    let built = TransactionBuilder::new(rpc)
        .fee_payer(wallet.pubkey())
        .instruction(sol_transfer(&wallet.pubkey(), &Pubkey::new_unique(), 1_000).unwrap())
        .priority_fee(PriorityFee::Manual { micro_lamports: 100 })
        .version(TxVersion::V0)
        .build(&wallet)
        .await
        .unwrap();
    BundleTransaction {
        label: label.to_string(),
        transaction: built.to_versioned(),
    }
}

#[tokio::test]
async fn test_bundle_lands() {
    let mut server = mockito::Server::new_async().await;
    let send_mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "sendBundle"})))
        .with_body(json!({"jsonrpc": "2.0", "result": "bundle-123", "id": 1}).to_string())
        .create_async()
        .await;
    let status_mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "getBundleStatuses"})))
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "result": {
                    "context": {"slot": 12345},
                    "value": [{
                        "bundle_id": "bundle-123",
                        "transactions": [],
                        "slot": 12345,
                        "confirmation_status": "finalized",
                        "err": {"Ok": null}
                    }]
                },
                "id": 1
            })
            .to_string(),
        )
        .create_async()
        .await;

    let bundler = JitoBundler::new(server.url(), 5_000)
        .poll_interval(Duration::from_millis(10))
        .status_timeout(Duration::from_secs(5));
    let tx = signed_bundle_tx("transfer").await;
    let result = bundler.submit(std::slice::from_ref(&tx)).await.unwrap();

    assert_eq!(result.bundle_id, "bundle-123");
    assert!(result.landed);
    assert_eq!(result.tip_lamports, 5_000);
    assert_eq!(result.signatures, vec![tx.transaction.signatures[0]]);
    assert!(result.error.is_none());
    send_mock.assert_async().await;
    status_mock.assert_async().await;
}

#[tokio::test]
async fn test_bundle_rejected_by_engine() {
    let mut server = mockito::Server::new_async().await;
    let _reject_mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "sendBundle"})))
        .with_body(
            json!({"jsonrpc": "2.0", "error": {"code": -32602, "message": "bundle too large"}, "id": 1})
                .to_string(),
        )
        .create_async()
        .await;

    let bundler = JitoBundler::new(server.url(), 5_000);
    let tx = signed_bundle_tx("transfer").await;
    let err = bundler.submit(&[tx]).await.unwrap_err();
    assert!(matches!(err, TxError::Bundle(_)));
    assert!(err.to_string().contains("bundle too large"));
}

#[tokio::test]
async fn test_oversized_bundle_rejected_locally() {
    let bundler = JitoBundler::new("http://localhost:0", 5_000);
    let mut txs = Vec::new();
    for i in 0..6 {
        txs.push(signed_bundle_tx(&format!("tx-{i}")).await);
    }
    let err = bundler.submit(&txs).await.unwrap_err();
    assert!(matches!(err, TxError::Bundle(_)));
}

#[tokio::test]
async fn test_tip_instruction_targets_known_account() {
    let bundler = JitoBundler::new("http://localhost:0", 7_500);
    let payer = Pubkey::new_unique();
    let tip = bundler.tip_instruction(&payer).unwrap();
    assert_eq!(tip.program_id, solana_sdk::system_program::id());
    assert_eq!(tip.accounts[0].pubkey, payer);
}
