mod common;

use anchor_lang::prelude::Pubkey;
use pool_client::sdk::{BatchItem, PoolSdk, WalletSession};
use pool_client::{ClientError, ErrorCode};
use serde_json::json;

use common::FakeProgram;

fn pools(n: usize) -> Vec<Pubkey> {
    (0..n).map(|_| Pubkey::new_unique()).collect()
}

#[tokio::test]
async fn one_failing_item_yields_one_failure_record() {
    let pools = pools(5);
    let program = FakeProgram::new(
        vec![pools[3]],
        json!({ "err": { "InstructionError": [0, { "Custom": 6049 }] } }),
    );
    let sdk = PoolSdk::new(program, WalletSession::connected(Pubkey::new_unique()));

    let mut calls = Vec::new();
    let mut progress = |item: &BatchItem| calls.push(item.index);
    let items = sdk.claim_refunds(&pools, Some(&mut progress)).await.unwrap();

    assert_eq!(calls, vec![0, 1, 2, 3, 4]);
    assert_eq!(items.len(), 5);
    let failures: Vec<usize> = items.iter().filter(|i| !i.is_ok()).map(|i| i.index).collect();
    assert_eq!(failures, vec![3]);
    for (item, pool) in items.iter().zip(&pools) {
        assert_eq!(item.pool, *pool);
    }

    let error = items[3].outcome.as_ref().unwrap_err();
    assert_eq!(error.program_error().map(|e| e.error), Some(ErrorCode::NotParticipant));
    assert_eq!(sdk.program().sent_count(), 5);
}

#[tokio::test]
async fn every_item_can_fail_without_aborting() {
    let pools = pools(3);
    let program = FakeProgram::new(pools.clone(), json!({ "message": "blockhash not found" }));
    let sdk = PoolSdk::new(program, WalletSession::connected(Pubkey::new_unique()));

    let items = sdk.claim_rents(&pools, None).await.unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| matches!(i.outcome, Err(ClientError::Transaction { .. }))));
}

#[tokio::test]
async fn batch_without_wallet_makes_no_calls() {
    let sdk = PoolSdk::new(FakeProgram::healthy(), WalletSession::new());
    let mut calls = 0;
    let mut progress = |_: &BatchItem| calls += 1;
    let err = sdk.claim_refunds(&pools(2), Some(&mut progress)).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated));
    assert_eq!(calls, 0);
    assert_eq!(sdk.program().sent_count(), 0);
}

#[tokio::test]
async fn disconnect_gates_later_calls() {
    let session = WalletSession::connected(Pubkey::new_unique());
    let sdk = PoolSdk::new(FakeProgram::healthy(), session.clone());
    assert!(sdk.claim_rent(Pubkey::new_unique()).await.is_ok());

    session.disconnect();
    assert!(matches!(
        sdk.select_winner(Pubkey::new_unique()).await,
        Err(ClientError::Unauthenticated)
    ));
    assert_eq!(sdk.program().sent_count(), 1);
}
