//! Live-node tests for the session. Nothing is broadcast.
//!
//! Run with: cargo test -p muse-wallet --test live -- --ignored
//!
//! Requires a node at MUSE_NODE_URL (default: http://localhost:8090) and an
//! existing account named by MUSE_TEST_ACCOUNT (default: init0).

use muse_tx::Operation;
use muse_wallet::{Finalized, MuseConfig, Session};

fn config() -> MuseConfig {
    MuseConfig {
        node: std::env::var("MUSE_NODE_URL").unwrap_or_else(|_| "http://localhost:8090".to_string()),
        default_account: Some(std::env::var("MUSE_TEST_ACCOUNT").unwrap_or_else(|_| "init0".to_string())),
        unsigned: true,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_info() {
    let session = Session::connect(config()).expect("connect");
    let props = session.info().await.expect("info failed");
    assert!(props.head_block_number > 0);
}

#[tokio::test]
#[ignore]
async fn test_unsigned_upgrade_has_fees_and_signing_info() {
    let mut session = Session::connect(config()).expect("connect");
    let result = session.upgrade_account(None).await.expect("upgrade_account failed");
    let Finalized::Partial(partial) = result else {
        panic!("unsigned mode must return a partial transaction");
    };

    let tx = &partial.transaction;
    assert_eq!(tx.operations.len(), 1);
    assert!(matches!(tx.operations[0], Operation::AccountUpgrade(_)));
    assert!(tx.operations[0].fee().amount >= 0);
    assert!(tx.signatures.is_empty());
    assert_eq!(partial.signing_info.chain_id.len(), 64);
    assert!(!partial.signing_info.missing_signatures.is_empty());
    println!("{}", muse_tx::offline::export_partial_tx(&partial).expect("export"));
}
