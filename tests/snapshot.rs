use std::sync::Arc;

use alloy::primitives::{Address, U256, address};
use dex_market::{
    SnapshotAssembler, TokenRegistry,
    testing::{self, MemoryStore, MockChain, QueryKind},
    types::{NATIVE_TOKEN, Order, Side, SnapshotRequest, Trade, TransferKind},
};
use fastnum::{UD256, decimal::Context, udec256};

const TOKEN: Address = address!("0x00000000000000000000000000000000000000aa");
const MAKER: Address = address!("0x00000000000000000000000000000000000000b1");
const USER: Address = address!("0x00000000000000000000000000000000000000c1");
const OTHER: Address = address!("0x00000000000000000000000000000000000000c2");

const ETHER: u64 = 1_000_000_000_000_000_000;

fn ether(value: u64) -> U256 {
    U256::from(value) * U256::from(ETHER)
}

fn decimal(value: &serde_json::Value) -> UD256 {
    UD256::from_str(value.as_str().expect("decimal string"), Context::default())
        .expect("valid decimal")
}

/// Market of a 2-decimals token: one buy and one sell trade, a deposit in
/// each token and both sides of the book with an expired order each.
fn market() -> MemoryStore {
    // maker gives 100.00 TOKEN for 200 ether
    let buy = Trade {
        amount_get: ether(200),
        ..testing::trade(TOKEN, 10_000, NATIVE_TOKEN, 0, MAKER, USER, 10)
    };
    // maker gives 110 ether for 50.00 TOKEN
    let sell = Trade {
        amount_give: ether(110),
        ..testing::trade(NATIVE_TOKEN, 0, TOKEN, 5_000, OTHER, MAKER, 11)
    };
    MemoryStore::new()
        .with_trades([buy, sell])
        .with_transfers([
            testing::transfer(NATIVE_TOKEN, USER, ETHER, ETHER, 5),
            testing::transfer(TOKEN, USER, 2_550, 2_550, 6),
            testing::transfer(TOKEN, OTHER, 100, 100, 7),
        ])
        .with_orders([
            testing::order(NATIVE_TOKEN, 3 * ETHER, TOKEN, 100, 200),
            testing::order(NATIVE_TOKEN, 5 * ETHER, TOKEN, 100, 50),
            testing::order(TOKEN, 100, NATIVE_TOKEN, 4 * ETHER, 300),
            testing::order(TOKEN, 100, NATIVE_TOKEN, ETHER, 99),
        ])
}

fn assembler(chain: MockChain, store: MemoryStore) -> SnapshotAssembler<MockChain, MemoryStore> {
    SnapshotAssembler::new(Arc::new(TokenRegistry::new(chain)), store)
}

/// Tests a snapshot personalized for a user, down to its wire format.
#[tokio::test]
async fn test_user_snapshot() {
    let chain = MockChain::new(100).with_decimals(TOKEN, 2);
    let assembler = assembler(chain, market());
    let request = SnapshotRequest::new(TOKEN.to_string(), Some(USER.to_string()));
    let snapshot = assembler.assemble(&request).await.unwrap();

    // most recent first
    let sides: Vec<_> = snapshot.trades.iter().map(|t| t.side).collect();
    assert_eq!(sides, vec![Side::Sell, Side::Buy]);
    let (sell, buy) = (&snapshot.trades[0], &snapshot.trades[1]);
    assert_eq!(buy.price, udec256!(2));
    assert_eq!(buy.amount, udec256!(100));
    assert_eq!(buy.amount_base, udec256!(200));
    assert_eq!((buy.buyer, buy.seller), (MAKER, USER));
    assert_eq!(sell.price, udec256!(2.2));
    assert_eq!(sell.amount, udec256!(50));
    assert_eq!((sell.buyer, sell.seller), (MAKER, OTHER));

    assert_eq!(snapshot.my_trades.len(), 1);
    assert_eq!(snapshot.my_trades[0].side, Side::Buy);

    assert_eq!(snapshot.my_funds.len(), 2);
    assert_eq!(snapshot.my_funds[0].token_addr, TOKEN);
    assert_eq!(snapshot.my_funds[0].amount, udec256!(25.5));
    assert_eq!(snapshot.my_funds[1].token_addr, NATIVE_TOKEN);
    assert_eq!(snapshot.my_funds[1].balance, udec256!(1));
    assert!(
        snapshot
            .my_funds
            .iter()
            .all(|f| f.kind.kind() == Some(TransferKind::Deposit))
    );

    assert_eq!(snapshot.orders.buys.len(), 1);
    assert_eq!(snapshot.orders.buys[0].price, udec256!(3));
    assert_eq!(snapshot.orders.sells.len(), 1);
    assert_eq!(snapshot.orders.sells[0].price, udec256!(4));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["trades"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&json["trades"][0]["price"]), udec256!(2.2));
    assert_eq!(json["trades"][0]["price"], "2.2000000000000000");
    assert_eq!(json["trades"][1]["side"], "buy");
    assert_eq!(json["myTrades"].as_array().unwrap().len(), 1);
    assert_eq!(json["myFunds"].as_array().unwrap().len(), 2);
    assert_eq!(json["orders"]["buys"].as_array().unwrap().len(), 1);
    assert_eq!(json["orders"]["sells"].as_array().unwrap().len(), 1);
}

/// Tests that only public market data is queried without a user.
#[tokio::test]
async fn test_anonymous_snapshot() {
    let chain = MockChain::new(100).with_decimals(TOKEN, 2);
    let assembler = assembler(chain, market());
    let snapshot = assembler
        .assemble(&SnapshotRequest::new(TOKEN.to_string(), None))
        .await
        .unwrap();

    assert_eq!(snapshot.trades.len(), 2);
    assert!(snapshot.my_trades.is_empty());
    assert!(snapshot.my_funds.is_empty());
    assert_eq!(assembler.store().query_count(QueryKind::Trades), 1);
    assert_eq!(assembler.store().query_count(QueryKind::Transfers), 0);
    assert_eq!(assembler.store().query_count(QueryKind::Orders), 2);
}

/// Tests that a malformed user address is treated as absent.
#[tokio::test]
async fn test_malformed_user_is_ignored() {
    let chain = MockChain::new(100).with_decimals(TOKEN, 2);
    let assembler = assembler(chain, market());
    let request = SnapshotRequest::new(TOKEN.to_string(), Some("0x1234".to_string()));
    let snapshot = assembler.assemble(&request).await.unwrap();

    assert_eq!(snapshot.trades.len(), 2);
    assert!(snapshot.my_trades.is_empty());
    assert_eq!(assembler.store().query_count(QueryKind::Transfers), 0);
}

/// Tests that a missing or malformed token yields an empty snapshot without
/// any store or chain access.
#[tokio::test]
async fn test_invalid_token_yields_empty_snapshot() {
    for token in [None, Some(""), Some("0xzz"), Some("00000000000000000000000000000000000000aa00")] {
        let chain = MockChain::new(100).with_decimals(TOKEN, 2);
        let assembler = assembler(chain.clone(), market());
        let request = SnapshotRequest {
            token: token.map(str::to_string),
            user: Some(USER.to_string()),
        };
        let snapshot = assembler.assemble(&request).await.unwrap();

        assert!(snapshot.is_empty(), "{token:?}");
        assert_eq!(assembler.store().total_queries(), 0);
        assert_eq!(chain.head_count(), 0);
        assert_eq!(chain.call_count(), 0);
    }
}

/// Tests that token decimals are resolved once for all snapshots sharing
/// the registry.
#[tokio::test]
async fn test_shared_registry_resolves_once() {
    let chain = MockChain::new(100).with_decimals(TOKEN, 2);
    let registry = Arc::new(TokenRegistry::new(chain.clone()));
    let first = SnapshotAssembler::new(registry.clone(), market());
    let second = SnapshotAssembler::new(registry.clone(), market());
    let request = SnapshotRequest::new(TOKEN.to_string(), Some(USER.to_string()));

    let (a, b) = futures::try_join!(first.assemble(&request), second.assemble(&request)).unwrap();
    assert_eq!(a.trades.len(), b.trades.len());
    assert_eq!(registry.cached(&TOKEN), Some(2));
    assert_eq!(
        first.assemble(&request).await.unwrap().trades[1].price,
        udec256!(2)
    );
    second.assemble(&request).await.unwrap();
    assert_eq!(chain.call_count_for(&TOKEN), 1);
}

/// Tests that a store failure fails the whole snapshot.
#[tokio::test]
async fn test_store_failure_fails_snapshot() {
    let chain = MockChain::new(100).with_decimals(TOKEN, 2);
    let assembler = assembler(chain, market().failing(QueryKind::Transfers));
    let request = SnapshotRequest::new(TOKEN.to_string(), Some(USER.to_string()));
    assert!(assembler.assemble(&request).await.is_err());

    // Transfers are not queried for anonymous snapshots
    let snapshot = assembler
        .assemble(&SnapshotRequest::new(TOKEN.to_string(), None))
        .await
        .unwrap();
    assert_eq!(snapshot.trades.len(), 2);
}

/// Tests prices of a one-order book with raw amounts scaled by decimals.
#[tokio::test]
async fn test_order_book_prices() {
    let chain = MockChain::new(100).with_decimals(TOKEN, 2);
    // 200 ether for 100.00 TOKEN, and 50.00 TOKEN for 110 ether
    let store = MemoryStore::new().with_orders([
        Order {
            amount_give: ether(200),
            ..testing::order(NATIVE_TOKEN, 0, TOKEN, 10_000, 1_000)
        },
        Order {
            amount_get: ether(110),
            ..testing::order(TOKEN, 5_000, NATIVE_TOKEN, 0, 1_000)
        },
    ]);
    let snapshot = assembler(chain, store)
        .assemble(&SnapshotRequest::new(TOKEN.to_string(), None))
        .await
        .unwrap();

    assert_eq!(snapshot.orders.buys.len(), 1);
    assert_eq!(snapshot.orders.sells.len(), 1);
    let (buy, sell) = (&snapshot.orders.buys[0], &snapshot.orders.sells[0]);
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(buy.price, udec256!(2.00));
    assert_eq!(buy.eth_available_volume, udec256!(100));
    assert_eq!(sell.side, Side::Sell);
    assert_eq!(sell.price, udec256!(2.20));
    assert_eq!(sell.eth_available_volume, udec256!(50));
    assert_eq!(sell.eth_available_volume_base, udec256!(110));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(decimal(&json["orders"]["buys"][0]["price"]), udec256!(2));
    assert_eq!(decimal(&json["orders"]["sells"][0]["price"]), udec256!(2.2));
    assert_eq!(json["orders"]["sells"][0]["side"], "sell");
}
