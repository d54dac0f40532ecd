//! In-memory test doubles and record builders.
//!
//! [`MockChain`] answers `decimals()` calls from a configured table and counts
//! every call, [`MemoryStore`] evaluates store queries over in-memory records
//! with the same filtering, ranking and limits as the database and counts
//! issued queries.
//!

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use alloy::primitives::{Address, Bytes, TxHash, U256, keccak256};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{
    chain::ChainReader,
    error::{Result, SnapshotError},
    store::{self, MarketStore, OrderQuery, TradeQuery, TransferQuery},
    types::{self, BlockNumber, Order, Trade, Transfer, TransferKind},
};

const BLOCK_TIME_SEC: i64 = 12;

/// Chain with a fixed head block and scripted contract call outputs.
#[derive(Clone, Debug, Default)]
pub struct MockChain {
    head: Arc<AtomicUsize>,
    head_fails: Arc<AtomicBool>,
    outputs: Arc<DashMap<Address, Vec<u8>>>,
    calls: Arc<DashMap<Address, usize>>,
    head_calls: Arc<AtomicUsize>,
}

impl MockChain {
    pub fn new(head: BlockNumber) -> Self {
        let chain = Self::default();
        chain.set_head(head);
        chain
    }

    /// Makes `decimals()` of the token return `decimals` as a proper ABI word.
    pub fn with_decimals(self, token: Address, decimals: u8) -> Self {
        self.with_call_output(token, U256::from(decimals).to_be_bytes::<32>().to_vec())
    }

    /// Makes any call to the token return `output` as is.
    pub fn with_call_output(self, token: Address, output: Vec<u8>) -> Self {
        self.outputs.insert(token, output);
        self
    }

    /// Makes head block queries fail.
    pub fn with_failing_head(self) -> Self {
        self.head_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.head.store(head as usize, Ordering::SeqCst);
    }

    /// Number of contract calls issued to all addresses.
    pub fn call_count(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Number of contract calls issued to the address.
    pub fn call_count_for(&self, to: &Address) -> usize {
        self.calls.get(to).map(|c| *c).unwrap_or_default()
    }

    /// Number of head block queries.
    pub fn head_count(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }
}

impl ChainReader for MockChain {
    async fn block_number(&self) -> Result<u64> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if self.head_fails.load(Ordering::SeqCst) {
            return Err(SnapshotError::Transport("connection refused".to_string()));
        }
        Ok(self.head.load(Ordering::SeqCst) as u64)
    }

    async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes> {
        *self.calls.entry(to).or_default() += 1;
        self.outputs
            .get(&to)
            .map(|output| Bytes::from(output.clone()))
            .ok_or_else(|| SnapshotError::Transport("execution reverted".to_string()))
    }
}

/// Kind of store query, for failure injection and counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Trades,
    Transfers,
    Orders,
}

/// Store over in-memory records.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    trades: Vec<Trade>,
    transfers: Vec<Transfer>,
    orders: Vec<Order>,
    failing: Option<QueryKind>,
    queries: Arc<DashMap<QueryKind, usize>>,
    order_queries: Arc<Mutex<Vec<OrderQuery>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trades(mut self, trades: impl IntoIterator<Item = Trade>) -> Self {
        self.trades.extend(trades);
        self
    }

    pub fn with_transfers(mut self, transfers: impl IntoIterator<Item = Transfer>) -> Self {
        self.transfers.extend(transfers);
        self
    }

    pub fn with_orders(mut self, orders: impl IntoIterator<Item = Order>) -> Self {
        self.orders.extend(orders);
        self
    }

    /// Makes all queries of the kind fail.
    pub fn failing(mut self, kind: QueryKind) -> Self {
        self.failing = Some(kind);
        self
    }

    /// Number of queries of the kind issued so far.
    pub fn query_count(&self, kind: QueryKind) -> usize {
        self.queries.get(&kind).map(|c| *c).unwrap_or_default()
    }

    /// Total number of queries issued so far.
    pub fn total_queries(&self) -> usize {
        self.queries.iter().map(|c| *c.value()).sum()
    }

    /// Order queries issued so far.
    pub fn order_queries(&self) -> Vec<OrderQuery> {
        self.order_queries.lock().unwrap().clone()
    }

    fn record(&self, kind: QueryKind) -> Result<()> {
        *self.queries.entry(kind).or_default() += 1;
        if self.failing == Some(kind) {
            return Err(SnapshotError::Store(format!("{kind:?} query timed out")));
        }
        Ok(())
    }
}

impl MarketStore for MemoryStore {
    async fn trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        self.record(QueryKind::Trades)?;
        let mut trades: Vec<_> = self
            .trades
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        trades.sort_by(|a, b| (b.block_number, b.date).cmp(&(a.block_number, a.date)));
        trades.truncate(query.limit);
        Ok(trades)
    }

    async fn transfers(&self, query: &TransferQuery) -> Result<Vec<Transfer>> {
        self.record(QueryKind::Transfers)?;
        let mut transfers: Vec<_> = self
            .transfers
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        transfers.sort_by(|a, b| (b.block_number, b.date).cmp(&(a.block_number, a.date)));
        transfers.truncate(query.limit);
        Ok(transfers)
    }

    async fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        self.record(QueryKind::Orders)?;
        self.order_queries.lock().unwrap().push(query.clone());
        let mut orders: Vec<_> = self
            .orders
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        store::rank_orders(&mut orders, query.rank);
        orders.truncate(query.limit);
        Ok(orders)
    }
}

/// Parses an address, panicking if it is malformed.
pub fn parse(value: &str) -> Address {
    types::parse_address(value).expect("well-formed address")
}

/// Date of the block, assuming fixed block time since the epoch.
pub fn block_date(block: BlockNumber) -> DateTime<Utc> {
    DateTime::from_timestamp(block as i64 * BLOCK_TIME_SEC, 0).expect("block date in range")
}

fn tx_hash(seed: impl AsRef<[u8]>) -> TxHash {
    keccak256(seed)
}

/// On-chain order (no signature) by a fixed maker.
pub fn order(
    token_give: Address,
    amount_give: u64,
    token_get: Address,
    amount_get: u64,
    expires: BlockNumber,
) -> Order {
    let signature = tx_hash(
        format!("{token_give}{amount_give}{token_get}{amount_get}{expires}").as_bytes(),
    );
    Order {
        user: parse("0x00000000000000000000000000000000000000b1"),
        token_give,
        amount_give: U256::from(amount_give),
        token_get,
        amount_get: U256::from(amount_get),
        expires,
        nonce: U256::from(expires),
        signature: Bytes::copy_from_slice(signature.as_slice()),
        v: None,
        r: None,
        s: None,
        date: block_date(0),
    }
}

pub fn trade(
    token_give: Address,
    amount_give: u64,
    token_get: Address,
    amount_get: u64,
    addr_give: Address,
    addr_get: Address,
    block_number: BlockNumber,
) -> Trade {
    Trade {
        tx_hash: tx_hash(
            format!("{token_give}{amount_give}{token_get}{amount_get}{block_number}").as_bytes(),
        ),
        token_give,
        amount_give: U256::from(amount_give),
        token_get,
        amount_get: U256::from(amount_get),
        addr_give,
        addr_get,
        block_number,
        date: block_date(block_number),
    }
}

/// Deposit of `amount` leaving `balance_after` on the exchange.
pub fn transfer(
    token: Address,
    user: Address,
    amount: u64,
    balance_after: u64,
    block_number: BlockNumber,
) -> Transfer {
    Transfer {
        tx_hash: tx_hash(format!("{token}{user}{amount}{block_number}").as_bytes()),
        token,
        user,
        direction: TransferKind::Deposit.into(),
        amount: U256::from(amount),
        balance_after: U256::from(balance_after),
        block_number,
        date: block_date(block_number),
    }
}
