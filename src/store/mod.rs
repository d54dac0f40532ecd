//! Read-only access to indexed exchange data.
//!
//! Trades, orders and transfers are indexed into a database by a separate
//! process. [`MarketStore`] describes the queries the snapshot assembly
//! needs; [`PgMarketStore`] runs them against PostgreSQL.

mod postgres;

use std::{cmp::Ordering, future::Future};

use alloy::primitives::{Address, U256, aliases::U512};

use crate::{
    error::Result,
    types::{BlockNumber, Order, Trade, Transfer},
};

pub use postgres::PgMarketStore;

/// Default cap of trades returned by a single query.
pub const TRADES_LIMIT: usize = 300;

/// Default cap of transfers returned by a single query.
pub const TRANSFERS_LIMIT: usize = 300;

/// Default cap of orders returned by a single query.
pub const ORDERS_LIMIT: usize = 500;

/// Trades involving `token` on either side, optionally only those where
/// `user` is one of the counter-parties. Most recent first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradeQuery {
    pub token: Address,
    pub user: Option<Address>,
    pub limit: usize,
}

/// Transfers of `user` in `token` or in the native token. Most recent first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferQuery {
    pub token: Address,
    pub user: Address,
    pub limit: usize,
}

/// Orders offering `token_give` for `token_get`, optionally placed by `user`
/// and/or expiring strictly after `expires_after`.
///
/// Ordered by `rank` (if any) then by ascending expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderQuery {
    pub token_give: Address,
    pub token_get: Address,
    pub user: Option<Address>,
    pub expires_after: Option<BlockNumber>,
    pub rank: Option<PriceRank>,
    pub limit: usize,
}

/// Price ordering of an order list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PriceRank {
    /// Descending `amount_give / amount_get`, best bid first.
    BestBid,
    /// Ascending `amount_get / amount_give`, best ask first.
    BestAsk,
}

pub trait MarketStore: Send + Sync {
    fn trades(&self, query: &TradeQuery) -> impl Future<Output = Result<Vec<Trade>>> + Send;

    fn transfers(
        &self,
        query: &TransferQuery,
    ) -> impl Future<Output = Result<Vec<Transfer>>> + Send;

    fn orders(&self, query: &OrderQuery) -> impl Future<Output = Result<Vec<Order>>> + Send;
}

impl TradeQuery {
    pub fn new(token: Address, user: Option<Address>) -> Self {
        Self {
            token,
            user,
            limit: TRADES_LIMIT,
        }
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        (trade.token_give == self.token || trade.token_get == self.token)
            && self
                .user
                .is_none_or(|user| trade.addr_give == user || trade.addr_get == user)
    }
}

impl TransferQuery {
    pub fn new(token: Address, user: Address) -> Self {
        Self {
            token,
            user,
            limit: TRANSFERS_LIMIT,
        }
    }

    pub fn matches(&self, transfer: &Transfer) -> bool {
        transfer.user == self.user
            && (transfer.token == self.token || crate::types::is_native(&transfer.token))
    }
}

impl OrderQuery {
    pub fn new(token_give: Address, token_get: Address) -> Self {
        Self {
            token_give,
            token_get,
            user: None,
            expires_after: None,
            rank: None,
            limit: ORDERS_LIMIT,
        }
    }

    pub fn with_user(mut self, user: Address) -> Self {
        self.user = Some(user);
        self
    }

    pub fn expires_after(mut self, block: BlockNumber) -> Self {
        self.expires_after = Some(block);
        self
    }

    pub fn ranked(mut self, rank: PriceRank) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        order.token_give == self.token_give
            && order.token_get == self.token_get
            && self.user.is_none_or(|user| order.user == user)
            && self.expires_after.is_none_or(|block| order.expires > block)
    }
}

impl PriceRank {
    /// Price implied by the order amounts, in the direction this rank uses.
    pub fn implied_price(&self, order: &Order) -> Ratio {
        match self {
            PriceRank::BestBid => Ratio::new(order.amount_give, order.amount_get),
            PriceRank::BestAsk => Ratio::new(order.amount_get, order.amount_give),
        }
    }

    /// Compares orders by implied price, better price first.
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let (pa, pb) = (self.implied_price(a), self.implied_price(b));
        match self {
            PriceRank::BestBid => pb.cmp(&pa),
            PriceRank::BestAsk => pa.cmp(&pb),
        }
    }
}

/// Sorts orders by `rank`, then by soonest expiry.
pub fn rank_orders(orders: &mut [Order], rank: Option<PriceRank>) {
    orders.sort_by(|a, b| {
        rank.map_or(Ordering::Equal, |r| r.compare(a, b))
            .then_with(|| a.expires.cmp(&b.expires))
    });
}

/// Exact ratio of two raw amounts.
///
/// Zero denominator is ordered above any finite ratio.
#[derive(Clone, Copy, Debug)]
pub struct Ratio {
    num: U256,
    den: U256,
}

impl Ratio {
    pub fn new(num: U256, den: U256) -> Self {
        Self { num, den }
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.den.is_zero(), other.den.is_zero()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let lhs: U512 = self.num.widening_mul(other.den);
                let rhs: U512 = other.num.widening_mul(self.den);
                lhs.cmp(&rhs)
            }
        }
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ratio {}
