//! Market snapshot assembly.
//!
//! A snapshot is re-derived from the store on every request: the queries it
//! needs are issued concurrently, then every record is formatted with
//! decimals resolved through the shared [`TokenRegistry`]. Any failing query
//! or decimals lookup fails the whole snapshot, partial snapshots are never
//! returned.

use std::{future::Future, sync::Arc};

use alloy::primitives::Address;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::{
    chain::ChainReader,
    error::Result,
    format,
    store::{self, MarketStore, OrderQuery, PriceRank, TradeQuery, TransferQuery},
    token::TokenRegistry,
    types::{self, BlockNumber, MarketSnapshot, NATIVE_TOKEN, OrderBook, SnapshotRequest},
};

/// Caps of the snapshot lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotLimits {
    pub trades: usize,
    pub transfers: usize,
    pub orders: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            trades: store::TRADES_LIMIT,
            transfers: store::TRANSFERS_LIMIT,
            orders: store::ORDERS_LIMIT,
        }
    }
}

/// Assembles [`MarketSnapshot`]s from the store.
///
/// Cheap to create per connection/handler, as long as the registry is shared.
#[derive(Debug)]
pub struct SnapshotAssembler<C, S> {
    registry: Arc<TokenRegistry<C>>,
    store: S,
    limits: SnapshotLimits,
}

impl<C: ChainReader, S: MarketStore> SnapshotAssembler<C, S> {
    pub fn new(registry: Arc<TokenRegistry<C>>, store: S) -> Self {
        Self {
            registry,
            store,
            limits: SnapshotLimits::default(),
        }
    }

    /// Sets caps of the snapshot lists (default: 300 trades and transfers,
    /// 500 orders per side).
    pub fn with_limits(mut self, limits: SnapshotLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &Arc<TokenRegistry<C>> {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Assembles a snapshot for a client request.
    ///
    /// Missing or malformed token yields an empty snapshot without touching
    /// the store, malformed user is treated as absent.
    pub async fn assemble(&self, request: &SnapshotRequest) -> Result<MarketSnapshot> {
        let Some(token) = request.token.as_deref().and_then(types::parse_address) else {
            debug!(token = ?request.token, "No valid token requested");
            return Ok(MarketSnapshot::default());
        };
        let user = request.user.as_deref().and_then(types::parse_address);
        if user.is_none() && request.user.is_some() {
            debug!(user = ?request.user, "Ignoring malformed user address");
        }
        self.assemble_for(token, user).await
    }

    /// Assembles a snapshot of the `token` market, personalized for `user`.
    pub async fn assemble_for(
        &self,
        token: Address,
        user: Option<Address>,
    ) -> Result<MarketSnapshot> {
        let trades_query = TradeQuery {
            limit: self.limits.trades,
            ..TradeQuery::new(token, None)
        };
        let open_orders = async {
            let head = self.registry.chain().block_number().await?;
            let (buys, sells) = (self.buys_query(token, head), self.sells_query(token, head));
            futures::try_join!(self.store.orders(&buys), self.store.orders(&sells))
        };
        let user_history = async {
            let Some(user) = user else {
                return Ok((vec![], vec![]));
            };
            let trades = TradeQuery {
                limit: self.limits.trades,
                ..TradeQuery::new(token, Some(user))
            };
            let transfers = TransferQuery {
                limit: self.limits.transfers,
                ..TransferQuery::new(token, user)
            };
            futures::try_join!(self.store.trades(&trades), self.store.transfers(&transfers))
        };

        let (trades, (buys, sells), (my_trades, my_funds)) = futures::try_join!(
            self.store.trades(&trades_query),
            open_orders,
            user_history
        )?;
        debug!(
            %token,
            trades = trades.len(),
            buys = buys.len(),
            sells = sells.len(),
            my_trades = my_trades.len(),
            my_funds = my_funds.len(),
            "Snapshot records fetched"
        );

        let registry = self.registry.as_ref();
        let (trades, my_trades, my_funds, buys, sells) = futures::try_join!(
            format_all(&trades, |t| format::trade(registry, t)),
            format_all(&my_trades, |t| format::trade(registry, t)),
            format_all(&my_funds, |t| format::transfer(registry, t)),
            format_all(&buys, |o| format::order(registry, o)),
            format_all(&sells, |o| format::order(registry, o))
        )?;

        info!(%token, user = ?user, "Market snapshot assembled");
        Ok(MarketSnapshot {
            trades,
            my_trades,
            my_funds,
            orders: OrderBook { buys, sells },
        })
    }

    /// Open orders paying native for the token, best bid first.
    fn buys_query(&self, token: Address, head: BlockNumber) -> OrderQuery {
        OrderQuery::new(NATIVE_TOKEN, token)
            .expires_after(head)
            .ranked(PriceRank::BestBid)
            .with_limit(self.limits.orders)
    }

    /// Open orders offering the token for native, best ask first.
    fn sells_query(&self, token: Address, head: BlockNumber) -> OrderQuery {
        OrderQuery::new(token, NATIVE_TOKEN)
            .expires_after(head)
            .ranked(PriceRank::BestAsk)
            .with_limit(self.limits.orders)
    }
}

/// Formats records one by one, so that a token missing from the registry
/// is resolved once per list rather than once per record.
async fn format_all<'a, T, R, F, Fut>(records: &'a [T], f: F) -> Result<Vec<R>>
where
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    stream::iter(records).then(f).try_collect().await
}
