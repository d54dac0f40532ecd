use alloy::primitives::{Address, B256, Bytes, U256};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::debug;

use super::{MarketStore, OrderQuery, PriceRank, TradeQuery, TransferQuery};
use crate::{
    error::{Result, SnapshotError},
    types::{self, NATIVE_TOKEN, Order, Trade, Transfer, TransferDirection},
};

// Dates are selected as stored, a `::timestamp` cast would shift them to the
// session time zone.
const TRADES_SELECT: &str = r#"
    SELECT transaction_hash, token_give, amount_give::text AS amount_give,
           token_get, amount_get::text AS amount_get, addr_give, addr_get,
           block_number, date
    FROM trades
    WHERE ("token_give" = "#;

const TRANSFERS_SELECT: &str = r#"
    SELECT transaction_hash, token, "user", direction::text AS direction,
           amount::text AS amount, balance_after::text AS balance_after,
           block_number, date
    FROM transfers
    WHERE "user" = $1 AND ("token" = $2 OR "token" = $3)
    ORDER BY block_number DESC, date DESC
    LIMIT $4
    "#;

const ORDERS_SELECT: &str = r#"
    SELECT "user", token_give, amount_give::text AS amount_give,
           token_get, amount_get::text AS amount_get, expires::text AS expires,
           nonce::text AS nonce, signature, v::integer AS v, r, s,
           date
    FROM orders
    WHERE ("token_give" = "#;

/// [`MarketStore`] over the indexer's PostgreSQL schema.
///
/// Addresses and hashes are `bytea`, amounts are integer `numeric`,
/// dates are `timestamptz`. Every query runs on its own pooled connection.
#[derive(Clone, Debug)]
pub struct PgMarketStore {
    pool: PgPool,
}

impl PgMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MarketStore for PgMarketStore {
    async fn trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        let mut qb = QueryBuilder::<Postgres>::new(TRADES_SELECT);
        qb.push_bind(query.token.to_vec())
            .push(r#" OR "token_get" = "#)
            .push_bind(query.token.to_vec())
            .push(")");
        if let Some(user) = query.user {
            qb.push(r#" AND ("addr_give" = "#)
                .push_bind(user.to_vec())
                .push(r#" OR "addr_get" = "#)
                .push_bind(user.to_vec())
                .push(")");
        }
        qb.push(" ORDER BY block_number DESC, date DESC LIMIT ")
            .push_bind(query.limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        debug!(token = %query.token, user = ?query.user, rows = rows.len(), "Trades fetched");
        rows.iter().map(decode_trade).collect()
    }

    async fn transfers(&self, query: &TransferQuery) -> Result<Vec<Transfer>> {
        let rows = sqlx::query(TRANSFERS_SELECT)
        .bind(query.user.to_vec())
        .bind(query.token.to_vec())
        .bind(NATIVE_TOKEN.to_vec())
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await?;
        debug!(token = %query.token, user = %query.user, rows = rows.len(), "Transfers fetched");
        rows.iter().map(decode_transfer).collect()
    }

    async fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut qb = QueryBuilder::<Postgres>::new(ORDERS_SELECT);
        qb.push_bind(query.token_give.to_vec())
            .push(r#" AND "token_get" = "#)
            .push_bind(query.token_get.to_vec())
            .push(")");
        if let Some(user) = query.user {
            qb.push(r#" AND ("user" = "#).push_bind(user.to_vec()).push(")");
        }
        if let Some(block) = query.expires_after {
            // numeric column, bound as text to cover the whole u64 range
            qb.push(r#" AND ("expires" > "#)
                .push_bind(block.to_string())
                .push("::numeric)");
        }
        let order_by = query
            .rank
            .map(rank_sql)
            .into_iter()
            .chain(std::iter::once("expires ASC"))
            .join(", ");
        qb.push(" ORDER BY ")
            .push(order_by)
            .push(" LIMIT ")
            .push_bind(query.limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        debug!(
            token_give = %query.token_give,
            token_get = %query.token_get,
            rank = ?query.rank,
            rows = rows.len(),
            "Orders fetched"
        );
        rows.iter().map(decode_order).collect()
    }
}

fn rank_sql(rank: PriceRank) -> &'static str {
    match rank {
        // NULL (zero divisor) sorts first descending and last ascending
        PriceRank::BestBid => "(amount_give / NULLIF(amount_get, 0)) DESC",
        PriceRank::BestAsk => "(amount_get / NULLIF(amount_give, 0)) ASC",
    }
}

fn decode_trade(row: &PgRow) -> Result<Trade> {
    const KIND: &str = "trade";
    Ok(Trade {
        tx_hash: hash(KIND, row.try_get("transaction_hash")?)?,
        token_give: address(KIND, row.try_get("token_give")?)?,
        amount_give: amount(KIND, row.try_get("amount_give")?)?,
        token_get: address(KIND, row.try_get("token_get")?)?,
        amount_get: amount(KIND, row.try_get("amount_get")?)?,
        addr_give: address(KIND, row.try_get("addr_give")?)?,
        addr_get: address(KIND, row.try_get("addr_get")?)?,
        block_number: block(KIND, row.try_get("block_number")?)?,
        date: row.try_get::<DateTime<Utc>, _>("date")?,
    })
}

fn decode_transfer(row: &PgRow) -> Result<Transfer> {
    const KIND: &str = "transfer";
    Ok(Transfer {
        tx_hash: hash(KIND, row.try_get("transaction_hash")?)?,
        token: address(KIND, row.try_get("token")?)?,
        user: address(KIND, row.try_get("user")?)?,
        direction: TransferDirection::new(row.try_get::<String, _>("direction")?),
        amount: amount(KIND, row.try_get("amount")?)?,
        balance_after: amount(KIND, row.try_get("balance_after")?)?,
        block_number: block(KIND, row.try_get("block_number")?)?,
        date: row.try_get::<DateTime<Utc>, _>("date")?,
    })
}

fn decode_order(row: &PgRow) -> Result<Order> {
    const KIND: &str = "order";
    let expires: String = row.try_get("expires")?;
    let v: Option<i32> = row.try_get("v")?;
    let r: Option<Vec<u8>> = row.try_get("r")?;
    let s: Option<Vec<u8>> = row.try_get("s")?;
    Ok(Order {
        user: address(KIND, row.try_get("user")?)?,
        token_give: address(KIND, row.try_get("token_give")?)?,
        amount_give: amount(KIND, row.try_get("amount_give")?)?,
        token_get: address(KIND, row.try_get("token_get")?)?,
        amount_get: amount(KIND, row.try_get("amount_get")?)?,
        expires: expires
            .parse()
            .map_err(|_| SnapshotError::Decode(KIND, format!("invalid expiry {expires}")))?,
        nonce: amount(KIND, row.try_get("nonce")?)?,
        signature: Bytes::from(row.try_get::<Vec<u8>, _>("signature")?),
        v: v.map(|v| {
            u8::try_from(v).map_err(|_| SnapshotError::Decode(KIND, format!("invalid v {v}")))
        })
        .transpose()?,
        r: r.map(|r| hash(KIND, r)).transpose()?,
        s: s.map(|s| hash(KIND, s)).transpose()?,
        date: row.try_get::<DateTime<Utc>, _>("date")?,
    })
}

fn address(kind: &'static str, value: Vec<u8>) -> Result<Address> {
    types::address_from_bytes(&value).ok_or_else(|| {
        SnapshotError::Decode(kind, format!("invalid address of {} bytes", value.len()))
    })
}

fn hash(kind: &'static str, value: Vec<u8>) -> Result<B256> {
    B256::try_from(value.as_slice()).map_err(|_| {
        SnapshotError::Decode(kind, format!("invalid hash of {} bytes", value.len()))
    })
}

fn amount(kind: &'static str, value: String) -> Result<U256> {
    U256::from_str_radix(&value, 10)
        .map_err(|_| SnapshotError::Decode(kind, format!("invalid amount {value}")))
}

fn block(kind: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| SnapshotError::Decode(kind, format!("invalid block number {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sql() {
        assert_eq!(
            rank_sql(PriceRank::BestBid),
            "(amount_give / NULLIF(amount_get, 0)) DESC"
        );
        assert_eq!(
            rank_sql(PriceRank::BestAsk),
            "(amount_get / NULLIF(amount_give, 0)) ASC"
        );
    }

    #[test]
    fn test_dates_selected_without_cast() {
        for sql in [TRADES_SELECT, TRANSFERS_SELECT, ORDERS_SELECT] {
            assert!(sql.contains(" date\n"), "{sql}");
            assert!(!sql.contains("::timestamp"), "{sql}");
        }
    }

    #[test]
    fn test_decode_helpers() {
        assert_eq!(amount("trade", "1000".to_string()).unwrap(), U256::from(1000));
        assert!(amount("trade", "1.5".to_string()).is_err());
        assert!(amount("trade", "-1".to_string()).is_err());
        assert_eq!(address("trade", vec![0u8; 20]).unwrap(), NATIVE_TOKEN);
        assert!(address("trade", vec![0u8; 32]).is_err());
        assert!(hash("trade", vec![0u8; 20]).is_err());
        assert!(block("trade", -1).is_err());
    }
}
