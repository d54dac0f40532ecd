use alloy::primitives::{Address, B256, TxHash, U256};
use chrono::{DateTime, Utc};
use fastnum::UD256;
use serde::{Deserialize, Serialize};

use super::{BlockNumber, Side, TransferDirection, encode};

/// Inbound market snapshot request.
///
/// Both fields are taken as supplied by the client and validated by
/// the assembler; malformed values are treated as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SnapshotRequest {
    pub token: Option<String>,
    pub user: Option<String>,
}

impl SnapshotRequest {
    pub fn new(token: impl Into<String>, user: Option<String>) -> Self {
        Self {
            token: Some(token.into()),
            user,
        }
    }
}

/// Trade in wire format.
#[derive(Clone, derive_more::Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    #[serde(serialize_with = "encode::bytes")]
    pub tx_hash: TxHash,
    pub date: DateTime<Utc>,
    #[debug("{price}")]
    #[serde(serialize_with = "encode::decimal")]
    pub price: UD256,
    pub side: Side,
    /// Amount of the non-native token.
    #[debug("{amount}")]
    #[serde(serialize_with = "encode::decimal")]
    pub amount: UD256,
    /// Amount of the native token.
    #[debug("{amount_base}")]
    #[serde(serialize_with = "encode::decimal")]
    pub amount_base: UD256,
    #[serde(serialize_with = "encode::address")]
    pub buyer: Address,
    #[serde(serialize_with = "encode::address")]
    pub seller: Address,
    /// The non-native token traded.
    #[serde(serialize_with = "encode::address")]
    pub token_addr: Address,
}

/// Open order in wire format.
///
/// `availableVolume`/`availableVolumeBase` are raw on-chain amounts of the
/// offered and the counter leg, the `eth*` variants are the same amounts
/// scaled by the corresponding token decimals.
#[derive(Clone, derive_more::Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Signature hash and side, two sides of the same signed order are
    /// distinct market entries.
    pub id: String,
    pub side: Side,
    #[serde(serialize_with = "encode::address")]
    pub user: Address,

    #[serde(serialize_with = "encode::address")]
    pub token_get: Address,
    #[serde(serialize_with = "encode::display")]
    pub amount_get: U256,
    #[serde(serialize_with = "encode::address")]
    pub token_give: Address,
    #[serde(serialize_with = "encode::display")]
    pub amount_give: U256,
    #[serde(serialize_with = "encode::display")]
    pub expires: BlockNumber,
    #[serde(serialize_with = "encode::display")]
    pub nonce: U256,

    #[serde(serialize_with = "encode::display")]
    pub available_volume: U256,
    #[debug("{eth_available_volume}")]
    #[serde(serialize_with = "encode::decimal")]
    pub eth_available_volume: UD256,
    #[serde(serialize_with = "encode::display")]
    pub available_volume_base: U256,
    #[debug("{eth_available_volume_base}")]
    #[serde(serialize_with = "encode::decimal")]
    pub eth_available_volume_base: UD256,

    #[serde(serialize_with = "encode::display")]
    pub amount: U256,
    #[debug("{price}")]
    #[serde(serialize_with = "encode::decimal")]
    pub price: UD256,

    pub v: Option<u8>,
    #[serde(serialize_with = "encode::opt_bytes")]
    pub r: Option<B256>,
    #[serde(serialize_with = "encode::opt_bytes")]
    pub s: Option<B256>,

    pub date: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Deposit or withdrawal in wire format.
#[derive(Clone, derive_more::Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    #[serde(serialize_with = "encode::bytes")]
    pub tx_hash: TxHash,
    #[serde(serialize_with = "encode::address")]
    pub token_addr: Address,
    #[serde(serialize_with = "encode::address")]
    pub user: Address,
    pub kind: TransferDirection,
    #[debug("{amount}")]
    #[serde(serialize_with = "encode::decimal")]
    pub amount: UD256,
    #[debug("{balance}")]
    #[serde(serialize_with = "encode::decimal")]
    pub balance: UD256,
    pub date: DateTime<Utc>,
}

/// Open orders of a market, best price first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OrderBook {
    pub buys: Vec<OrderRecord>,
    pub sells: Vec<OrderRecord>,
}

/// Market view for a token pair, optionally personalized for a user.
///
/// User-scoped lists are empty when no (valid) user was requested.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub trades: Vec<TradeRecord>,
    pub my_trades: Vec<TradeRecord>,
    pub my_funds: Vec<TransferRecord>,
    pub orders: OrderBook,
}

impl MarketSnapshot {
    /// Returns true if the snapshot holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
            && self.my_trades.is_empty()
            && self.my_funds.is_empty()
            && self.orders.buys.is_empty()
            && self.orders.sells.is_empty()
    }
}
