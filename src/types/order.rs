use std::fmt;

use alloy::primitives::{Address, B256, Bytes, U256};
use chrono::{DateTime, Utc};

use super::{BlockNumber, is_native};

/// Side of an order or trade, from the point of view of the
/// non-native token.
///
/// * [`Side::Buy`] acquires the non-native token paying with the native one.
/// * [`Side::Sell`] disposes of the non-native token for the native one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed order as kept by the market data store.
///
/// Orders that originated on-chain carry no off-chain signature, so
/// `v`, `r` and `s` are absent for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub user: Address,
    pub token_give: Address,
    pub amount_give: U256,
    pub token_get: Address,
    pub amount_get: U256,
    pub expires: BlockNumber,
    pub nonce: U256,
    /// Order hash the maker signed.
    pub signature: Bytes,
    pub v: Option<u8>,
    pub r: Option<B256>,
    pub s: Option<B256>,
    pub date: DateTime<Utc>,
}

impl Order {
    /// An order giving the native token buys the other one.
    pub fn side(&self) -> Side {
        if is_native(&self.token_give) {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}
