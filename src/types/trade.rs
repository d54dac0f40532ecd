use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};

use super::{BlockNumber, Side, is_native};

/// Executed trade, recorded from the exchange `Trade` event.
///
/// `addr_give` is the maker who offered `amount_give` of `token_give`,
/// `addr_get` is the taker who filled it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trade {
    pub tx_hash: TxHash,
    pub token_give: Address,
    pub amount_give: U256,
    pub token_get: Address,
    pub amount_get: U256,
    pub addr_give: Address,
    pub addr_get: Address,
    pub block_number: BlockNumber,
    pub date: DateTime<Utc>,
}

impl Trade {
    /// A trade where the maker receives the native token is a buy.
    pub fn side(&self) -> Side {
        if is_native(&self.token_get) {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}
