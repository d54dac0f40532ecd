//! Conversion of stored records into their wire representation.
//!
//! Side, price, available volumes and buyer/seller roles are not stored,
//! they are derived here from the raw amounts every time a record is
//! formatted. The `format_*` functions are pure given the token converters;
//! [`trade`], [`order`] and [`transfer`] resolve the converters first.

use alloy::{
    hex,
    primitives::{Address, U256},
};
use fastnum::UD256;

use crate::{
    chain::ChainReader,
    error::Result,
    num::{self, Converter},
    token::TokenRegistry,
    types::{self, Order, OrderRecord, Side, Trade, TradeRecord, Transfer, TransferRecord},
};

/// Which leg of a give/get pair marks a buy when it is the native token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuyMarker {
    Give,
    Get,
}

/// Amount of a token on one leg of an exchange.
#[derive(Clone, Copy, Debug)]
struct Leg {
    token: Address,
    amount: U256,
    converter: Converter,
}

impl Leg {
    fn value(&self) -> UD256 {
        self.converter.from_unsigned(self.amount)
    }
}

/// Give/get legs arranged by market role: `coin` is the non-native token
/// leg, `base` is the native one.
#[derive(Clone, Copy, Debug)]
struct Legs {
    side: Side,
    coin: Leg,
    base: Leg,
}

impl Legs {
    fn classify(give: Leg, get: Leg, marker: BuyMarker) -> Self {
        let (marked, other) = match marker {
            BuyMarker::Give => (give, get),
            BuyMarker::Get => (get, give),
        };
        if types::is_native(&marked.token) {
            Self {
                side: Side::Buy,
                coin: other,
                base: marked,
            }
        } else {
            Self {
                side: Side::Sell,
                coin: marked,
                base: other,
            }
        }
    }
}

/// Formats a trade, `give`/`get` being converters of its two tokens.
///
/// A trade is a buy when the maker receives the native token.
pub fn format_trade(trade: &Trade, give: Converter, get: Converter) -> TradeRecord {
    let legs = Legs::classify(
        Leg {
            token: trade.token_give,
            amount: trade.amount_give,
            converter: give,
        },
        Leg {
            token: trade.token_get,
            amount: trade.amount_get,
            converter: get,
        },
        BuyMarker::Get,
    );
    let (buyer, seller) = match legs.side {
        Side::Buy => (trade.addr_give, trade.addr_get),
        Side::Sell => (trade.addr_get, trade.addr_give),
    };
    let amount = legs.coin.value();
    let amount_base = legs.base.value();

    TradeRecord {
        tx_hash: trade.tx_hash,
        date: trade.date,
        price: num::price(amount_base, amount),
        side: legs.side,
        amount,
        amount_base,
        buyer,
        seller,
        token_addr: legs.coin.token,
    }
}

/// Formats an open order, `give`/`get` being converters of its two tokens.
///
/// An order is a buy when it gives the native token. Available volume is
/// the amount of the non-native token, its counter volume the native one.
pub fn format_order(order: &Order, give: Converter, get: Converter) -> OrderRecord {
    let legs = Legs::classify(
        Leg {
            token: order.token_give,
            amount: order.amount_give,
            converter: give,
        },
        Leg {
            token: order.token_get,
            amount: order.amount_get,
            converter: get,
        },
        BuyMarker::Give,
    );
    let volume = legs.coin.value();
    let volume_base = legs.base.value();

    OrderRecord {
        id: format!("{}_{}", hex::encode_prefixed(&order.signature), legs.side),
        side: legs.side,
        user: order.user,
        token_get: order.token_get,
        amount_get: order.amount_get,
        token_give: order.token_give,
        amount_give: order.amount_give,
        expires: order.expires,
        nonce: order.nonce,
        available_volume: legs.coin.amount,
        eth_available_volume: volume,
        available_volume_base: legs.base.amount,
        eth_available_volume_base: volume_base,
        amount: legs.coin.amount,
        price: num::price(volume_base, volume),
        v: order.v,
        r: order.r,
        s: order.s,
        date: order.date,
        // Orders are immutable once stored
        updated: order.date,
    }
}

pub fn format_transfer(transfer: &Transfer, converter: Converter) -> TransferRecord {
    TransferRecord {
        tx_hash: transfer.tx_hash,
        token_addr: transfer.token,
        user: transfer.user,
        kind: transfer.direction.clone(),
        amount: converter.from_unsigned(transfer.amount),
        balance: converter.from_unsigned(transfer.balance_after),
        date: transfer.date,
    }
}

pub async fn trade<C: ChainReader>(
    registry: &TokenRegistry<C>,
    trade: &Trade,
) -> Result<TradeRecord> {
    let (give, get) = futures::try_join!(
        registry.converter(trade.token_give),
        registry.converter(trade.token_get)
    )?;
    Ok(format_trade(trade, give, get))
}

pub async fn order<C: ChainReader>(
    registry: &TokenRegistry<C>,
    order: &Order,
) -> Result<OrderRecord> {
    let (give, get) = futures::try_join!(
        registry.converter(order.token_give),
        registry.converter(order.token_get)
    )?;
    Ok(format_order(order, give, get))
}

pub async fn transfer<C: ChainReader>(
    registry: &TokenRegistry<C>,
    transfer: &Transfer,
) -> Result<TransferRecord> {
    let converter = registry.converter(transfer.token).await?;
    Ok(format_transfer(transfer, converter))
}
