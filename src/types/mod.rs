mod encode;
mod order;
mod snapshot;
mod trade;
mod transfer;

pub use order::{Order, Side};
pub use snapshot::{
    MarketSnapshot, OrderBook, OrderRecord, SnapshotRequest, TradeRecord, TransferRecord,
};
pub use trade::Trade;
pub use transfer::{Transfer, TransferDirection, TransferKind};

use alloy::{hex, primitives::Address};

/// The all-zero address standing for the chain's native asset.
/// It is not an ERC20 contract and always has 18 decimals.
pub const NATIVE_TOKEN: Address = Address::ZERO;

/// Decimals of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// Block height.
pub type BlockNumber = u64;

/// Returns true if `token` is the native asset sentinel.
pub fn is_native(token: &Address) -> bool {
    *token == NATIVE_TOKEN
}

/// Parses a hex address, returning `None` if it is not well-formed.
///
/// Accepts an optional `0x` prefix and exactly 40 hex digits. All-lower and
/// all-upper case inputs are accepted as is, mixed case inputs must carry
/// a valid EIP-55 checksum.
pub fn parse_address(value: &str) -> Option<Address> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let address = Address::from_slice(&hex::decode(digits).ok()?);

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return None;
    }
    Some(address)
}

/// Converts a raw 20-byte value, as stored in the database, to an address.
pub fn address_from_bytes(value: &[u8]) -> Option<Address> {
    Address::try_from(value).ok()
}
