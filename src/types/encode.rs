//! Wire encoding of snapshot records.
//!
//! Amounts and prices are lower-case decimal strings, addresses and hashes
//! are `0x`-prefixed lower-case hex.

use std::fmt::Display;

use alloy::{hex, primitives::Address};
use fastnum::UD256;
use serde::Serializer;

pub(super) fn decimal<S: Serializer>(value: &UD256, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string().to_lowercase())
}

pub(super) fn display<T: Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string().to_lowercase())
}

pub(super) fn address<S: Serializer>(value: &Address, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode_prefixed(value.as_slice()))
}

pub(super) fn bytes<T: AsRef<[u8]>, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode_prefixed(value))
}

pub(super) fn opt_bytes<T: AsRef<[u8]>, S: Serializer>(
    value: &Option<T>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => bytes(v, s),
        None => s.serialize_none(),
    }
}
