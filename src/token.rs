//! Token decimals registry.
//!
//! Every amount stored by the exchange is an integer in the token's smallest
//! unit, so any value shown to a user has to be scaled by the token's
//! `decimals()`. [`TokenRegistry`] keeps a process-wide, append-only cache of
//! known precisions, seeded from a bundled token list and extended lazily by
//! on-chain lookups.

use std::io::Read;

use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use dashmap::DashMap;
use fastnum::UD256;
use tracing::{debug, warn};

use crate::{
    abi::{self, erc20::IERC20Metadata},
    chain::ChainReader,
    error::{Result, SnapshotError},
    num,
    types::{self, NATIVE_DECIMALS},
};

/// Token list shipped with the crate.
const BUNDLED_TOKENS: &str = include_str!("../data/tokens.json");

/// Entry of a token list file.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct TokenListEntry {
    pub addr: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: Option<String>,
}

/// Cache of token decimals.
///
/// Should be created once and shared between all request handlers (eg. via
/// [`std::sync::Arc`]). Entries are never updated or evicted as token
/// precision is immutable. Concurrent resolution of the same unknown token
/// may issue more than one on-chain call, all of them yield the same value.
#[derive(derive_more::Debug)]
pub struct TokenRegistry<C> {
    #[debug(skip)]
    chain: C,
    decimals: DashMap<Address, u8>,
}

impl<C: ChainReader> TokenRegistry<C> {
    /// Creates an empty registry, every token gets resolved on-chain.
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            decimals: DashMap::new(),
        }
    }

    /// Creates a registry seeded with known token precisions.
    pub fn with_tokens(chain: C, tokens: impl IntoIterator<Item = (Address, u8)>) -> Self {
        let registry = Self::new(chain);
        for (token, decimals) in tokens {
            if !types::is_native(&token) {
                registry.decimals.insert(token, decimals);
            }
        }
        registry
    }

    /// Creates a registry seeded with the token list shipped with the crate.
    pub fn bundled(chain: C) -> Result<Self> {
        Self::from_token_list(chain, BUNDLED_TOKENS.as_bytes())
    }

    /// Creates a registry seeded with a JSON token list, an array of
    /// `{"addr": "0x..", "decimals": 18}` objects.
    pub fn from_token_list(chain: C, reader: impl Read) -> Result<Self> {
        let entries: Vec<TokenListEntry> = serde_json::from_reader(reader)
            .map_err(|e| SnapshotError::Decode("token list", e.to_string()))?;
        let tokens = entries
            .into_iter()
            .map(|entry| {
                // list entries are trusted, checksum casing is not enforced
                types::parse_address(&entry.addr.to_ascii_lowercase())
                    .map(|addr| (addr, entry.decimals))
                    .ok_or_else(|| {
                        SnapshotError::Decode(
                            "token list",
                            format!("invalid address {}", entry.addr),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(tokens = tokens.len(), "Token list loaded");
        Ok(Self::with_tokens(chain, tokens))
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Number of cached entries, excluding the native token.
    pub fn len(&self) -> usize {
        self.decimals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decimals.is_empty()
    }

    /// Cached precision of the token, without resolving it.
    pub fn cached(&self, token: &Address) -> Option<u8> {
        if types::is_native(token) {
            return Some(NATIVE_DECIMALS);
        }
        self.decimals.get(token).map(|d| *d)
    }

    /// Returns the decimals of the token, calling its `decimals()` method
    /// if it is not known yet.
    ///
    /// The native token is never looked up. Call failures and responses other
    /// than a single 32 bytes word are reported as
    /// [`SnapshotError::MalformedContract`] and leave the cache untouched.
    pub async fn resolve(&self, token: Address) -> Result<u8> {
        if let Some(decimals) = self.cached(&token) {
            return Ok(decimals);
        }

        let output = self
            .chain
            .call(token, Bytes::from(IERC20Metadata::decimalsCall {}.abi_encode()))
            .await
            .map_err(|e| {
                warn!(%token, %e, "decimals() call failed");
                SnapshotError::MalformedContract {
                    token,
                    reason: e.to_string(),
                }
            })?;
        let decimals = decode_decimals(token, &output)?;

        debug!(%token, decimals, "Token decimals resolved");
        self.decimals.insert(token, decimals);
        Ok(decimals)
    }

    /// Converter for the token amounts.
    pub async fn converter(&self, token: Address) -> Result<num::Converter> {
        Ok(num::Converter::new(self.resolve(token).await?))
    }

    /// Scales raw token amount to its decimal value.
    pub async fn to_display(&self, raw: U256, token: Address) -> Result<UD256> {
        Ok(self.converter(token).await?.from_unsigned(raw))
    }

    /// Scales decimal token amount to its raw on-chain value.
    pub async fn to_raw(&self, value: UD256, token: Address) -> Result<U256> {
        self.converter(token).await?.to_unsigned(value)
    }
}

fn decode_decimals(token: Address, output: &[u8]) -> Result<u8> {
    if output.len() != abi::WORD_LEN {
        warn!(%token, len = output.len(), "Unexpected decimals() response");
        return Err(SnapshotError::MalformedContract {
            token,
            reason: format!(
                "expected {} bytes, got {} (0x{})",
                abi::WORD_LEN,
                output.len(),
                alloy::hex::encode(output)
            ),
        });
    }
    let value = U256::from_be_slice(output);
    u8::try_from(value).map_err(|_| SnapshotError::MalformedContract {
        token,
        reason: format!("decimals out of range: {value}"),
    })
}
