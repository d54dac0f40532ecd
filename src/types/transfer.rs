use std::fmt;

use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use fastnum::{UD256, decimal::Context};

use super::BlockNumber;

/// Direction of funds movement between a wallet and the exchange contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferKind {
    Deposit,
    Withdraw,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Deposit => "deposit",
            TransferKind::Withdraw => "withdraw",
        }
    }

    /// Interprets a stored direction: a word (`deposit`, `withdraw`,
    /// `withdrawal`, any case) or a signed non-zero number, negative
    /// meaning withdrawal.
    pub fn classify(direction: &str) -> Option<Self> {
        let direction = direction.trim();
        match direction.to_ascii_lowercase().as_str() {
            "deposit" => return Some(TransferKind::Deposit),
            "withdraw" | "withdrawal" => return Some(TransferKind::Withdraw),
            _ => {}
        }
        let (kind, magnitude) = match direction.strip_prefix('-') {
            Some(magnitude) => (TransferKind::Withdraw, magnitude),
            None => (
                TransferKind::Deposit,
                direction.strip_prefix('+').unwrap_or(direction),
            ),
        };
        let magnitude = UD256::from_str(magnitude, Context::default()).ok()?;
        (!magnitude.is_zero()).then_some(kind)
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer direction as stored by the indexer.
///
/// The stored value is kept verbatim for the wire, its interpretation is
/// `None` when it is neither a known word nor a signed number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransferDirection {
    label: String,
    kind: Option<TransferKind>,
}

impl TransferDirection {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let kind = TransferKind::classify(&label);
        Self { label, kind }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> Option<TransferKind> {
        self.kind
    }
}

impl From<TransferKind> for TransferDirection {
    fn from(kind: TransferKind) -> Self {
        Self {
            label: kind.as_str().to_string(),
            kind: Some(kind),
        }
    }
}

impl serde::Serialize for TransferDirection {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.label)
    }
}

/// Deposit or withdrawal of a token into the exchange contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub tx_hash: TxHash,
    pub token: Address,
    pub user: Address,
    pub direction: TransferDirection,
    pub amount: U256,
    /// User's exchange balance of `token` right after the transfer.
    pub balance_after: U256,
    pub block_number: BlockNumber,
    pub date: DateTime<Utc>,
}
