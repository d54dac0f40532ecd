use std::fmt::Display;

use alloy::{primitives::Address, transports};

/// Error aborting a snapshot assembly.
///
/// Malformed addresses supplied by clients are not errors, they degrade
/// to empty results instead.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("contract {token} does not support `decimals()`: {reason}")]
    MalformedContract { token: Address, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store query failed: {0}")]
    Store(String),

    #[error("failed to decode {0} record: {1}")]
    Decode(&'static str, String),

    #[error("value {value} is not representable with {decimals} decimals")]
    Precision { value: String, decimals: u8 },
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

impl<E: Display> From<transports::RpcError<E>> for SnapshotError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<sqlx::Error> for SnapshotError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Decode("store", format!("column {index}: {source}"))
            }
            sqlx::Error::ColumnNotFound(column) => {
                Self::Decode("store", format!("missing column {column}"))
            }
            other => Self::Store(other.to_string()),
        }
    }
}
