//! Read access to the chain.
//!
//! The snapshot core needs exactly two things from a node: the current
//! head block and plain `eth_call`s to token contracts. [`ChainReader`]
//! captures that, [`RpcChain`] provides it on top of any alloy [`Provider`].

use std::future::Future;

use alloy::{
    primitives::{Address, Bytes},
    providers::Provider,
    rpc::types::{TransactionInput, TransactionRequest},
};

use crate::error::Result;

pub trait ChainReader: Send + Sync {
    /// Latest block number.
    fn block_number(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Executes a read-only call against contract `to` and returns raw output.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes>> + Send;
}

/// [`ChainReader`] backed by an RPC provider.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::RetryBackoffLayer`] if transient node
/// failures should not abort snapshots, calls are issued once otherwise.
#[derive(Clone, Debug)]
pub struct RpcChain<P> {
    provider: P,
}

impl<P: Provider> RpcChain<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> ChainReader for RpcChain<P> {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        Ok(self.provider.call(tx).await?)
    }
}
