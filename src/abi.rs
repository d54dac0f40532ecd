#[allow(clippy::too_many_arguments)]
pub mod erc20 {
    alloy::sol!(
        /// Subset of the ERC-20 interface used to resolve token precision.
        #[derive(Debug)]
        interface IERC20Metadata {
            function decimals() external view returns (uint8);
        }
    );
}

/// Length of a single ABI-encoded word.
pub const WORD_LEN: usize = 32;
