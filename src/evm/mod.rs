//! Ethereum RPC plumbing.
//!
//! This module holds the chain-agnostic pieces the vault calculations are built on:
//! provider construction, the ERC-20 and ERC-4626 bindings, and conversions between
//! raw on-chain integers and [`Decimal`] amounts.
//!
//! # Examples
//!
//! ## Create a Provider
//!
//! ```no_run
//! use sandclock_yield::evm::{self, ProviderTrait};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = evm::mainnet().await?;
//! let block = provider.get_block_number().await?;
//! println!("Current block: {}", block);
//! # Ok(())
//! # }
//! ```
//!
//! ## Read a Vault at a Past Block
//!
//! ```no_run
//! use sandclock_yield::evm::{self, IERC4626, Address, blocks_ago, ProviderTrait};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = evm::mainnet().await?;
//! let vault: Address = "0x...".parse()?;
//! let tip = provider.get_block_number().await?;
//!
//! let vault = IERC4626::new(vault, provider);
//! let assets = vault
//!     .totalAssets()
//!     .block(blocks_ago(tip, 7160 * 7).into())
//!     .call()
//!     .await?;
//! println!("total assets a week ago: {}", assets);
//! # Ok(())
//! # }
//! ```
//!
//! ## Wei Conversions
//!
//! ```
//! use sandclock_yield::evm::from_wei;
//! use sandclock_yield::U256;
//! use rust_decimal::dec;
//!
//! let wei = U256::from(1_500_000_000_000_000_000u128);
//! let amount = from_wei(wei, 18).unwrap();
//! assert_eq!(amount, dec!(1.5));
//! ```

// reimport
pub use alloy::providers::ProviderBuilder;
use alloy::{network::Ethereum, transports::TransportError};
/// reimport primitives
pub use alloy::{
    primitives::{Address, U256, address},
    providers::Provider as ProviderTrait,
    sol,
};
use anyhow::Context;
use rust_decimal::Decimal;

/// Default Ethereum mainnet RPC URL.
///
/// URL: `https://eth.llamarpc.com`
pub const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";

/// Chain the vaults live on.
///
/// The display form is the chain tag used in pool identifiers and in
/// chain-qualified price keys (`ethereum:0x…`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Ethereum mainnet
    #[default]
    #[display("ethereum")]
    Ethereum,
}

impl Chain {
    /// Returns the EVM chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
        }
    }
}

/// Provider trait for Ethereum.
///
/// This trait is implemented by all Alloy providers on the Ethereum network and
/// ensures they can be used with the vault reads in this crate.
pub trait Provider: alloy::providers::Provider<Ethereum> + Send + Sync + Clone + 'static {}

/// Dynamic provider type.
///
/// Use this when you need type erasure for providers.
pub type DynProvider = alloy::providers::DynProvider<Ethereum>;

impl<T> Provider for T where T: alloy::providers::Provider<Ethereum> + Send + Sync + Clone + 'static {}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface ERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC4626 {
        function totalAssets() external view returns (uint256);
        function totalSupply() external view returns (uint256);
    }
}

/// Creates a provider for Ethereum mainnet.
///
/// Connects to [`DEFAULT_RPC_URL`].
#[inline(always)]
pub async fn mainnet() -> Result<impl Provider, TransportError> {
    mainnet_with_url(DEFAULT_RPC_URL).await
}

/// Creates a provider with a custom RPC URL.
///
/// # Example
///
/// ```no_run
/// use sandclock_yield::evm;
///
/// # async fn example() -> anyhow::Result<()> {
/// let provider = evm::mainnet_with_url("https://custom-rpc.example.com").await?;
/// # Ok(())
/// # }
/// ```
#[inline(always)]
pub async fn mainnet_with_url(url: &str) -> Result<impl Provider, TransportError> {
    let p = ProviderBuilder::new().connect(url).await?;
    Ok(p)
}

/// Returns the block `offset` blocks before `tip`.
///
/// Mirrors the negative block tags of other clients: `-offset` relative to the head.
/// Saturates at genesis.
#[must_use]
#[inline]
pub const fn blocks_ago(tip: u64, offset: u64) -> u64 {
    tip.saturating_sub(offset)
}

/// Converts wei representation to a decimal amount.
///
/// # Parameters
///
/// - `wei`: The wei amount to convert
/// - `decimals`: Number of decimal places for the token (e.g., 18 for ETH, 6 for USDC)
///
/// Returns an error instead of panicking when the amount is out of range.
pub fn from_wei(wei: U256, decimals: u32) -> anyhow::Result<Decimal> {
    let mantissa = i128::try_from(wei)
        .ok()
        .with_context(|| format!("{wei} does not fit in i128"))?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .with_context(|| format!("{wei} with {decimals} decimals is out of decimal range"))
}
