//! # sandclock-yield
//!
//! APY and TVL figures for the [Sandclock](https://sandclock.org) ERC-4626 vaults on
//! Ethereum mainnet, computed from on-chain share prices and DefiLlama USD prices.
//!
//! ## Quick Navigation
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`sandclock`] | Vault set, share prices, APY aggregation |
//! | [`sandclock::apy`] | Pure share price, APY and TVL formulas |
//! | [`prices`] | USD price lookup |
//! | [`evm`] | Providers, ERC-20/ERC-4626 bindings, wei conversions |
//!
//! ## Getting Started
//!
//! ```no_run
//! use sandclock_yield::sandclock::Client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::mainnet().await?;
//!     for pool in client.apy().await? {
//!         println!("{}: {}% + {}%", pool.pool, pool.apy_base, pool.apy_reward);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## How the APY is derived
//!
//! For every vault the share price is read at the reference block and
//! `BLOCKS_PER_DAY * 7` blocks before it. The base APY is the linear annualization
//! of that growth:
//!
//! ```text
//! apyBase = (sharePriceNow - sharePriceBefore) * 365 / 7 / sharePriceBefore * 100
//! ```
//!
//! and is zero when the earlier share price is zero. The reward APY is the flat
//! QUARTZ airdrop rate, [`sandclock::PROMOTIONAL_APY`].
//!
//! ## High-Precision Decimals
//!
//! Amounts, prices and yields are [`rust_decimal::Decimal`]; raw on-chain integers
//! that do not fit are reported as errors rather than truncated.

pub mod evm;
pub mod prices;
pub mod sandclock;

/// Re-exported Ethereum primitives from Alloy.
pub use alloy::primitives::{Address, U256, address};
/// Re-exported decimal type from rust_decimal.
///
/// Used for prices, amounts and yields.
pub use rust_decimal::{Decimal, dec};
