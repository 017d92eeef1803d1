//! Vault set and calculation constants.

use alloy::primitives::Address;
use anyhow::Result;
use rust_decimal::{Decimal, dec};
use url::Url;

use crate::{
    evm::{Chain, DEFAULT_RPC_URL},
    prices::default_prices_url,
    sandclock::contracts::{
        AMBER, EMERALD, LIQUITY_STABILITY_POOL, LQTY, LUSD, OPAL, QUARTZ, USDC, WETH,
    },
};

/// Average Ethereum blocks per day.
pub const BLOCKS_PER_DAY: u64 = 7160;

/// Window the share price growth is observed over.
pub const LOOKBACK_DAYS: u64 = 7;

/// QUARTZ airdrop rate paid on top of organic yield, in percent.
pub const PROMOTIONAL_APY: Decimal = dec!(15);

/// How a vault's assets are valued before dividing by shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum UnitPolicy {
    /// Underlying asset units.
    #[display("native")]
    Native,
    /// US dollars, so assets denominated in other tokens can be added in.
    #[display("usd")]
    Usd,
}

/// A token with a known precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Asset {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// A configured ERC-4626 vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Vault contract, also the share token.
    pub address: Address,
    /// Underlying asset.
    pub asset: Asset,
    /// Display label (`poolMeta`).
    pub label: String,
    /// Whether the vault earns the reward asset through the stability pool.
    pub reward_accrual: bool,
    pub unit_policy: UnitPolicy,
}

impl VaultConfig {
    /// A vault valued in native units with no reward position.
    pub fn plain(address: Address, asset: Asset, label: impl Into<String>) -> Self {
        Self {
            address,
            asset,
            label: label.into(),
            reward_accrual: false,
            unit_policy: UnitPolicy::Native,
        }
    }

    /// A vault valued in USD whose reward position counts towards its assets.
    pub fn reward_accruing(address: Address, asset: Asset, label: impl Into<String>) -> Self {
        Self {
            address,
            asset,
            label: label.into(),
            reward_accrual: true,
            unit_policy: UnitPolicy::Usd,
        }
    }

    /// Share token decimals. Sandclock vaults mirror their asset.
    #[must_use]
    pub fn share_decimals(&self) -> u8 {
        self.asset.decimals
    }
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub chain: Chain,
    pub rpc_url: String,
    pub prices_url: Url,
    pub blocks_per_day: u64,
    pub lookback_days: u64,
    /// Promotional APY reported for every pool, in percent.
    pub promotional_apy: Decimal,
    /// Token the promotional APY is paid in.
    pub promotional_token: Address,
    /// Asset accrued by reward-accruing vaults.
    pub reward_asset: Address,
    /// Contract holding the unclaimed reward gains.
    pub reward_pool: Address,
    /// Vaults in output order.
    pub vaults: Vec<VaultConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: Chain::Ethereum,
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            prices_url: default_prices_url(),
            blocks_per_day: BLOCKS_PER_DAY,
            lookback_days: LOOKBACK_DAYS,
            promotional_apy: PROMOTIONAL_APY,
            promotional_token: QUARTZ,
            reward_asset: LQTY,
            reward_pool: LIQUITY_STABILITY_POOL,
            vaults: vec![
                VaultConfig::reward_accruing(AMBER, Asset::new(LUSD, "LUSD", 18), "Amber"),
                VaultConfig::plain(OPAL, Asset::new(USDC, "USDC", 6), "Opal"),
                VaultConfig::plain(EMERALD, Asset::new(WETH, "WETH", 18), "Emerald"),
            ],
        }
    }
}

impl Config {
    pub fn with_rpc_url(self, rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..self
        }
    }

    pub fn with_prices_url(self, prices_url: Url) -> Self {
        Self { prices_url, ..self }
    }

    pub fn with_vaults(self, vaults: Vec<VaultConfig>) -> Self {
        Self { vaults, ..self }
    }

    /// Number of blocks between the two share price snapshots.
    #[must_use]
    pub fn lookback_blocks(&self) -> u64 {
        self.blocks_per_day.saturating_mul(self.lookback_days)
    }

    /// Every asset a run needs a price for, in first-seen order.
    #[must_use]
    pub fn price_assets(&self) -> Vec<Address> {
        let mut assets: Vec<Address> = Vec::with_capacity(self.vaults.len() + 1);
        for vault in &self.vaults {
            if !assets.contains(&vault.asset.address) {
                assets.push(vault.asset.address);
            }
        }
        if self.vaults.iter().any(|vault| vault.reward_accrual) && !assets.contains(&self.reward_asset) {
            assets.push(self.reward_asset);
        }
        assets
    }

    /// Rejects configurations the calculation cannot give a meaningful figure for.
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            anyhow::bail!("lookback window must be at least one day");
        }
        if self.blocks_per_day == 0 {
            anyhow::bail!("blocks per day must be positive");
        }
        for vault in &self.vaults {
            if vault.reward_accrual && vault.unit_policy.is_native() {
                anyhow::bail!(
                    "vault {} accrues rewards but is valued in native units",
                    vault.label
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vaults() {
        let config = Config::default();
        let labels: Vec<_> = config.vaults.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["Amber", "Opal", "Emerald"]);
        assert!(config.vaults[0].reward_accrual);
        assert!(config.vaults[0].unit_policy.is_usd());
        assert!(config.vaults[1].unit_policy.is_native());
        assert_eq!(config.vaults[1].share_decimals(), 6);
        assert_eq!(config.promotional_apy, dec!(15));
        config.validate().unwrap();
    }

    #[test]
    fn test_price_assets() {
        let config = Config::default();
        assert_eq!(config.price_assets(), [LUSD, USDC, WETH, LQTY]);

        let config = config.with_vaults(vec![
            VaultConfig::plain(OPAL, Asset::new(USDC, "USDC", 6), "Opal"),
            VaultConfig::plain(AMBER, Asset::new(USDC, "USDC", 6), "Other"),
        ]);
        assert_eq!(config.price_assets(), [USDC]);
    }

    #[test]
    fn test_lookback_blocks() {
        assert_eq!(Config::default().lookback_blocks(), 50_120);
    }

    #[test]
    fn test_validate() {
        let mut vault = VaultConfig::reward_accruing(AMBER, Asset::new(LUSD, "LUSD", 18), "Amber");
        vault.unit_policy = UnitPolicy::Native;
        assert!(Config::default().with_vaults(vec![vault]).validate().is_err());

        let config = Config {
            lookback_days: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
