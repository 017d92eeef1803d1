//! Sandclock vault yields.
//!
//! Computes the base APY of each configured vault from the growth of its share price
//! over the lookback window, and reports it next to the flat promotional APY paid in
//! QUARTZ.
//!
//! # Example
//!
//! ```no_run
//! use sandclock_yield::sandclock::Client;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Client::mainnet().await?;
//! for pool in client.apy().await? {
//!     println!("{}: base {}% reward {}%", pool.pool_meta, pool.apy_base, pool.apy_reward);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Share price
//!
//! `share price = assets / shares`, zero while no shares exist. How `assets` is
//! measured depends on the vault's [`UnitPolicy`]:
//!
//! - [`UnitPolicy::Native`]: `totalAssets()` in asset units.
//! - [`UnitPolicy::Usd`]: `totalAssets()` in USD plus the USD value of the LQTY the
//!   vault holds and can claim from the Liquity stability pool.

pub mod apy;
pub mod config;
pub mod contracts;

use alloy::{
    eips::BlockId,
    primitives::{Address, U256},
};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use self::config::{
    Asset, BLOCKS_PER_DAY, Config, LOOKBACK_DAYS, PROMOTIONAL_APY, UnitPolicy, VaultConfig,
};
use crate::{
    evm::{self, Chain, DynProvider, ERC20, IERC4626, Provider, blocks_ago, from_wei},
    prices::{PriceClient, Prices},
    sandclock::contracts::IStabilityPool,
};

/// Project name reported in every pool.
pub const PROJECT: &str = "sandclock";

/// Project homepage.
pub const PROJECT_URL: &str = "https://sandclock.org";

/// App URL reported in every pool.
pub const APP_URL: &str = "https://app.sandclock.org/";

/// Yields can be computed as of any past block.
pub const TIMETRAVEL: bool = true;

/// Computed yield for one vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResult {
    /// `<vault>-<chain>`
    pub pool: String,
    pub chain: Chain,
    pub project: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tvl_usd: Decimal,
    pub underlying_tokens: Vec<Address>,
    pub reward_tokens: Vec<Address>,
    /// Observed yield, in percent.
    #[serde(with = "rust_decimal::serde::float")]
    pub apy_base: Decimal,
    /// Promotional yield, in percent.
    #[serde(with = "rust_decimal::serde::float")]
    pub apy_reward: Decimal,
    pub pool_meta: String,
    pub url: String,
}

/// Raw vault state at one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultSnapshot {
    pub block: u64,
    pub total_assets: U256,
    pub total_shares: U256,
    /// USD value of the reward position, for reward-accruing vaults.
    pub reward_usd: Option<Decimal>,
}

impl VaultSnapshot {
    /// Assets per share according to the vault's unit policy.
    ///
    /// `price` is the USD price of the vault's asset and is ignored for
    /// [`UnitPolicy::Native`].
    pub fn share_price(&self, vault: &VaultConfig, price: Decimal) -> Result<Decimal> {
        let assets = from_wei(self.total_assets, vault.asset.decimals.into())?;
        let assets = match vault.unit_policy {
            UnitPolicy::Native => assets,
            UnitPolicy::Usd => assets
                .checked_mul(price)
                .and_then(|usd| usd.checked_add(self.reward_usd.unwrap_or_default()))
                .with_context(|| format!("{} assets at ${price} out of range", vault.label))?,
        };
        let shares = from_wei(self.total_shares, vault.share_decimals().into())?;
        apy::share_price(assets, shares)
            .with_context(|| format!("{} share price at block {}", vault.label, self.block))
    }

    /// Total value locked in USD, including the reward position.
    pub fn tvl_usd(&self, vault: &VaultConfig, price: Decimal) -> Result<Decimal> {
        let tvl = apy::usd_value(self.total_assets, vault.asset.decimals, price)?;
        tvl.checked_add(self.reward_usd.unwrap_or_default())
            .with_context(|| format!("{} tvl out of range", vault.label))
    }
}

/// Sandclock client
pub struct Client<P>
where
    P: Provider,
{
    provider: P,
    prices: PriceClient,
    config: Config,
}

impl Client<DynProvider> {
    /// Creates a client for mainnet with the default vault set.
    pub async fn mainnet() -> Result<Self> {
        Self::from_config(Config::default()).await
    }

    /// Creates a client connecting to `config.rpc_url`.
    pub async fn from_config(config: Config) -> Result<Self> {
        let provider = DynProvider::new(evm::mainnet_with_url(&config.rpc_url).await?);
        Self::new(provider, config)
    }
}

impl<P> Client<P>
where
    P: Provider,
{
    /// Create a sandclock client.
    ///
    /// Fails when the HTTP client for the price service cannot be built.
    pub fn new(provider: P, config: Config) -> Result<Self> {
        let prices = PriceClient::new(config.chain)?.with_url(config.prices_url.clone());
        Ok(Self {
            provider,
            prices,
            config,
        })
    }

    /// Replaces the price client.
    pub fn with_price_client(self, prices: PriceClient) -> Self {
        Self { prices, ..self }
    }

    /// Returns the root provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the vault set and constants this client runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the yield of every configured vault as of the latest block.
    pub async fn apy(&self) -> Result<Vec<PoolResult>> {
        let tip = self.provider.get_block_number().await?;
        self.apy_at(tip).await
    }

    /// Returns the yield of every configured vault as of `block`.
    ///
    /// Prices are always current; the price service has no historical lookup here.
    pub async fn apy_at(&self, block: u64) -> Result<Vec<PoolResult>> {
        self.config.validate()?;
        let prices = self.prices.current(&self.config.price_assets()).await?;
        self.apy_with(&prices, block).await
    }

    /// Returns the yield of every configured vault as of `block` using `prices`.
    ///
    /// Vaults are processed one after another; results follow configuration order.
    pub async fn apy_with(&self, prices: &Prices, block: u64) -> Result<Vec<PoolResult>> {
        let mut pools = Vec::with_capacity(self.config.vaults.len());
        for vault in &self.config.vaults {
            let pool = self
                .vault_apy(vault, prices, block)
                .await
                .with_context(|| format!("computing {} ({})", vault.label, vault.address))?;
            log::info!(
                "{}: tvl ${} apy {}% + {}%",
                pool.pool_meta,
                pool.tvl_usd.round_dp(2),
                pool.apy_base.round_dp(4),
                pool.apy_reward
            );
            pools.push(pool);
        }
        Ok(pools)
    }

    /// Computes the yield of a single vault as of `block`.
    pub async fn vault_apy(
        &self,
        vault: &VaultConfig,
        prices: &Prices,
        block: u64,
    ) -> Result<PoolResult> {
        let price = prices.require(vault.asset.address)?;
        let days = self.config.lookback_days;

        let (now, then) = self.snapshots(vault, prices, block).await?;

        let share_price_now = now.share_price(vault, price)?;
        let share_price_before = then.share_price(vault, price)?;
        log::debug!(
            "{}: share price {share_price_before} @ {} -> {share_price_now} @ {}",
            vault.label,
            then.block,
            now.block
        );
        let apy_base = apy::apy_base(share_price_now, share_price_before, days)
            .with_context(|| format!("{} base apy", vault.label))?;

        Ok(PoolResult {
            pool: format!("{}-{}", vault.address, self.config.chain),
            chain: self.config.chain,
            project: PROJECT.to_owned(),
            symbol: vault.asset.symbol.clone(),
            tvl_usd: now.tvl_usd(vault, price)?,
            underlying_tokens: vec![vault.asset.address],
            reward_tokens: vec![self.config.promotional_token],
            apy_base,
            apy_reward: self.config.promotional_apy,
            pool_meta: vault.label.clone(),
            url: APP_URL.to_owned(),
        })
    }

    /// Reads the vault at `block` and at the start of the lookback window, in that
    /// order.
    pub async fn snapshots(
        &self,
        vault: &VaultConfig,
        prices: &Prices,
        block: u64,
    ) -> Result<(VaultSnapshot, VaultSnapshot)> {
        let before = blocks_ago(block, self.config.lookback_blocks());
        let now = self.snapshot(vault, prices, block).await?;
        let then = self.snapshot(vault, prices, before).await?;
        Ok((now, then))
    }

    /// Reads the vault's assets, shares and, if it accrues rewards, its reward
    /// position at `block`.
    pub async fn snapshot(
        &self,
        vault: &VaultConfig,
        prices: &Prices,
        block: u64,
    ) -> Result<VaultSnapshot> {
        let erc4626 = IERC4626::new(vault.address, self.provider.clone());
        let total_assets = erc4626
            .totalAssets()
            .block(BlockId::number(block))
            .call()
            .await?;
        let total_shares = erc4626
            .totalSupply()
            .block(BlockId::number(block))
            .call()
            .await?;

        let reward_usd = if vault.reward_accrual {
            Some(self.reward_usd(vault.address, prices, block).await?)
        } else {
            None
        };

        Ok(VaultSnapshot {
            block,
            total_assets,
            total_shares,
            reward_usd,
        })
    }

    /// USD value of the reward asset `holder` owns plus what it can claim from the
    /// reward pool, at `block`.
    pub async fn reward_usd(&self, holder: Address, prices: &Prices, block: u64) -> Result<Decimal> {
        let price = prices.require(self.config.reward_asset)?;
        let token = ERC20::new(self.config.reward_asset, self.provider.clone());
        let pool = IStabilityPool::new(self.config.reward_pool, self.provider.clone());

        let balance = token
            .balanceOf(holder)
            .block(BlockId::number(block))
            .call()
            .await?;
        let gain = pool
            .getDepositorLQTYGain(holder)
            .block(BlockId::number(block))
            .call()
            .await?;

        apy::reward_usd(balance, gain, price)
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::Bytes, providers::ProviderBuilder, sol_types::SolValue,
        transports::mock::Asserter,
    };
    use rust_decimal::dec;

    use super::{
        contracts::{AMBER, EMERALD, LQTY, LUSD, OPAL, QUARTZ, USDC, WETH},
        *,
    };

    const E18: u128 = 1_000_000_000_000_000_000;

    fn prices() -> Prices {
        [
            (LUSD, dec!(1.0)),
            (USDC, dec!(1.0)),
            (WETH, dec!(2000)),
            (LQTY, dec!(2.0)),
        ]
        .into_iter()
        .collect()
    }

    fn push(asserter: &Asserter, value: u128) {
        let encoded = Bytes::from(U256::from(value).abi_encode());
        asserter.push_success(&encoded);
    }

    fn client(asserter: &Asserter) -> Client<impl Provider> {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone());
        Client::new(provider, Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_default_set() {
        let asserter = Asserter::new();

        // Amber: now
        push(&asserter, 1000 * E18); // totalAssets
        push(&asserter, 1000 * E18); // totalSupply
        push(&asserter, 100 * E18); // LQTY balance
        push(&asserter, 50 * E18); // LQTY gain
        // Amber: a week ago
        push(&asserter, 1000 * E18);
        push(&asserter, 1000 * E18);
        push(&asserter, 0);
        push(&asserter, 0);

        // Opal
        push(&asserter, 1_070_000_000);
        push(&asserter, 1_000_000_000);
        push(&asserter, 1_000_000_000);
        push(&asserter, 1_000_000_000);

        // Emerald, no shares a week ago
        push(&asserter, 5 * E18);
        push(&asserter, 5 * E18);
        push(&asserter, 0);
        push(&asserter, 0);

        let pools = client(&asserter)
            .apy_with(&prices(), 20_000_000)
            .await
            .unwrap();

        assert_eq!(pools.len(), 3);
        for (pool, vault) in pools.iter().zip([AMBER, OPAL, EMERALD]) {
            assert_eq!(pool.pool, format!("{vault}-ethereum"));
            assert_eq!(pool.chain, Chain::Ethereum);
            assert_eq!(pool.chain.to_string(), "ethereum");
            assert_eq!(pool.project, "sandclock");
            assert_eq!(pool.apy_reward, dec!(15));
            assert_eq!(pool.reward_tokens, [QUARTZ]);
            assert_eq!(pool.url, APP_URL);
        }

        let [amber, opal, emerald] = &pools[..] else {
            unreachable!()
        };

        // (1000 + 300) / 1000 against 1000 / 1000
        assert_eq!(amber.symbol, "LUSD");
        assert_eq!(amber.pool_meta, "Amber");
        assert_eq!(amber.tvl_usd, dec!(1300));
        assert_eq!(amber.apy_base.round_dp(4), dec!(1564.2857));
        assert_eq!(amber.underlying_tokens, [LUSD]);

        assert_eq!(opal.symbol, "USDC");
        assert_eq!(opal.tvl_usd, dec!(1070));
        assert_eq!(opal.apy_base, dec!(365));

        assert_eq!(emerald.symbol, "WETH");
        assert_eq!(emerald.tvl_usd, dec!(10000));
        assert_eq!(emerald.apy_base, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_reward_usd() {
        let asserter = Asserter::new();
        push(&asserter, 100 * E18);
        push(&asserter, 50 * E18);

        let value = client(&asserter)
            .reward_usd(AMBER, &prices(), 20_000_000)
            .await
            .unwrap();
        assert_eq!(value, dec!(300));
    }

    #[tokio::test]
    async fn test_zero_shares() {
        let asserter = Asserter::new();
        push(&asserter, 0);
        push(&asserter, 0);
        push(&asserter, 0);
        push(&asserter, 0);

        let client = client(&asserter);
        let vault = &client.config().vaults[1];
        let pool = client.vault_apy(vault, &prices(), 100).await.unwrap();
        assert_eq!(pool.apy_base, Decimal::ZERO);
        assert_eq!(pool.tvl_usd, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_snapshot_blocks() {
        let asserter = Asserter::new();
        for value in [1_070_000_000, 1_000_000_000, 1_000_000_000, 1_000_000_000] {
            push(&asserter, value);
        }

        let client = client(&asserter);
        let opal = &client.config().vaults[1];
        let (now, then) = client.snapshots(opal, &prices(), 20_000_000).await.unwrap();
        assert_eq!(now.block, 20_000_000);
        assert_eq!(then.block, 20_000_000 - BLOCKS_PER_DAY * LOOKBACK_DAYS);
        assert_eq!(now.total_assets, U256::from(1_070_000_000u64));
        assert_eq!(then.total_assets, U256::from(1_000_000_000u64));

        // a window reaching past genesis starts at block 0
        for _ in 0..4 {
            push(&asserter, 0);
        }
        let (now, then) = client.snapshots(opal, &prices(), 100).await.unwrap();
        assert_eq!(now.block, 100);
        assert_eq!(then.block, 0);
    }

    #[tokio::test]
    async fn test_dust_history() {
        let asserter = Asserter::new();
        // Emerald now: 20 WETH over 1 share
        push(&asserter, 20 * E18);
        push(&asserter, E18);
        // a week ago: 1 wei over 10^10 shares
        push(&asserter, 1);
        push(&asserter, 10_000_000_000 * E18);

        let client = client(&asserter);
        let emerald = &client.config().vaults[2];
        let err = client
            .vault_apy(emerald, &prices(), 20_000_000)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Emerald"));
    }

    #[tokio::test]
    async fn test_missing_price() {
        let asserter = Asserter::new();
        let prices: Prices = [(LUSD, dec!(1.0))].into_iter().collect();

        // Amber reads its LQTY position, which has no price
        for _ in 0..2 {
            push(&asserter, E18);
        }
        let err = client(&asserter)
            .apy_with(&prices, 20_000_000)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("no USD price"));
    }

    #[tokio::test]
    async fn test_rpc_failure_aborts() {
        let asserter = Asserter::new();
        push(&asserter, E18);
        asserter.push_failure_msg("node unreachable");

        let result = client(&asserter).apy_with(&prices(), 20_000_000).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_share_price() {
        let config = Config::default();
        let amber = &config.vaults[0];
        let snapshot = VaultSnapshot {
            block: 1,
            total_assets: U256::from(1000 * E18),
            total_shares: U256::from(1000 * E18),
            reward_usd: Some(dec!(300)),
        };
        assert_eq!(snapshot.share_price(amber, dec!(1.0)).unwrap(), dec!(1.3));
        assert_eq!(snapshot.tvl_usd(amber, dec!(1.0)).unwrap(), dec!(1300));

        // native units ignore both the price and any reward value
        let opal = &config.vaults[1];
        let snapshot = VaultSnapshot {
            block: 1,
            total_assets: U256::from(2_000_000u64),
            total_shares: U256::from(1_000_000u64),
            reward_usd: None,
        };
        assert_eq!(snapshot.share_price(opal, dec!(3.0)).unwrap(), dec!(2));
        assert_eq!(snapshot.tvl_usd(opal, dec!(3.0)).unwrap(), dec!(6));
    }

    #[test]
    fn test_pool_result_json() {
        let pool = PoolResult {
            pool: format!("{OPAL}-ethereum"),
            chain: Chain::Ethereum,
            project: PROJECT.to_owned(),
            symbol: "USDC".to_owned(),
            tvl_usd: dec!(1000),
            underlying_tokens: vec![USDC],
            reward_tokens: vec![QUARTZ],
            apy_base: dec!(365),
            apy_reward: dec!(15),
            pool_meta: "Opal".to_owned(),
            url: APP_URL.to_owned(),
        };
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["chain"], "ethereum");
        assert_eq!(json["tvlUsd"], 1000.0);
        assert_eq!(json["apyBase"], 365.0);
        assert_eq!(json["apyReward"], 15.0);
        assert_eq!(json["poolMeta"], "Opal");
        assert!(json["underlyingTokens"].is_array());
    }
}
