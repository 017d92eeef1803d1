//! USD price lookup.
//!
//! Prices come from the DefiLlama coins API, queried in a single batch request of
//! chain-qualified addresses:
//!
//! ```text
//! GET https://coins.llama.fi/prices/current/ethereum:0xA0b8…,ethereum:0x5f98…
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sandclock_yield::{Address, evm::Chain, prices::PriceClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let usdc: Address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse()?;
//! let prices = PriceClient::new(Chain::Ethereum)?.current(&[usdc]).await?;
//! println!("USDC: {}", prices.require(usdc)?);
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, time::Duration};

use alloy::primitives::Address;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::evm::Chain;

/// Default price service endpoint.
pub const DEFAULT_PRICES_URL: &str = "https://coins.llama.fi/prices/current/";

/// Returns [`DEFAULT_PRICES_URL`] as a [`Url`].
pub fn default_prices_url() -> Url {
    DEFAULT_PRICES_URL.parse().unwrap()
}

/// Price record as returned by the coins API.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinPrice {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CoinsResponse {
    coins: HashMap<String, CoinPrice>,
}

/// Current USD prices keyed by asset address.
///
/// Keys are stored as [`Address`], so the lowercase and checksummed spellings of an
/// address resolve to the same entry.
#[derive(Debug, Clone, Default)]
pub struct Prices {
    inner: HashMap<Address, Decimal>,
}

impl Prices {
    /// Builds the mapping from `chain:address` keyed records.
    ///
    /// Keys that are not chain-qualified, or whose address part does not parse, are
    /// rejected.
    pub fn from_coins<I>(coins: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, CoinPrice)>,
    {
        let mut inner = HashMap::new();
        for (key, coin) in coins {
            let (_, address) = key
                .split_once(':')
                .with_context(|| format!("price key {key} is not chain-qualified"))?;
            let address: Address = address
                .to_lowercase()
                .parse()
                .with_context(|| format!("price key {key} has an invalid address"))?;
            inner.insert(address, coin.price);
        }
        Ok(Self { inner })
    }

    /// Returns the price of `asset`, if the service reported one.
    #[must_use]
    pub fn get(&self, asset: Address) -> Option<Decimal> {
        self.inner.get(&asset).copied()
    }

    /// Returns the price of `asset` or fails naming the missing asset.
    pub fn require(&self, asset: Address) -> Result<Decimal> {
        self.get(asset)
            .with_context(|| format!("no USD price for {asset}"))
    }

    /// Inserts or replaces a price.
    pub fn insert(&mut self, asset: Address, price: Decimal) {
        self.inner.insert(asset, price);
    }

    /// Number of assets with a known price.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no price is known.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<(Address, Decimal)> for Prices {
    fn from_iter<T: IntoIterator<Item = (Address, Decimal)>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// HTTP client for the coins price API.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http_client: reqwest::Client,
    base_url: Url,
    chain: Chain,
}

impl PriceClient {
    /// Creates a client for `chain` against [`DEFAULT_PRICES_URL`].
    ///
    /// Fails when the TLS backend cannot be initialized.
    pub fn new(chain: Chain) -> Result<Self> {
        let base_url = default_prices_url();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()
            .context("building price service http client")?;

        Ok(Self {
            http_client,
            base_url,
            chain,
        })
    }

    /// Sets a custom base URL for this client.
    pub fn with_url(self, base_url: Url) -> Self {
        Self { base_url, ..self }
    }

    /// Returns the chain prices are requested for.
    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.chain
    }

    /// Builds the request URL for `assets`.
    pub fn url_for(&self, assets: &[Address]) -> Result<Url> {
        let coins = assets
            .iter()
            .map(|asset| format!("{}:{asset}", self.chain))
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} cannot be a base url", self.base_url))?
            .pop_if_empty()
            .push(&coins);
        Ok(url)
    }

    /// Fetches the current USD price of every asset in `assets`.
    ///
    /// A single request is made. Transport errors, non-success statuses and
    /// malformed bodies are returned as errors; nothing is retried.
    pub async fn current(&self, assets: &[Address]) -> Result<Prices> {
        let url = self.url_for(assets)?;
        log::debug!("fetching {} prices from {url}", assets.len());

        let res: CoinsResponse = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed price response")?;

        Prices::from_coins(res.coins)
    }
}
