//! Print the current yield of the Sandclock vaults.
//!
//! # Usage
//!
//! ```bash
//! # JSON, as of the latest block
//! sandclock-apy --rpc-url https://eth.llamarpc.com
//!
//! # Table, as of a past block
//! sandclock-apy --block 19000000 --format table
//! ```

use std::io::{Write, stdout};

use clap::{Parser, ValueEnum};
use sandclock_yield::{
    evm::DEFAULT_RPC_URL,
    prices::DEFAULT_PRICES_URL,
    sandclock::{Client, Config, PoolResult},
};
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ethereum RPC url
    #[arg(short, long, env = "ETH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
    /// Price service url
    #[arg(long, default_value = DEFAULT_PRICES_URL)]
    prices_url: Url,
    /// Compute as of this block instead of the latest one
    #[arg(short, long)]
    block: Option<u64>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: log::Level,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let _ = simple_logger::init_with_level(args.log_level);

    log::info!("Connecting to RPC endpoint: {}", args.rpc_url);

    let config = Config::default()
        .with_rpc_url(args.rpc_url)
        .with_prices_url(args.prices_url);
    let client = Client::from_config(config).await?;

    let pools = match args.block {
        Some(block) => client.apy_at(block).await?,
        None => client.apy().await?,
    };

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&pools)?),
        Format::Table => print_table(&pools)?,
    }

    Ok(())
}

fn print_table(pools: &[PoolResult]) -> anyhow::Result<()> {
    let mut writer = tabwriter::TabWriter::new(stdout());

    writeln!(&mut writer, "pool\tsymbol\ttvl usd\tapy base\tapy reward")?;
    for pool in pools {
        writeln!(
            &mut writer,
            "{}\t{}\t{}\t{}\t{}",
            pool.pool_meta,
            pool.symbol,
            pool.tvl_usd.round_dp(2),
            pool.apy_base.round_dp(4),
            pool.apy_reward,
        )?;
    }

    writer.flush()?;

    Ok(())
}
