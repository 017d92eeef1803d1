//! Share price, APY and TVL arithmetic.
//!
//! All functions here are pure: on-chain reads happen in [`super::Client`], these
//! only combine the numbers.

use alloy::primitives::U256;
use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::evm::from_wei;

/// Decimals of the reward asset (LQTY).
pub const REWARD_DECIMALS: u8 = 18;

const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Assets per share, zero when no shares are outstanding.
pub fn share_price(assets: Decimal, shares: Decimal) -> Result<Decimal> {
    if shares.is_zero() {
        return Ok(Decimal::ZERO);
    }
    assets
        .checked_div(shares)
        .with_context(|| format!("share price {assets} / {shares} out of range"))
}

/// Linear annualization of the share price growth over `days`, in percent.
///
/// `(now - before) * 365 / days / before * 100`. Returns zero when there is no
/// historical share price or the window is empty, and an error when the growth
/// does not fit a [`Decimal`].
pub fn apy_base(now: Decimal, before: Decimal, days: u64) -> Result<Decimal> {
    if before.is_zero() || days == 0 {
        return Ok(Decimal::ZERO);
    }
    now.checked_sub(before)
        .and_then(|growth| growth.checked_mul(DAYS_PER_YEAR))
        .and_then(|growth| growth.checked_div(Decimal::from(days)))
        .and_then(|growth| growth.checked_div(before))
        .and_then(|growth| growth.checked_mul(HUNDRED))
        .with_context(|| format!("apy from {before} to {now} over {days} days out of range"))
}

/// USD value of a raw token amount: `amount * price / 10^decimals`.
pub fn usd_value(amount: U256, decimals: u8, price: Decimal) -> Result<Decimal> {
    let amount = from_wei(amount, decimals.into())?;
    amount
        .checked_mul(price)
        .with_context(|| format!("{amount} at ${price} out of range"))
}

/// USD value of the reward asset held by a vault plus its unclaimed gain.
pub fn reward_usd(balance: U256, gain: U256, price: Decimal) -> Result<Decimal> {
    usd_value(balance.saturating_add(gain), REWARD_DECIMALS, price)
}
