//! Sandclock and Liquity contracts.

use alloy::{
    primitives::{Address, address},
    sol,
};

/// Amber vault (LUSD, earns LQTY through the Liquity stability pool).
pub const AMBER: Address = address!("0xdb369eEB33fcfDCd1557E354dDeE7d6cF3146A11");
/// Emerald vault (WETH).
pub const EMERALD: Address = address!("0x4c406C068106375724275Cbff028770C544a1333");
/// Opal vault (USDC).
pub const OPAL: Address = address!("0x096697720056886b905D0DEB0f06AfFB8e4665E5");

pub const LUSD: Address = address!("0x5f98805A4E8be255a32880FDeC7F6728C6568bA0");
pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const LQTY: Address = address!("0x6DEA81C8171D0bA574754EF6F8b412F2Ed88c54D");

/// QUARTZ, airdropped to depositors of every vault.
pub const QUARTZ: Address = address!("0xbA8A621b4a54e61C442F5Ec623687e2a942225ef");

pub const LIQUITY_STABILITY_POOL: Address = address!("0x66017D22b0f8556afDd19FC67041899Eb65a21bb");

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface IStabilityPool {
        function getDepositorLQTYGain(address depositor) external view returns (uint256);
    }
}
