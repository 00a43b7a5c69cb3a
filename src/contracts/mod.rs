//! Contract bindings used by the production chain adapters
//!
//! - [`RelayContract`](relay::RelayContract): the per-domain relay contract
//!   (`cross`, `receiveUSDCAndData`, `setValidContract`)
//! - [`Erc20Contract`](erc20::Erc20Contract): USDC allowance checks and approvals

pub mod erc20;
pub mod relay;
