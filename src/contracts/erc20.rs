// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! USDC allowance handling
//!
//! The relay contract pulls the burned amount from the sender, so the sender
//! must have approved it on the source domain's USDC before `cross`.

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::debug;

use Erc20::Erc20Instance;

/// Allowance reads and approvals on a token contract
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    pub fn new(token: Address, provider: P) -> Self {
        Self {
            instance: Erc20Instance::new(token, provider),
        }
    }

    /// Amount `spender` may currently pull from `owner`
    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, alloy_contract::Error> {
        let allowance = self.instance.allowance(owner, spender).call().await?;
        debug!(
            token = %self.instance.address(),
            owner = %owner,
            spender = %spender,
            allowance = %allowance,
            event = "allowance_read"
        );
        Ok(allowance)
    }

    /// Unsigned `approve(spender, amount)` sent from `owner`
    pub fn approve_transaction(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        self.instance
            .approve(spender, amount)
            .from(owner)
            .into_transaction_request()
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
);
