// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Relay contract bindings
//!
//! The relay contract is deployed once per domain. On the source side `cross`
//! burns USDC through TokenMessengerV2 with the destination relay contract as
//! destination caller. On the destination side `receiveUSDC` forwards the
//! attested message to MessageTransmitterV2, and `receiveUSDCAndData` also
//! runs the hook carried in the burn body. Each instance only accepts messages
//! from counterparts whitelisted with `setValidContract`.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};

use crate::traits::TransferIntent;
use CctpRelayV2::CctpRelayV2Instance;

/// Transaction builder for one deployed relay contract
pub struct RelayContract<P: Provider<Ethereum>> {
    instance: CctpRelayV2Instance<P>,
}

impl<P: Provider<Ethereum>> RelayContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "relay_contract_initialized"
        );
        Self {
            instance: CctpRelayV2Instance::new(address, provider),
        }
    }

    /// `cross(...)` for the given intent, sent from `from`
    pub fn cross_transaction(&self, intent: &TransferIntent, from: Address) -> TransactionRequest {
        info!(
            from_address = %from,
            destination_domain = %intent.destination_domain,
            amount = %intent.amount,
            max_fee = %intent.max_fee,
            min_finality_threshold = intent.min_finality_threshold.as_u32(),
            contract_address = %self.instance.address(),
            event = "cross_transaction_created"
        );

        self.instance
            .cross(
                intent.amount,
                intent.destination_domain.as_u32(),
                intent.mint_recipient,
                Address::from_word(intent.burn_token),
                intent.destination_caller,
                intent.max_fee,
                intent.min_finality_threshold.as_u32(),
            )
            .from(from)
            .into_transaction_request()
    }

    /// `receiveUSDCAndData(message, attestation)`, sent from `from`
    pub fn receive_transaction(
        &self,
        message: Bytes,
        attestation: Bytes,
        from: Address,
    ) -> TransactionRequest {
        info!(
            message_len = message.len(),
            attestation_len = attestation.len(),
            from_address = %from,
            contract_address = %self.instance.address(),
            event = "receive_transaction_created"
        );

        self.instance
            .receiveUSDCAndData(message, attestation)
            .from(from)
            .into_transaction_request()
    }

    /// `receiveUSDC(message, attestation)` for messages without a hook, sent from `from`
    pub fn receive_usdc_transaction(
        &self,
        message: Bytes,
        attestation: Bytes,
        from: Address,
    ) -> TransactionRequest {
        info!(
            message_len = message.len(),
            attestation_len = attestation.len(),
            from_address = %from,
            contract_address = %self.instance.address(),
            event = "receive_usdc_transaction_created"
        );

        self.instance
            .receiveUSDC(message, attestation)
            .from(from)
            .into_transaction_request()
    }

    /// `setValidContract(counterpart, valid)`, sent from the contract owner
    pub fn set_valid_contract_transaction(
        &self,
        counterpart: B256,
        valid: bool,
        owner: Address,
    ) -> TransactionRequest {
        info!(
            counterpart = %counterpart,
            valid,
            contract_address = %self.instance.address(),
            event = "set_valid_contract_transaction_created"
        );

        self.instance
            .setValidContract(counterpart, valid)
            .from(owner)
            .into_transaction_request()
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

sol!(
    #[allow(clippy::too_many_arguments)]
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract CctpRelayV2 {
        function cross(
            uint256 amount,
            uint32 destinationDomain,
            bytes32 mintRecipient,
            address burnToken,
            bytes32 destinationCaller,
            uint256 maxFee,
            uint32 minFinalityThreshold
        ) external;

        function receiveUSDC(bytes message, bytes attestation) external returns (bool);

        function receiveUSDCAndData(bytes message, bytes attestation) external returns (bool);

        function setValidContract(bytes32 counterpart, bool valid) external;

        function validContracts(bytes32 counterpart) external view returns (bool);
    }
);
