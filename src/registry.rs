// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Domain registry
//!
//! Maps each CCTP domain to the relay contract trusted to send and receive on
//! it, together with the per-domain deployment record (token, messenger,
//! transmitter). The registry is read on every relay and written rarely, so it
//! sits behind a read-write lock and is shared as `Arc<DomainRegistry>`.

use std::collections::HashMap;

use alloy_chains::NamedChain;
use alloy_primitives::{address, Address, B256};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RelayError, Result};
use crate::protocol::{address_word, Domain};

/// TokenMessengerV2, identical on every v2 testnet
pub const CCTP_V2_TOKEN_MESSENGER_TESTNET: Address =
    address!("8FE6B999Dc680CcFDD5Bf7EB0974218be2542DAA");

/// MessageTransmitterV2, identical on every v2 testnet
pub const CCTP_V2_MESSAGE_TRANSMITTER_TESTNET: Address =
    address!("E737e5cEBEEBa77EFE34D4aa090756590b1CE275");

/// Deployment record for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    pub domain: Domain,
    pub name: String,
    pub chain_id: u64,
    /// Relay contract registered as the trusted counterpart on this domain
    pub relay_contract: Address,
    /// USDC token burned when sending from this domain
    pub usdc: Address,
    #[serde(default = "default_token_messenger")]
    pub token_messenger: Address,
    #[serde(default = "default_message_transmitter")]
    pub message_transmitter: Address,
}

fn default_token_messenger() -> Address {
    CCTP_V2_TOKEN_MESSENGER_TESTNET
}

fn default_message_transmitter() -> Address {
    CCTP_V2_MESSAGE_TRANSMITTER_TESTNET
}

impl DomainConfig {
    pub fn named_chain(&self) -> Option<NamedChain> {
        NamedChain::try_from(self.chain_id).ok()
    }

    pub fn is_testnet(&self) -> bool {
        self.named_chain().is_some_and(|chain| chain.is_testnet())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    contract: B256,
    config: Option<DomainConfig>,
}

/// Thread-safe domain → trusted contract mapping
#[derive(Debug, Default)]
pub struct DomainRegistry {
    entries: RwLock<HashMap<Domain, Entry>>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arbitrum Sepolia (3) and Unichain Sepolia (10) relay deployments
    pub fn testnet() -> Self {
        let registry = Self::new();
        registry.register_config(DomainConfig {
            domain: Domain::ARBITRUM,
            name: "Arbitrum Sepolia".to_string(),
            chain_id: 421614,
            relay_contract: address!("B6B844a63A9a42E1Dd4Ed086A1dcb8F6D16548fD"),
            usdc: address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
            token_messenger: CCTP_V2_TOKEN_MESSENGER_TESTNET,
            message_transmitter: CCTP_V2_MESSAGE_TRANSMITTER_TESTNET,
        });
        registry.register_config(DomainConfig {
            domain: Domain::UNICHAIN,
            name: "Unichain Sepolia".to_string(),
            chain_id: 1301,
            relay_contract: address!("641f96430147673E97C527BDEeb372f5995CF817"),
            usdc: address!("31d0220469e10c4E71834a79b1f276d740d3768F"),
            token_messenger: CCTP_V2_TOKEN_MESSENGER_TESTNET,
            message_transmitter: CCTP_V2_MESSAGE_TRANSMITTER_TESTNET,
        });
        registry
    }

    /// Builds a registry from a JSON array of [`DomainConfig`]s.
    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<DomainConfig> = serde_json::from_str(json)?;
        let registry = Self::new();
        for config in configs {
            registry.register_config(config);
        }
        Ok(registry)
    }

    /// Registers (or replaces) the trusted contract for `domain`.
    pub fn register(&self, domain: Domain, contract: Address) {
        self.register_word(domain, address_word(contract));
    }

    /// Same as [`register`](Self::register) for contracts already in 32-byte form.
    pub fn register_word(&self, domain: Domain, contract: B256) {
        let mut entries = self.entries.write();
        let previous = entries.insert(
            domain,
            Entry {
                contract,
                config: None,
            },
        );
        info!(
            domain = %domain,
            contract = %contract,
            replaced = previous.is_some(),
            event = "domain_contract_registered"
        );
    }

    pub fn register_config(&self, config: DomainConfig) {
        let domain = config.domain;
        let contract = address_word(config.relay_contract);
        info!(
            domain = %domain,
            name = %config.name,
            chain_id = config.chain_id,
            contract = %contract,
            event = "domain_config_registered"
        );
        self.entries.write().insert(
            domain,
            Entry {
                contract,
                config: Some(config),
            },
        );
    }

    /// Returns the left-padded trusted contract for `domain`.
    pub fn resolve(&self, domain: Domain) -> Result<B256> {
        self.entries
            .read()
            .get(&domain)
            .map(|entry| entry.contract)
            .ok_or(RelayError::UnknownDomain { domain })
    }

    /// Returns the full deployment record for `domain`.
    pub fn config(&self, domain: Domain) -> Result<DomainConfig> {
        self.entries
            .read()
            .get(&domain)
            .and_then(|entry| entry.config.clone())
            .ok_or(RelayError::UnknownDomain { domain })
    }

    pub fn is_trusted_sender(&self, domain: Domain, sender: B256) -> bool {
        let trusted = self
            .entries
            .read()
            .get(&domain)
            .is_some_and(|entry| entry.contract == sender);
        debug!(
            domain = %domain,
            sender = %sender,
            trusted,
            event = "trusted_sender_checked"
        );
        trusted
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.entries.read().contains_key(&domain)
    }

    pub fn domains(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.entries.read().keys().copied().collect();
        domains.sort();
        domains
    }
}
