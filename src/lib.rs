//! # cctp-relay
//!
//! Cross-domain USDC relay on top of Circle's Cross-Chain Transfer Protocol
//! (CCTP) v2.
//!
//! A relay contract deployed on every participating domain burns USDC on the
//! source chain, Circle's attestation service signs the resulting message, and
//! the counterpart relay contract on the destination chain receives it. This
//! crate drives that lifecycle: it encodes and decodes the wire messages,
//! keeps track of which contract is trusted on which domain, polls for
//! attestations and finalizes transfers idempotently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use alloy_primitives::{address, U256};
//! use alloy_provider::ProviderBuilder;
//! use cctp_relay::providers::{
//!     AlloyDestinationChain, AlloySourceChain, IrisAttestationProvider, TokioClock,
//! };
//! use cctp_relay::{
//!     AttestationClient, Domain, DomainRegistry, RelayConfig, RelayOrchestrator, TransferParams,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::from_env()?;
//! let registry = Arc::new(DomainRegistry::testnet());
//! let sender = address!("7f7d7c8b1c8a2c5b1f0e3c1f4a9d7e2b3c4d0192");
//!
//! let arbitrum = ProviderBuilder::new().connect("http://localhost:8545").await?;
//! let unichain = ProviderBuilder::new().connect("http://localhost:8546").await?;
//!
//! let orchestrator = RelayOrchestrator::builder()
//!     .registry(Arc::clone(&registry))
//!     .attestation(AttestationClient::new(
//!         IrisAttestationProvider::from_config(&config),
//!         TokioClock::new(),
//!     ))
//!     .source(AlloySourceChain::new(arbitrum, sender, registry.config(Domain::ARBITRUM)?))
//!     .destination(AlloyDestinationChain::new(
//!         unichain,
//!         sender,
//!         registry.config(Domain::UNICHAIN)?,
//!     ))
//!     .polling(config.polling)
//!     .build();
//!
//! let params = TransferParams::builder()
//!     .source_domain(Domain::ARBITRUM)
//!     .destination_domain(Domain::UNICHAIN)
//!     .amount(U256::from(10_000))
//!     .mint_recipient(sender)
//!     .build();
//!
//! let transfer = orchestrator.relay(params).await?;
//! assert!(transfer.is_finalized());
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`Message`], [`BurnMessage`] and [`decode_message_to_hook_data`]: the wire codec
//! - [`DomainRegistry`] and [`DomainConfig`]: trusted counterpart contracts per domain
//! - [`AttestationClient`]: polling with an injected [`Clock`]
//! - [`RelayOrchestrator`]: the transfer state machine
//! - [`RelayError`] and [`Result`]: error handling
//! - [`providers`]: Alloy, Iris and Tokio implementations of the traits
//! - [`testing`]: fakes for every trait

mod attestation_client;
mod config;
mod contracts;
mod error;
mod protocol;
mod registry;
mod relay;
mod traits;

pub mod providers;
pub mod spans;
pub mod testing;

pub use attestation_client::{AttestationClient, PollOutcome};
pub use config::{
    IrisEnvironment, PollingConfig, RelayConfig, ENV_DEADLINE_SECS, ENV_IRIS_URL,
    ENV_MAX_ATTEMPTS, ENV_POLL_INTERVAL_SECS, IRIS_API, IRIS_API_SANDBOX, MESSAGES_PATH_V2,
};
pub use contracts::{erc20::Erc20Contract, relay::RelayContract};
pub use error::{RelayError, Result};
pub use protocol::{
    address_to_bytes32, address_word, bytes32_to_address, decode_message_to_hook_data,
    Attestation, AttestationMessage, AttestationRequest, AttestationStatus, BurnMessage, Domain,
    FinalityThreshold, Message, MessagesResponse, BURN_MESSAGE_VERSION, MAX_MESSAGE_BODY_SIZE,
    MESSAGE_VERSION,
};
pub use registry::{
    DomainConfig, DomainRegistry, CCTP_V2_MESSAGE_TRANSMITTER_TESTNET,
    CCTP_V2_TOKEN_MESSENGER_TESTNET,
};
pub use relay::{RelayOrchestrator, Transfer, TransferId, TransferParams, TransferState};
pub use traits::{
    AttestationProvider, Clock, DestinationChain, ReceiveOutcome, ReceiveRequest, SourceChain,
    TransferIntent,
};
