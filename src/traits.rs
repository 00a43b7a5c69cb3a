//! Seams between the relay and the outside world.
//!
//! The attestation authority, both chains and time itself sit behind traits so
//! the orchestrator can be driven entirely by fakes in tests, including
//! adversarial sequences such as status regressions, reverts and timeouts.
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use cctp_relay::{SourceChain, TransferIntent, Result};
//! use alloy_primitives::TxHash;
//!
//! struct AlwaysSubmits(TxHash);
//!
//! #[async_trait::async_trait]
//! impl SourceChain for AlwaysSubmits {
//!     async fn submit(&self, _intent: &TransferIntent) -> Result<TxHash> {
//!         Ok(self.0)
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use alloy_primitives::{Bytes, TxHash, B256, U256};
use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{AttestationRequest, Domain, FinalityThreshold, Message, MessagesResponse};

/// Trait for querying the attestation authority.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Messages not indexed yet (404)
/// - Rate limiting and other transient failures
/// - State transitions (Pending → PendingConfirmations → Complete)
/// - Status regressions after completion
#[async_trait]
pub trait AttestationProvider: Send + Sync {
    /// Fetches the messages emitted by one source transaction.
    ///
    /// Returns `Ok(None)` when the authority has not seen the transaction yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the authority answers with a
    /// non-success status other than 404, or the body cannot be parsed.
    async fn fetch_messages(&self, request: &AttestationRequest)
        -> Result<Option<MessagesResponse>>;
}

/// Trait for time-based operations.
///
/// Lets tests advance through polling loops and deadlines without waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;
}

/// Everything the source chain needs to burn USDC and emit the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub source_domain: Domain,
    pub destination_domain: Domain,
    pub mint_recipient: B256,
    pub burn_token: B256,
    pub destination_caller: B256,
    pub amount: U256,
    pub max_fee: U256,
    pub min_finality_threshold: FinalityThreshold,
    /// The message the transmitter is expected to emit for this burn
    pub encoded_message: Bytes,
}

/// Submits transfers on the source chain.
#[async_trait]
pub trait SourceChain: Send + Sync {
    /// Sends the burn transaction and returns its hash once accepted.
    async fn submit(&self, intent: &TransferIntent) -> Result<TxHash>;

    /// Whether `submit` puts the burn body's hook data on chain.
    fn carries_hook_data(&self) -> bool {
        false
    }
}

/// Attested message ready to be delivered on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    pub destination_domain: Domain,
    pub message: Bytes,
    pub attestation: Bytes,
    /// Nested instruction carried in the burn hook, if it decoded cleanly
    pub hook: Option<Message>,
}

/// Result of a delivery attempt that reached the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Received { tx_hash: TxHash },
    Reverted { reason: String },
}

/// Delivers attested messages on the destination chain.
#[async_trait]
pub trait DestinationChain: Send + Sync {
    /// Submits the message and attestation.
    ///
    /// A contract rejection is reported as [`ReceiveOutcome::Reverted`];
    /// transport problems surface as errors and may be retried.
    async fn receive(&self, request: &ReceiveRequest) -> Result<ReceiveOutcome>;
}
