//! Test utilities and fake implementations of the relay seams
//!
//! These fakes drive the [`AttestationClient`](crate::AttestationClient) and
//! [`RelayOrchestrator`](crate::RelayOrchestrator) without a network: scripted
//! attestation sequences (including 404s, transport failures and status
//! regressions), a clock that advances instantly, and chains that record
//! every call.

use alloy_primitives::{keccak256, Bytes, TxHash, B256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::protocol::{AttestationMessage, AttestationRequest, AttestationStatus, MessagesResponse};
use crate::traits::{
    AttestationProvider, Clock, DestinationChain, ReceiveOutcome, ReceiveRequest, SourceChain,
    TransferIntent,
};
use crate::{RelayError, Result};

/// Revert reason reported when a message is delivered twice
pub const NONCE_ALREADY_USED: &str = "Nonce already used";

// ============================================================================
// Fake Attestation Provider
// ============================================================================

/// One scripted answer of the attestation authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// HTTP 404
    NotFound,
    /// A single message in a non-terminal state, without bytes
    Status(AttestationStatus),
    Complete { message: Bytes, attestation: Bytes },
    /// `complete` status with null byte fields
    CompleteWithoutBytes,
    /// Transport failure with the given description
    Error(String),
    /// Raw message list: (status, message, attestation)
    Messages(Vec<(AttestationStatus, Option<Bytes>, Option<Bytes>)>),
}

impl ScriptedResponse {
    pub fn complete(message: Bytes, attestation: Bytes) -> Self {
        Self::Complete {
            message,
            attestation,
        }
    }

    fn into_result(self) -> Result<Option<MessagesResponse>> {
        let entry = |status, message, attestation| AttestationMessage {
            status,
            message,
            attestation,
        };
        let messages = match self {
            Self::NotFound => return Ok(None),
            Self::Error(reason) => return Err(RelayError::TransientTransport(reason)),
            Self::Status(status) => vec![entry(status, None, None)],
            Self::Complete {
                message,
                attestation,
            } => vec![entry(
                AttestationStatus::Complete,
                Some(message),
                Some(attestation),
            )],
            Self::CompleteWithoutBytes => vec![entry(AttestationStatus::Complete, None, None)],
            Self::Messages(list) => list
                .into_iter()
                .map(|(status, message, attestation)| entry(status, message, attestation))
                .collect(),
        };
        Ok(Some(MessagesResponse { messages }))
    }
}

#[derive(Debug, Default)]
struct Script {
    responses: Vec<ScriptedResponse>,
    calls: usize,
}

/// Attestation authority answering from per-request scripts.
///
/// Each call returns the next scripted response; once the script is exhausted
/// the last response repeats. Requests without a script are not found.
#[derive(Clone, Debug, Default)]
pub struct FakeAttestationProvider {
    scripts: Arc<Mutex<HashMap<AttestationRequest, Script>>>,
}

impl FakeAttestationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, request: AttestationRequest, responses: Vec<ScriptedResponse>) -> Self {
        self.add_script(request, responses);
        self
    }

    /// Replaces the script for `request`, keeping its call count.
    pub fn add_script(&self, request: AttestationRequest, responses: Vec<ScriptedResponse>) {
        self.scripts.lock().entry(request).or_default().responses = responses;
    }

    /// Number of queries made for `request`
    pub fn call_count(&self, request: &AttestationRequest) -> usize {
        self.scripts
            .lock()
            .get(request)
            .map_or(0, |script| script.calls)
    }
}

#[async_trait]
impl AttestationProvider for FakeAttestationProvider {
    async fn fetch_messages(
        &self,
        request: &AttestationRequest,
    ) -> Result<Option<MessagesResponse>> {
        let mut scripts = self.scripts.lock();
        let script = scripts.entry(*request).or_default();
        let index = script.calls.min(script.responses.len().saturating_sub(1));
        script.calls += 1;

        match script.responses.get(index) {
            Some(response) => response.clone().into_result(),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
#[derive(Clone, Debug)]
pub struct FakeClock {
    start: Instant,
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        let start = Instant::now();
        Self {
            start,
            current_time: Arc::new(Mutex::new(start)),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *self.current_time.lock() += duration;
    }

    /// Time advanced since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.current_time.lock().duration_since(self.start)
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleep_log.lock().clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().len()
    }

    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().iter().sum()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *self.current_time.lock()
    }
}

// ============================================================================
// Fake Chains
// ============================================================================

/// Source chain that records intents and hands out sequential tx hashes.
#[derive(Clone, Debug, Default)]
pub struct FakeSourceChain {
    submissions: Arc<Mutex<Vec<TransferIntent>>>,
    failures: Arc<Mutex<VecDeque<String>>>,
    hookless: bool,
}

impl FakeSourceChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like a chain whose relay entry point has no hook argument.
    pub fn without_hook_data(mut self) -> Self {
        self.hookless = true;
        self
    }

    /// Makes the next submission fail with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.failures.lock().push_back(reason.into());
    }

    pub fn submissions(&self) -> Vec<TransferIntent> {
        self.submissions.lock().clone()
    }

    /// Hash returned for the `n`th successful submission (starting at 1)
    pub fn tx_hash_for(n: usize) -> TxHash {
        keccak256((n as u64).to_be_bytes())
    }
}

#[async_trait]
impl SourceChain for FakeSourceChain {
    async fn submit(&self, intent: &TransferIntent) -> Result<TxHash> {
        if let Some(reason) = self.failures.lock().pop_front() {
            return Err(RelayError::SourceSubmission(reason));
        }
        let mut submissions = self.submissions.lock();
        submissions.push(intent.clone());
        Ok(Self::tx_hash_for(submissions.len()))
    }

    fn carries_hook_data(&self) -> bool {
        !self.hookless
    }
}

/// Scripted behavior for one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeReceive {
    Received,
    Reverted(String),
    TransportError(String),
}

/// Destination chain that remembers delivered messages.
///
/// Delivering the same message bytes twice reverts with
/// [`NONCE_ALREADY_USED`], like the real transmitter. Scripted outcomes take
/// precedence over that rule.
#[derive(Clone, Debug, Default)]
pub struct FakeDestinationChain {
    requests: Arc<Mutex<Vec<ReceiveRequest>>>,
    script: Arc<Mutex<VecDeque<FakeReceive>>>,
    delivered: Arc<Mutex<HashSet<B256>>>,
}

impl FakeDestinationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, outcome: FakeReceive) {
        self.script.lock().push_back(outcome);
    }

    pub fn requests(&self) -> Vec<ReceiveRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Marks `message` as already delivered by someone else.
    pub fn mark_delivered(&self, message: &[u8]) {
        self.delivered.lock().insert(keccak256(message));
    }
}

#[async_trait]
impl DestinationChain for FakeDestinationChain {
    async fn receive(&self, request: &ReceiveRequest) -> Result<ReceiveOutcome> {
        self.requests.lock().push(request.clone());
        let message_hash = keccak256(&request.message);

        match self.script.lock().pop_front() {
            Some(FakeReceive::TransportError(reason)) => {
                return Err(RelayError::TransientTransport(reason))
            }
            Some(FakeReceive::Reverted(reason)) => return Ok(ReceiveOutcome::Reverted { reason }),
            Some(FakeReceive::Received) => {
                self.delivered.lock().insert(message_hash);
            }
            None => {
                if !self.delivered.lock().insert(message_hash) {
                    return Ok(ReceiveOutcome::Reverted {
                        reason: NONCE_ALREADY_USED.to_string(),
                    });
                }
            }
        }
        Ok(ReceiveOutcome::Received {
            tx_hash: keccak256(message_hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Domain;

    #[tokio::test]
    async fn test_fake_clock_tracks_sleep_calls() {
        let clock = FakeClock::new();

        clock.sleep(Duration::from_secs(60)).await;
        clock.sleep(Duration::from_secs(120)).await;

        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(180));
        assert_eq!(clock.elapsed(), Duration::from_secs(180));
    }

    #[tokio::test]
    async fn test_script_repeats_last_response() {
        let request = AttestationRequest::new(Domain::ARBITRUM, TxHash::repeat_byte(1));
        let provider = FakeAttestationProvider::new().with_script(
            request,
            vec![
                ScriptedResponse::NotFound,
                ScriptedResponse::Status(AttestationStatus::Pending),
            ],
        );

        assert!(provider.fetch_messages(&request).await.unwrap().is_none());
        for _ in 0..3 {
            let response = provider.fetch_messages(&request).await.unwrap().unwrap();
            assert_eq!(response.messages[0].status, AttestationStatus::Pending);
        }
        assert_eq!(provider.call_count(&request), 4);
    }

    #[tokio::test]
    async fn test_unscripted_request_is_not_found() {
        let provider = FakeAttestationProvider::new();
        let request = AttestationRequest::new(Domain::BASE, TxHash::ZERO);

        assert!(provider.fetch_messages(&request).await.unwrap().is_none());
        assert_eq!(provider.call_count(&request), 1);
    }

    #[tokio::test]
    async fn test_destination_rejects_duplicate_delivery() {
        let chain = FakeDestinationChain::new();
        let request = ReceiveRequest {
            destination_domain: Domain::UNICHAIN,
            message: Bytes::from_static(&[1, 2, 3]),
            attestation: Bytes::from_static(&[4]),
            hook: None,
        };

        assert!(matches!(
            chain.receive(&request).await.unwrap(),
            ReceiveOutcome::Received { .. }
        ));
        assert_eq!(
            chain.receive(&request).await.unwrap(),
            ReceiveOutcome::Reverted {
                reason: NONCE_ALREADY_USED.to_string()
            }
        );
        assert_eq!(chain.call_count(), 2);
    }
}
