//! Attestation polling
//!
//! Each request moves through `submitted → not found* → pending* → complete`.
//! Anything that goes wrong on the way to the authority (network errors,
//! unexpected status codes, rate limiting, undecodable bodies) is treated as
//! transient and retried after the normal interval. Once a request has been
//! seen complete it must stay complete.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::PollingConfig;
use crate::error::{RelayError, Result};
use crate::protocol::{Attestation, AttestationRequest, AttestationStatus};
use crate::spans;
use crate::traits::{AttestationProvider, Clock};

/// Result of a single round trip to the authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// `None` when the authority has not indexed the transaction yet
    StillPending(Option<AttestationStatus>),
    Complete(Attestation),
    TransientError(String),
}

impl PollOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Polls an [`AttestationProvider`] with delays supplied by a [`Clock`].
#[derive(Debug)]
pub struct AttestationClient<A, C> {
    provider: A,
    clock: C,
    completed: Mutex<HashSet<AttestationRequest>>,
}

impl<A: AttestationProvider, C: Clock> AttestationClient<A, C> {
    pub fn new(provider: A, clock: C) -> Self {
        Self {
            provider,
            clock,
            completed: Mutex::new(HashSet::new()),
        }
    }

    pub fn provider(&self) -> &A {
        &self.provider
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns true if `request` has been seen complete and not forgotten since.
    pub fn is_completed(&self, request: &AttestationRequest) -> bool {
        self.completed.lock().contains(request)
    }

    /// Drops the completion record for `request`.
    ///
    /// Regression checks for that request start over afterwards. Returns
    /// whether a record was held.
    pub fn forget(&self, request: &AttestationRequest) -> bool {
        let removed = self.completed.lock().remove(request);
        if removed {
            debug!(
                tx_hash = %request.transaction_hash,
                source_domain = %request.source_domain,
                event = "attestation_record_released"
            );
        }
        removed
    }

    /// Performs exactly one query for `request`.
    ///
    /// # Errors
    ///
    /// [`RelayError::ProtocolInvariant`] if a request previously reported
    /// complete comes back as anything else.
    pub async fn poll(&self, request: &AttestationRequest) -> Result<PollOutcome> {
        let outcome = match self.provider.fetch_messages(request).await {
            Ok(None) => PollOutcome::StillPending(None),
            Ok(Some(response)) => match response.messages.into_iter().next() {
                None => PollOutcome::StillPending(None),
                Some(entry) if entry.status.is_complete() => {
                    match (entry.message, entry.attestation) {
                        (Some(message), Some(attestation)) => PollOutcome::Complete(Attestation {
                            status: AttestationStatus::Complete,
                            message,
                            attestation,
                        }),
                        _ => PollOutcome::TransientError(
                            "complete attestation is missing message or attestation bytes"
                                .to_string(),
                        ),
                    }
                }
                Some(entry) => PollOutcome::StillPending(Some(entry.status)),
            },
            Err(e) => PollOutcome::TransientError(e.to_string()),
        };

        match &outcome {
            PollOutcome::Complete(_) => {
                self.completed.lock().insert(*request);
            }
            PollOutcome::StillPending(status) if self.completed.lock().contains(request) => {
                error!(
                    tx_hash = %request.transaction_hash,
                    source_domain = %request.source_domain,
                    status = ?status,
                    event = "attestation_status_regressed"
                );
                return Err(RelayError::ProtocolInvariant(format!(
                    "attestation for {} regressed from complete to {}",
                    request.transaction_hash,
                    status.map_or("not found".to_string(), |s| format!("{s:?}"))
                )));
            }
            _ => {}
        }

        Ok(outcome)
    }

    /// Polls until the attestation is complete or the budget is spent.
    ///
    /// Sleeps happen only between attempts, so `n` pending answers followed by
    /// a complete one cost `n + 1` polls and `n` sleeps. Dropping the returned
    /// future cancels the wait.
    ///
    /// # Errors
    ///
    /// [`RelayError::AttestationTimeout`] once `max_attempts` polls were made
    /// or the next sleep would overrun the deadline.
    pub async fn await_attestation(
        &self,
        request: &AttestationRequest,
        config: &PollingConfig,
    ) -> Result<Attestation> {
        let span = spans::await_attestation(
            request.transaction_hash,
            request.source_domain,
            config.max_attempts,
            config.poll_interval_secs,
        );
        self.poll_loop(request, config).instrument(span).await
    }

    async fn poll_loop(
        &self,
        request: &AttestationRequest,
        config: &PollingConfig,
    ) -> Result<Attestation> {
        let started = self.clock.now();
        let interval = config.poll_interval();

        info!(
            tx_hash = %request.transaction_hash,
            source_domain = %request.source_domain,
            event = "attestation_polling_started"
        );

        for attempt in 1..=config.max_attempts {
            let outcome = self
                .poll(request)
                .instrument(spans::poll_attestation(request.transaction_hash, attempt))
                .await
                .inspect_err(|e| spans::record_error(e))?;

            match outcome {
                PollOutcome::Complete(attestation) => {
                    info!(
                        attempt = attempt,
                        attestation_length_bytes = attestation.attestation.len(),
                        event = "attestation_complete"
                    );
                    return Ok(attestation);
                }
                PollOutcome::StillPending(None) => {
                    debug!(attempt = attempt, event = "attestation_not_found");
                }
                PollOutcome::StillPending(Some(status)) => {
                    debug!(attempt = attempt, status = ?status, event = "attestation_pending");
                }
                PollOutcome::TransientError(reason) => {
                    warn!(
                        attempt = attempt,
                        reason = %reason,
                        event = "attestation_poll_failed"
                    );
                }
            }

            if attempt == config.max_attempts {
                break;
            }
            if let Some(deadline) = config.deadline() {
                if self.clock.now().duration_since(started) + interval > deadline {
                    debug!(
                        attempt = attempt,
                        deadline_secs = deadline.as_secs(),
                        event = "attestation_deadline_reached"
                    );
                    return Err(self.timeout(attempt, config));
                }
            }
            self.clock.sleep(interval).await;
        }

        Err(self.timeout(config.max_attempts, config))
    }

    fn timeout(&self, attempts: u32, config: &PollingConfig) -> RelayError {
        spans::record_error_with_context(
            "AttestationTimeout",
            &format!("Attestation polling timed out after {attempts} attempts"),
            Some(&format!(
                "Poll interval: {} seconds",
                config.poll_interval_secs
            )),
        );
        error!(attempts = attempts, event = "attestation_timeout");
        RelayError::AttestationTimeout { attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Domain;
    use crate::testing::{FakeAttestationProvider, FakeClock, ScriptedResponse};
    use alloy_primitives::{Bytes, TxHash};
    use rstest::rstest;
    use std::time::Duration;

    fn request() -> AttestationRequest {
        AttestationRequest::new(Domain::ARBITRUM, TxHash::repeat_byte(0xab))
    }

    fn complete() -> ScriptedResponse {
        ScriptedResponse::complete(Bytes::from_static(&[1, 2, 3]), Bytes::from_static(&[9; 65]))
    }

    #[rstest]
    #[case::immediately(0)]
    #[case::after_one(1)]
    #[case::after_five(5)]
    #[tokio::test]
    async fn test_not_found_then_complete(#[case] not_found: usize) {
        let mut script = vec![ScriptedResponse::NotFound; not_found];
        script.push(complete());
        let provider = FakeAttestationProvider::new().with_script(request(), script);
        let clock = FakeClock::new();
        let client = AttestationClient::new(provider.clone(), clock.clone());

        let attestation = client
            .await_attestation(&request(), &PollingConfig::default())
            .await
            .unwrap();

        assert_eq!(attestation.message.as_ref(), &[1, 2, 3]);
        assert_eq!(provider.call_count(&request()), not_found + 1);
        assert_eq!(clock.sleep_count(), not_found);
        assert!(clock
            .sleeps()
            .iter()
            .all(|d| *d == Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_pending_statuses_then_complete() {
        let provider = FakeAttestationProvider::new().with_script(
            request(),
            vec![
                ScriptedResponse::Status(AttestationStatus::Pending),
                ScriptedResponse::Status(AttestationStatus::PendingConfirmations),
                complete(),
            ],
        );
        let clock = FakeClock::new();
        let client = AttestationClient::new(provider.clone(), clock.clone());

        client
            .await_attestation(&request(), &PollingConfig::fast_transfer())
            .await
            .unwrap();

        assert_eq!(provider.call_count(&request()), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(5); 2]);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let provider = FakeAttestationProvider::new().with_script(
            request(),
            vec![
                ScriptedResponse::Error("429 Too Many Requests".to_string()),
                ScriptedResponse::CompleteWithoutBytes,
                complete(),
            ],
        );
        let client = AttestationClient::new(provider.clone(), FakeClock::new());

        assert!(matches!(
            client.poll(&request()).await.unwrap(),
            PollOutcome::TransientError(_)
        ));
        assert!(matches!(
            client.poll(&request()).await.unwrap(),
            PollOutcome::TransientError(_)
        ));
        assert!(client.poll(&request()).await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_timeout_after_max_attempts() {
        let provider = FakeAttestationProvider::new()
            .with_script(request(), vec![ScriptedResponse::NotFound; 10]);
        let clock = FakeClock::new();
        let client = AttestationClient::new(provider.clone(), clock.clone());
        let config = PollingConfig::default().with_max_attempts(3);

        let err = client.await_attestation(&request(), &config).await.unwrap_err();

        assert!(matches!(err, RelayError::AttestationTimeout { attempts: 3 }));
        assert_eq!(provider.call_count(&request()), 3);
        assert_eq!(clock.sleep_count(), 2);
    }

    #[tokio::test]
    async fn test_deadline_stops_polling_early() {
        let provider = FakeAttestationProvider::new()
            .with_script(request(), vec![ScriptedResponse::NotFound; 10]);
        let clock = FakeClock::new();
        let client = AttestationClient::new(provider.clone(), clock.clone());
        let config = PollingConfig::default()
            .with_poll_interval_secs(10)
            .with_deadline_secs(25);

        let err = client.await_attestation(&request(), &config).await.unwrap_err();

        assert!(matches!(err, RelayError::AttestationTimeout { attempts: 3 }));
        assert_eq!(clock.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_regression_after_complete() {
        let provider = FakeAttestationProvider::new().with_script(
            request(),
            vec![
                complete(),
                ScriptedResponse::Status(AttestationStatus::Pending),
            ],
        );
        let client = AttestationClient::new(provider, FakeClock::new());

        assert!(client.poll(&request()).await.unwrap().is_complete());
        let err = client.poll(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::ProtocolInvariant(_)));
    }

    #[tokio::test]
    async fn test_forget_releases_completion_record() {
        let provider = FakeAttestationProvider::new().with_script(
            request(),
            vec![
                complete(),
                ScriptedResponse::Status(AttestationStatus::Pending),
            ],
        );
        let client = AttestationClient::new(provider, FakeClock::new());

        assert!(client.poll(&request()).await.unwrap().is_complete());
        assert!(client.is_completed(&request()));

        assert!(client.forget(&request()));
        assert!(!client.is_completed(&request()));
        assert!(!client.forget(&request()));

        // With the record gone a pending answer is ordinary again.
        assert_eq!(
            client.poll(&request()).await.unwrap(),
            PollOutcome::StillPending(Some(AttestationStatus::Pending))
        );
    }

    #[tokio::test]
    async fn test_first_message_is_used() {
        let provider = FakeAttestationProvider::new().with_script(
            request(),
            vec![ScriptedResponse::Messages(vec![
                (
                    AttestationStatus::Complete,
                    Some(Bytes::from_static(&[0xaa])),
                    Some(Bytes::from_static(&[0xbb])),
                ),
                (AttestationStatus::Pending, None, None),
            ])],
        );
        let client = AttestationClient::new(provider, FakeClock::new());

        let PollOutcome::Complete(attestation) = client.poll(&request()).await.unwrap() else {
            panic!("expected complete");
        };
        assert_eq!(attestation.message.as_ref(), &[0xaa]);
    }
}
