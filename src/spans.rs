//! OpenTelemetry-style span helpers for relay operations
//!
//! Span names are static and attributes are structured, so traces can be
//! grouped by operation regardless of which transfer produced them. The
//! orchestrator attaches these spans with `Instrument`; the helpers are public
//! for callers who drive the lower layers directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use cctp_relay::{spans, Domain};
//! use alloy_primitives::TxHash;
//!
//! let span = spans::await_attestation(TxHash::ZERO, Domain::ARBITRUM, 30, 60);
//! let _guard = span.enter();
//! ```

use alloy_primitives::{TxHash, U256};
use tracing::Span;
use uuid::Uuid;

use crate::protocol::Domain;

/// Span for building and submitting a transfer on the source chain.
///
/// Parent: caller
/// Children: source chain RPC calls
#[inline]
pub fn initiate(
    transfer_id: Uuid,
    source_domain: Domain,
    destination_domain: Domain,
    amount: &U256,
) -> Span {
    tracing::info_span!(
        "cctp_relay.initiate",
        transfer_id = %transfer_id,
        source_domain = %source_domain,
        destination_domain = %destination_domain,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for the whole polling loop of one transfer.
///
/// Parent: cctp_relay.relay or caller
/// Children: cctp_relay.poll_attestation (one per attempt)
#[inline]
pub fn await_attestation(
    tx_hash: TxHash,
    source_domain: Domain,
    max_attempts: u32,
    poll_interval_secs: u64,
) -> Span {
    tracing::info_span!(
        "cctp_relay.await_attestation",
        tx_hash = %tx_hash,
        source_domain = %source_domain,
        max_attempts = max_attempts,
        poll_interval_secs = poll_interval_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for a single query to the attestation authority.
///
/// Parent: cctp_relay.await_attestation
/// Children: HTTP client spans
#[inline]
pub fn poll_attestation(tx_hash: TxHash, attempt: u32) -> Span {
    tracing::debug_span!(
        "cctp_relay.poll_attestation",
        tx_hash = %tx_hash,
        attempt = attempt,
    )
}

/// Span for delivering an attested message on the destination chain.
///
/// Parent: cctp_relay.relay or caller
/// Children: destination chain RPC calls
#[inline]
pub fn finalize(transfer_id: Uuid, destination_domain: Domain, attestation_length: usize) -> Span {
    tracing::info_span!(
        "cctp_relay.finalize",
        transfer_id = %transfer_id,
        destination_domain = %destination_domain,
        attestation_length_bytes = attestation_length,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span wrapping an end-to-end relay.
#[inline]
pub fn relay(source_domain: Domain, destination_domain: Domain) -> Span {
    tracing::info_span!(
        "cctp_relay.relay",
        source_domain = %source_domain,
        destination_domain = %destination_domain,
        transfer_id = tracing::field::Empty,
    )
}

/// Record error attributes on the current span.
///
/// - error.type: the leading segment of the error message
/// - error.message: the full message
/// - error.source: the underlying cause, when present
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    let message = error.to_string();
    current_span.record(
        "error.type",
        message.split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
