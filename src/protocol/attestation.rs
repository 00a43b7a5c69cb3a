use alloy_primitives::{hex::FromHex, Bytes, TxHash};
use serde::{Deserialize, Deserializer};

use super::Domain;

/// Identifies one submitted transfer at the attestation authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttestationRequest {
    pub source_domain: Domain,
    pub transaction_hash: TxHash,
}

impl AttestationRequest {
    pub fn new(source_domain: Domain, transaction_hash: TxHash) -> Self {
        Self {
            source_domain,
            transaction_hash,
        }
    }
}

/// A completed attestation: the message as seen by the authority and the
/// signature blob that authorizes it on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub status: AttestationStatus,
    pub message: Bytes,
    pub attestation: Bytes,
}

/// Response body of `GET /v2/messages/{sourceDomain}?transactionHash={txHash}`
///
/// A single transaction may emit several `MessageSent` events, so the
/// authority answers with a list.
///
/// ```json
/// {
///   "messages": [
///     { "status": "complete", "message": "0x...", "attestation": "0x..." }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<AttestationMessage>,
}

/// One entry of [`MessagesResponse`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationMessage {
    pub status: AttestationStatus,

    #[serde(default, deserialize_with = "deserialize_optional_bytes_or_pending")]
    pub message: Option<Bytes>,

    /// Null or the string `"PENDING"` until the status is complete
    #[serde(default, deserialize_with = "deserialize_optional_bytes_or_pending")]
    pub attestation: Option<Bytes>,
}

/// Circle's API returns the string `"PENDING"` instead of `null` for byte
/// fields that are not ready yet; both are read as `None`, as is `""`.
fn deserialize_optional_bytes_or_pending<'de, D>(
    deserializer: D,
) -> Result<Option<Bytes>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;

    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("pending") => Ok(None),
        Some(s) => {
            let bytes = Bytes::from_hex(s).map_err(serde::de::Error::custom)?;
            Ok(Some(bytes))
        }
    }
}

/// Attestation lifecycle as reported by the authority
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttestationStatus {
    Pending,
    PendingConfirmations,
    Complete,
}

impl AttestationStatus {
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}
