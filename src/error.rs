use thiserror::Error;

use crate::protocol::Domain;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Malformed field: {0}")]
    Format(String),

    #[error("Unknown domain: {domain}")]
    UnknownDomain { domain: Domain },

    #[error("Untrusted sender {sender} for domain {domain}")]
    UntrustedSender { domain: Domain, sender: String },

    #[error("Timeout waiting for attestation after {attempts} attempts")]
    AttestationTimeout { attempts: u32 },

    #[error("Protocol invariant violated: {0}")]
    ProtocolInvariant(String),

    #[error("Transient transport error: {0}")]
    TransientTransport(String),

    #[error("Source chain for {domain} cannot carry hook data")]
    HookUnsupported { domain: Domain },

    #[error("Source chain submission failed: {0}")]
    SourceSubmission(String),

    #[error("Destination chain reverted: {reason}")]
    DestinationReverted { reason: String },

    #[error("Invalid transition from {from} for operation {operation}")]
    InvalidTransition {
        from: &'static str,
        operation: &'static str,
    },

    #[error("Unknown transfer: {0}")]
    UnknownTransfer(uuid::Uuid),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("Contract error: {0}")]
    Contract(#[from] alloy_contract::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

impl RelayError {
    /// Errors that move a transfer to `Failed` and must not be retried automatically.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UntrustedSender { .. }
                | Self::ProtocolInvariant(_)
                | Self::DestinationReverted { .. }
                | Self::SourceSubmission(_)
        )
    }

    /// Errors after which the caller may re-issue the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AttestationTimeout { .. }
                | Self::TransientTransport(_)
                | Self::Network(_)
                | Self::Rpc(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let untrusted = RelayError::UntrustedSender {
            domain: Domain::ARBITRUM,
            sender: "0x01".to_string(),
        };
        assert!(untrusted.is_fatal());
        assert!(!untrusted.is_retryable());

        let timeout = RelayError::AttestationTimeout { attempts: 3 };
        assert!(!timeout.is_fatal());
        assert!(timeout.is_retryable());

        assert!(RelayError::ProtocolInvariant("regressed".into()).is_fatal());
        assert!(!RelayError::Decoding("short".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        insta::assert_snapshot!(
            RelayError::UnknownDomain { domain: Domain::UNICHAIN }.to_string(),
            @"Unknown domain: Unichain (10)"
        );
        insta::assert_snapshot!(
            RelayError::AttestationTimeout { attempts: 30 }.to_string(),
            @"Timeout waiting for attestation after 30 attempts"
        );
    }
}
