use std::fmt;

use alloy_primitives::{Address, TxHash, U256};
use bon::Builder;
use uuid::Uuid;

use crate::protocol::{Attestation, Domain, FinalityThreshold, Message};

pub type TransferId = Uuid;

/// Lifecycle of a relayed transfer
///
/// ```text
/// Built → SubmittedSource → AwaitingAttestation → Attested → SubmittedDest → Finalized
///   └──────────────┴──────────────┴──────────────┴──────────────┴──→ Failed { reason }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Built,
    SubmittedSource,
    AwaitingAttestation,
    Attested,
    SubmittedDest,
    Finalized,
    Failed { reason: String },
}

impl TransferState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Built => "Built",
            Self::SubmittedSource => "SubmittedSource",
            Self::AwaitingAttestation => "AwaitingAttestation",
            Self::Attested => "Attested",
            Self::SubmittedDest => "SubmittedDest",
            Self::Finalized => "Finalized",
            Self::Failed { .. } => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed { .. })
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "Failed ({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Parameters of a new outgoing transfer
///
/// ```rust
/// use cctp_relay::{Domain, TransferParams};
/// use alloy_primitives::{address, U256};
///
/// let params = TransferParams::builder()
///     .source_domain(Domain::ARBITRUM)
///     .destination_domain(Domain::UNICHAIN)
///     .amount(U256::from(10_000))
///     .mint_recipient(address!("7f7d7c8b1c8a2c5b1f0e3c1f4a9d7e2b3c4d0192"))
///     .build();
/// assert!(params.max_fee.is_zero());
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub source_domain: Domain,
    pub destination_domain: Domain,
    pub amount: U256,
    pub mint_recipient: Address,
    #[builder(default)]
    pub max_fee: U256,
    #[builder(default)]
    pub min_finality_threshold: FinalityThreshold,
    /// Nested instruction for the destination relay contract.
    ///
    /// Only accepted by source chains that can put hook data on chain; see
    /// [`SourceChain::carries_hook_data`](crate::SourceChain::carries_hook_data).
    pub hook: Option<Message>,
}

/// Snapshot of one transfer as tracked by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: TransferId,
    pub source_domain: Domain,
    pub destination_domain: Domain,
    /// Message built at initiation; `None` for resumed transfers
    pub intent: Option<Message>,
    pub source_tx_hash: Option<TxHash>,
    pub attestation: Option<Attestation>,
    /// Message as attested by the authority
    pub message: Option<Message>,
    pub hook: Option<Message>,
    pub destination_tx_hash: Option<TxHash>,
    pub state: TransferState,
}

impl Transfer {
    pub(crate) fn new(source_domain: Domain, destination_domain: Domain) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_domain,
            destination_domain,
            intent: None,
            source_tx_hash: None,
            attestation: None,
            message: None,
            hook: None,
            destination_tx_hash: None,
            state: TransferState::Built,
        }
    }

    /// Transferred amount, from the attested message when available.
    pub fn amount(&self) -> Option<U256> {
        self.message
            .as_ref()
            .or(self.intent.as_ref())
            .and_then(|message| message.burn_body().ok())
            .map(|body| body.amount)
    }

    pub fn is_finalized(&self) -> bool {
        self.state == TransferState::Finalized
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, TransferState::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TransferState::Built, false)]
    #[case(TransferState::AwaitingAttestation, false)]
    #[case(TransferState::SubmittedDest, false)]
    #[case(TransferState::Finalized, true)]
    #[case(TransferState::Failed { reason: "reverted".into() }, true)]
    fn test_terminal_states(#[case] state: TransferState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn test_state_display() {
        insta::assert_snapshot!(TransferState::Attested.to_string(), @"Attested");
        insta::assert_snapshot!(
            TransferState::Failed { reason: "untrusted sender".into() }.to_string(),
            @"Failed (untrusted sender)"
        );
    }

    #[test]
    fn test_new_transfer_is_built() {
        let transfer = Transfer::new(Domain::ARBITRUM, Domain::UNICHAIN);
        assert_eq!(transfer.state, TransferState::Built);
        assert_eq!(transfer.amount(), None);
        assert!(!transfer.is_finalized());
    }
}
