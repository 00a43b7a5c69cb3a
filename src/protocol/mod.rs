//! CCTP protocol types
//!
//! Wire-level building blocks shared by every other module: domain
//! identifiers, finality thresholds, the message codec and the attestation
//! authority's response types.

mod address;
mod attestation;
mod domain_id;
mod finality;
mod message;

pub use address::{address_to_bytes32, address_word, bytes32_to_address};
pub use attestation::{
    Attestation, AttestationMessage, AttestationRequest, AttestationStatus, MessagesResponse,
};
pub use domain_id::Domain;
pub use finality::FinalityThreshold;
pub use message::{
    decode_message_to_hook_data, BurnMessage, Message, BURN_MESSAGE_VERSION,
    MAX_MESSAGE_BODY_SIZE, MESSAGE_VERSION,
};
