//! CCTP v2 wire message codec
//!
//! Every relayed transfer travels as a [`Message`]: a fixed 148-byte header
//! followed by an opaque body. For USDC transfers the body is a
//! [`BurnMessage`], itself a fixed 228-byte layout followed by a variable
//! hook-data tail. All integers are big-endian.
//!
//! Decoding is all-or-nothing: a buffer is either long enough for every fixed
//! field or it is rejected with [`RelayError::Decoding`].
//!
//! Reference: <https://developers.circle.com/cctp/technical-guide>

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use bon::Builder;

use super::address::bytes32_to_address;
use super::Domain;
use crate::error::{RelayError, Result};

/// Largest message body accepted by [`Message::encode`]
pub const MAX_MESSAGE_BODY_SIZE: usize = 64 * 1024;

/// Message format version emitted by MessageTransmitterV2
pub const MESSAGE_VERSION: u32 = 1;

/// Burn message body version emitted by TokenMessengerV2
pub const BURN_MESSAGE_VERSION: u32 = 1;

mod offsets {
    pub const VERSION: usize = 0;
    pub const SOURCE_DOMAIN: usize = 4;
    pub const DESTINATION_DOMAIN: usize = 8;
    pub const NONCE: usize = 12;
    pub const SENDER: usize = 44;
    pub const RECIPIENT: usize = 76;
    pub const DESTINATION_CALLER: usize = 108;
    pub const MIN_FINALITY_THRESHOLD: usize = 140;
    pub const FINALITY_THRESHOLD_EXECUTED: usize = 144;
    pub const BODY: usize = 148;

    pub const BURN_VERSION: usize = 0;
    pub const BURN_TOKEN: usize = 4;
    pub const MINT_RECIPIENT: usize = 36;
    pub const AMOUNT: usize = 68;
    pub const MESSAGE_SENDER: usize = 100;
    pub const MAX_FEE: usize = 132;
    pub const FEE_EXECUTED: usize = 164;
    pub const EXPIRATION_BLOCK: usize = 196;
    pub const HOOK_DATA: usize = 228;
}

/// CCTP v2 message envelope
///
/// # Format
///
/// - version: uint32 (4 bytes)
/// - sourceDomain: uint32 (4 bytes)
/// - destinationDomain: uint32 (4 bytes)
/// - nonce: bytes32 (32 bytes), assigned by the transmitter on the source chain
/// - sender: bytes32 (32 bytes)
/// - recipient: bytes32 (32 bytes)
/// - destinationCaller: bytes32 (32 bytes), zero means anyone may finalize
/// - minFinalityThreshold: uint32 (4 bytes)
/// - finalityThresholdExecuted: uint32 (4 bytes)
/// - messageBody: dynamic bytes
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    #[builder(default = MESSAGE_VERSION)]
    pub version: u32,
    pub source_domain: Domain,
    pub destination_domain: Domain,
    #[builder(default)]
    pub nonce: B256,
    pub sender: B256,
    pub recipient: B256,
    #[builder(default)]
    pub destination_caller: B256,
    pub min_finality_threshold: u32,
    #[builder(default)]
    pub finality_threshold_executed: u32,
    #[builder(default)]
    pub body: Bytes,
}

impl Message {
    /// Size of the fixed header in bytes
    pub const HEADER_SIZE: usize = offsets::BODY;

    /// Encodes the message into its wire layout.
    pub fn encode(&self) -> Result<Bytes> {
        if self.body.len() > MAX_MESSAGE_BODY_SIZE {
            return Err(RelayError::Encoding(format!(
                "message body is {} bytes, limit is {}",
                self.body.len(),
                MAX_MESSAGE_BODY_SIZE
            )));
        }

        let mut bytes = Vec::with_capacity(Self::HEADER_SIZE + self.body.len());
        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.extend_from_slice(&self.source_domain.as_u32().to_be_bytes());
        bytes.extend_from_slice(&self.destination_domain.as_u32().to_be_bytes());
        bytes.extend_from_slice(self.nonce.as_slice());
        bytes.extend_from_slice(self.sender.as_slice());
        bytes.extend_from_slice(self.recipient.as_slice());
        bytes.extend_from_slice(self.destination_caller.as_slice());
        bytes.extend_from_slice(&self.min_finality_threshold.to_be_bytes());
        bytes.extend_from_slice(&self.finality_threshold_executed.to_be_bytes());
        bytes.extend_from_slice(&self.body);

        Ok(Bytes::from(bytes))
    }

    /// Decodes a message, treating everything after the header as the body.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(RelayError::Decoding(format!(
                "message is {} bytes, header needs {}",
                bytes.len(),
                Self::HEADER_SIZE
            )));
        }

        Ok(Self {
            version: read_u32(bytes, offsets::VERSION),
            source_domain: Domain::new(read_u32(bytes, offsets::SOURCE_DOMAIN)),
            destination_domain: Domain::new(read_u32(bytes, offsets::DESTINATION_DOMAIN)),
            nonce: read_word(bytes, offsets::NONCE),
            sender: read_word(bytes, offsets::SENDER),
            recipient: read_word(bytes, offsets::RECIPIENT),
            destination_caller: read_word(bytes, offsets::DESTINATION_CALLER),
            min_finality_threshold: read_u32(bytes, offsets::MIN_FINALITY_THRESHOLD),
            finality_threshold_executed: read_u32(bytes, offsets::FINALITY_THRESHOLD_EXECUTED),
            body: Bytes::copy_from_slice(&bytes[offsets::BODY..]),
        })
    }

    /// keccak256 of the encoded message, the key the transmitter uses for replay protection
    pub fn hash(&self) -> Result<B256> {
        Ok(keccak256(self.encode()?))
    }

    /// Returns true when any caller may submit this message on the destination chain
    pub fn is_permissionless(&self) -> bool {
        self.destination_caller.is_zero()
    }

    /// Decodes the body as a [`BurnMessage`]
    pub fn burn_body(&self) -> Result<BurnMessage> {
        BurnMessage::decode(&self.body)
    }

    /// Decodes the nested relay instruction carried in the burn body's hook data.
    ///
    /// Returns `Ok(None)` when the hook data is empty.
    pub fn hook_instruction(&self) -> Result<Option<Message>> {
        let body = self.burn_body()?;
        if !body.has_hooks() {
            return Ok(None);
        }
        Message::decode(&body.hook_data).map(Some)
    }
}

/// CCTP v2 burn message body
///
/// # Format
///
/// - version: uint32 (4 bytes)
/// - burnToken: bytes32 (32 bytes)
/// - mintRecipient: bytes32 (32 bytes)
/// - amount: uint256 (32 bytes)
/// - messageSender: bytes32 (32 bytes)
/// - maxFee: uint256 (32 bytes)
/// - feeExecuted: uint256 (32 bytes)
/// - expirationBlock: uint256 (32 bytes)
/// - hookData: dynamic bytes
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct BurnMessage {
    #[builder(default = BURN_MESSAGE_VERSION)]
    pub version: u32,
    pub burn_token: B256,
    pub mint_recipient: B256,
    pub amount: U256,
    pub message_sender: B256,
    #[builder(default)]
    pub max_fee: U256,
    #[builder(default)]
    pub fee_executed: U256,
    #[builder(default)]
    pub expiration_block: U256,
    #[builder(default)]
    pub hook_data: Bytes,
}

impl BurnMessage {
    /// Size of the burn body without hook data
    pub const MIN_SIZE: usize = offsets::HOOK_DATA;

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(Self::MIN_SIZE + self.hook_data.len());
        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.extend_from_slice(self.burn_token.as_slice());
        bytes.extend_from_slice(self.mint_recipient.as_slice());
        bytes.extend_from_slice(&self.amount.to_be_bytes::<32>());
        bytes.extend_from_slice(self.message_sender.as_slice());
        bytes.extend_from_slice(&self.max_fee.to_be_bytes::<32>());
        bytes.extend_from_slice(&self.fee_executed.to_be_bytes::<32>());
        bytes.extend_from_slice(&self.expiration_block.to_be_bytes::<32>());
        bytes.extend_from_slice(&self.hook_data);
        Bytes::from(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::MIN_SIZE {
            return Err(RelayError::Decoding(format!(
                "burn message is {} bytes, body needs {}",
                bytes.len(),
                Self::MIN_SIZE
            )));
        }

        Ok(Self {
            version: read_u32(bytes, offsets::BURN_VERSION),
            burn_token: read_word(bytes, offsets::BURN_TOKEN),
            mint_recipient: read_word(bytes, offsets::MINT_RECIPIENT),
            amount: read_u256(bytes, offsets::AMOUNT),
            message_sender: read_word(bytes, offsets::MESSAGE_SENDER),
            max_fee: read_u256(bytes, offsets::MAX_FEE),
            fee_executed: read_u256(bytes, offsets::FEE_EXECUTED),
            expiration_block: read_u256(bytes, offsets::EXPIRATION_BLOCK),
            hook_data: Bytes::copy_from_slice(&bytes[offsets::HOOK_DATA..]),
        })
    }

    pub fn has_hooks(&self) -> bool {
        !self.hook_data.is_empty()
    }

    pub fn is_fast_transfer(&self) -> bool {
        self.max_fee > U256::ZERO
    }

    pub fn mint_recipient_address(&self) -> Result<Address> {
        bytes32_to_address(self.mint_recipient.as_slice())
    }
}

/// Decodes `message`, then its burn body, then the body's hook data as a
/// nested message.
///
/// Fails with [`RelayError::Decoding`] when the hook data is empty; callers
/// that accept hook-less transfers check [`BurnMessage::has_hooks`] first.
pub fn decode_message_to_hook_data(message: &[u8]) -> Result<Message> {
    let outer = Message::decode(message)?;
    let body = outer.burn_body()?;
    if !body.has_hooks() {
        return Err(RelayError::Decoding(
            "burn message carries no hook data".to_string(),
        ));
    }
    Message::decode(&body.hook_data)
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[inline]
fn read_word(bytes: &[u8], offset: usize) -> B256 {
    B256::from_slice(&bytes[offset..offset + 32])
}

#[inline]
fn read_u256(bytes: &[u8], offset: usize) -> U256 {
    U256::from_be_slice(&bytes[offset..offset + 32])
}
