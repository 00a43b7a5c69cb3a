//! Conversions between 20-byte EVM addresses and the 32-byte words used in
//! message fields.

use alloy_primitives::{Address, B256};

use crate::error::{RelayError, Result};

const ADDRESS_LEN: usize = 20;
const WORD_LEN: usize = 32;
const PADDING_LEN: usize = WORD_LEN - ADDRESS_LEN;

/// Left-pads a raw 20-byte address to a 32-byte word.
///
/// Fails with [`RelayError::Format`] unless `raw` is exactly 20 bytes long.
pub fn address_to_bytes32(raw: &[u8]) -> Result<B256> {
    if raw.len() != ADDRESS_LEN {
        return Err(RelayError::Format(format!(
            "address must be {} bytes, got {}",
            ADDRESS_LEN,
            raw.len()
        )));
    }
    Ok(Address::from_slice(raw).into_word())
}

/// Recovers the 20-byte address from a left-padded 32-byte word.
///
/// Fails with [`RelayError::Format`] unless `raw` is exactly 32 bytes long and
/// its 12 padding bytes are zero.
pub fn bytes32_to_address(raw: &[u8]) -> Result<Address> {
    if raw.len() != WORD_LEN {
        return Err(RelayError::Format(format!(
            "bytes32 must be {} bytes, got {}",
            WORD_LEN,
            raw.len()
        )));
    }
    if raw[..PADDING_LEN].iter().any(|byte| *byte != 0) {
        return Err(RelayError::Format(
            "bytes32 is not a left-padded address".to_string(),
        ));
    }
    Ok(Address::from_slice(&raw[PADDING_LEN..]))
}

/// Infallible form of [`address_to_bytes32`] for typed addresses.
#[inline]
pub fn address_word(address: Address) -> B256 {
    address.into_word()
}
