//! CCTP domain identifiers
//!
//! Circle's Cross-Chain Transfer Protocol identifies each participating chain by
//! a 32-bit domain number. Unlike chain IDs these are assigned by Circle and are
//! shared between mainnet and testnet deployments of the same network.
//!
//! Any `u32` is a valid domain on the wire. Whether a domain is *trusted* is
//! decided by the [`DomainRegistry`](crate::DomainRegistry), not by this type.
//!
//! Reference: <https://developers.circle.com/stablecoins/evm-smart-contracts>

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// CCTP domain identifier
///
/// # Example
///
/// ```rust
/// use cctp_relay::Domain;
///
/// let arbitrum = Domain::ARBITRUM;
/// assert_eq!(arbitrum.as_u32(), 3);
/// assert_eq!(arbitrum.name(), Some("Arbitrum"));
/// assert_eq!(Domain::new(999).name(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(u32);

impl Domain {
    pub const ETHEREUM: Self = Self(0);
    pub const AVALANCHE: Self = Self(1);
    pub const OPTIMISM: Self = Self(2);
    pub const ARBITRUM: Self = Self(3);
    pub const SOLANA: Self = Self(5);
    pub const BASE: Self = Self(6);
    pub const POLYGON: Self = Self(7);
    pub const UNICHAIN: Self = Self(10);
    pub const LINEA: Self = Self(11);
    pub const SONIC: Self = Self(13);
    pub const WORLD_CHAIN: Self = Self(14);

    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the network name for well-known domains
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("Ethereum"),
            1 => Some("Avalanche"),
            2 => Some("Optimism"),
            3 => Some("Arbitrum"),
            5 => Some("Solana"),
            6 => Some("Base"),
            7 => Some("Polygon"),
            10 => Some("Unichain"),
            11 => Some("Linea"),
            13 => Some("Sonic"),
            14 => Some("World Chain"),
            _ => None,
        }
    }
}

impl From<u32> for Domain {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Domain> for u32 {
    #[inline]
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl TryFrom<u64> for Domain {
    type Error = RelayError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self).map_err(|_| {
            RelayError::Encoding(format!("domain {value} exceeds the 32-bit domain field"))
        })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "domain {}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Domain::ETHEREUM, 0, "Ethereum")]
    #[case(Domain::ARBITRUM, 3, "Arbitrum")]
    #[case(Domain::BASE, 6, "Base")]
    #[case(Domain::UNICHAIN, 10, "Unichain")]
    #[case(Domain::LINEA, 11, "Linea")]
    fn test_well_known_domains(#[case] domain: Domain, #[case] value: u32, #[case] name: &str) {
        assert_eq!(domain.as_u32(), value);
        assert_eq!(domain.name(), Some(name));
        assert_eq!(Domain::from(value), domain);
    }

    #[test]
    fn test_unknown_domain_is_still_valid() {
        let domain = Domain::new(4242);
        assert_eq!(domain.name(), None);
        assert_eq!(u32::from(domain), 4242);
    }

    #[test]
    fn test_try_from_u64_overflow() {
        assert_eq!(Domain::try_from(10u64).unwrap(), Domain::UNICHAIN);
        let err = Domain::try_from(u64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, RelayError::Encoding(_)));
    }

    #[test]
    fn test_display() {
        insta::assert_snapshot!(Domain::ARBITRUM.to_string(), @"Arbitrum (3)");
        insta::assert_snapshot!(Domain::new(77).to_string(), @"domain 77");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Domain::UNICHAIN).unwrap();
        assert_eq!(json, "10");
        let parsed: Domain = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Domain::ARBITRUM);
    }
}
