//! Finality thresholds requested from the attestation service
//!
//! A burn names the minimum finality it needs before Circle will attest it.
//! The message header carries both the requested threshold and the threshold
//! that was actually reached when the attestation was signed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Finality threshold for relayed messages
///
/// ```rust
/// use cctp_relay::FinalityThreshold;
///
/// assert_eq!(FinalityThreshold::Standard.as_u32(), 2000);
/// assert_eq!(FinalityThreshold::from_u32(1000), Some(FinalityThreshold::Fast));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum FinalityThreshold {
    /// Attested at the "confirmed" level, seconds on most chains
    Fast = 1000,
    /// Attested at the "finalized" level, the only level that is fee free
    #[default]
    Standard = 2000,
}

impl FinalityThreshold {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1000 => Some(Self::Fast),
            2000 => Some(Self::Standard),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Fast => "Fast Transfer",
            Self::Standard => "Standard Transfer",
        }
    }

    /// Whether an executed threshold satisfies this requested threshold
    pub const fn is_satisfied_by(self, executed: u32) -> bool {
        executed >= self.as_u32()
    }
}

impl From<FinalityThreshold> for u32 {
    #[inline]
    fn from(threshold: FinalityThreshold) -> Self {
        threshold.as_u32()
    }
}

impl fmt::Display for FinalityThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_values() {
        assert_eq!(FinalityThreshold::Fast.as_u32(), 1000);
        assert_eq!(FinalityThreshold::Standard.as_u32(), 2000);
        assert_eq!(FinalityThreshold::from_u32(1500), None);
        assert_eq!(FinalityThreshold::default(), FinalityThreshold::Standard);
    }

    #[test]
    fn test_is_satisfied_by() {
        assert!(FinalityThreshold::Fast.is_satisfied_by(2000));
        assert!(FinalityThreshold::Standard.is_satisfied_by(2000));
        assert!(!FinalityThreshold::Standard.is_satisfied_by(1000));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FinalityThreshold::Standard.to_string(),
            "Standard Transfer (2000)"
        );
    }
}
