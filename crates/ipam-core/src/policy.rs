use serde::{Deserialize, Serialize};

/// Default longest mask accepted for a prefix.
pub const DEFAULT_PREFIX_MAX_LEN: u8 = 23;

/// Default longest mask accepted for a subnet.
pub const DEFAULT_SUBNET_MAX_LEN: u8 = 24;

/// Mask-size floors for prefixes and subnets.
///
/// A block whose prefix length is greater than the configured value is
/// rejected with [`IpamError::MaskTooNarrow`](crate::IpamError::MaskTooNarrow).
/// The same floors apply to both address families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskPolicy {
    /// Longest prefix length a prefix may have.
    pub prefix_max_len: u8,
    /// Longest prefix length a subnet may have.
    pub subnet_max_len: u8,
}

impl Default for MaskPolicy {
    fn default() -> Self {
        Self {
            prefix_max_len: DEFAULT_PREFIX_MAX_LEN,
            subnet_max_len: DEFAULT_SUBNET_MAX_LEN,
        }
    }
}
