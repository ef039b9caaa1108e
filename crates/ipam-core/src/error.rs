//! Error types for address-space operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The level of the address-space tree an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Prefix,
    Subnet,
    Host,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::Subnet => write!(f, "subnet"),
            Self::Host => write!(f, "host"),
        }
    }
}

/// Errors produced while validating or mutating the address space.
///
/// Every variant is raised before any mutation is applied, except
/// [`IpamError::NotFound`] surfaced from the middle of a cascading delete.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IpamError {
    /// The parent the operation targets does not exist.
    #[error("{kind} not found, unable to attach a child: {key}")]
    MissingParent { kind: EntityKind, key: String },

    /// The key fails the charset/length rule.
    #[error("invalid key: {key:?}: allowed characters are [a-z0-9.-], at most 50")]
    InvalidKey { key: String },

    /// The key is already used by a sibling.
    #[error("{kind} key already in use: {key}")]
    DuplicateKey { kind: EntityKind, key: String },

    /// The text is not a valid CIDR literal.
    #[error("malformed CIDR: {text:?}")]
    MalformedCidr { text: String },

    /// The text is not a valid IP address literal.
    #[error("malformed address: {text:?}")]
    MalformedAddress { text: String },

    /// The mask is longer than the floor configured for this entity kind.
    #[error("{kind} mask /{len} of {cidr} is narrower than /{max}")]
    MaskTooNarrow {
        kind: EntityKind,
        cidr: String,
        len: u8,
        max: u8,
    },

    /// The child block or address is not contained in its parent block.
    #[error("{child} is not contained in {parent}")]
    OutOfRange { child: String, parent: String },

    /// The block overlaps a sibling block.
    #[error("{cidr} overlaps {kind} {key}")]
    OverlappingBlock {
        kind: EntityKind,
        cidr: String,
        key: String,
    },

    /// The address is already assigned to a sibling host.
    #[error("address {address} already used by host {key}")]
    DuplicateAddress { address: String, key: String },

    /// The block cannot change while children exist.
    #[error("{kind} {key} still has children, unable to change its block")]
    NotEmpty { kind: EntityKind, key: String },

    /// The target is not present in its claimed parent's index.
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },
}

impl IpamError {
    /// Stable machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParent { .. } => "missing_parent",
            Self::InvalidKey { .. } => "invalid_key",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::MalformedCidr { .. } => "malformed_cidr",
            Self::MalformedAddress { .. } => "malformed_address",
            Self::MaskTooNarrow { .. } => "mask_too_narrow",
            Self::OutOfRange { .. } => "out_of_range",
            Self::OverlappingBlock { .. } => "overlapping_block",
            Self::DuplicateAddress { .. } => "duplicate_address",
            Self::NotEmpty { .. } => "not_empty",
            Self::NotFound { .. } => "not_found",
        }
    }

    pub(crate) fn not_found(kind: EntityKind, key: &str) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn missing_parent(kind: EntityKind, key: &str) -> Self {
        Self::MissingParent {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate_key(kind: EntityKind, key: &str) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.to_string(),
        }
    }
}

/// Convenience type alias for address-space operations.
pub type IpamResult<T> = Result<T, IpamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_snake_case() {
        let err = IpamError::duplicate_key(EntityKind::Subnet, "lan");
        assert_eq!(err.code(), "duplicate_key");
        assert_eq!(err.to_string(), "subnet key already in use: lan");
    }

    #[test]
    fn mask_error_mentions_both_lengths() {
        let err = IpamError::MaskTooNarrow {
            kind: EntityKind::Prefix,
            cidr: "10.0.0.0/24".into(),
            len: 24,
            max: 23,
        };
        let msg = err.to_string();
        assert!(msg.contains("/24"));
        assert!(msg.contains("/23"));
    }
}
