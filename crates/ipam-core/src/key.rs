//! Key validation for prefixes, subnets, and hosts.
//!
//! Valid keys:
//! - Must be non-empty
//! - Must be at most [`MAX_KEY_LEN`] characters
//! - Must contain only `a-z`, `0-9`, `.` and `-`

use crate::error::{IpamError, IpamResult};

/// Maximum key length in characters.
pub const MAX_KEY_LEN: usize = 50;

/// Returns `true` if the key matches `^[a-z0-9.-]+$` and is at most
/// [`MAX_KEY_LEN`] characters long.
///
/// # Examples
///
/// ```
/// use ipam_core::key::is_valid_key;
///
/// assert!(is_valid_key("office-lan.1"));
/// assert!(!is_valid_key("Office"));
/// assert!(!is_valid_key(""));
/// ```
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-'))
}

/// Validate a key, returning [`IpamError::InvalidKey`] echoing the input
/// when it is rejected.
pub fn validate_key(key: &str) -> IpamResult<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(IpamError::InvalidKey {
            key: key.to_string(),
        })
    }
}
