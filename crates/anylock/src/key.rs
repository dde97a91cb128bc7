//! Resource key validation and filesystem mapping.
//!
//! Pure functions shared by the backend adapters.

use crate::error::{Error, Result};

/// Longest accepted key, in bytes.
const MAX_KEY_LEN: usize = 255;

/// Validate a caller-supplied resource key.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_key(key, "key cannot be empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(Error::invalid_key(
            key,
            format!("key cannot exceed {MAX_KEY_LEN} bytes"),
        ));
    }
    Ok(())
}

/// Map a key to a safe lock-file stem.
///
/// Alphanumerics, `-`, `_`, and `.` pass through; everything else becomes
/// `_` so keys like `tenant/alpha` cannot escape the lock directory.
pub(crate) fn safe_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
