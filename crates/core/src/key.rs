//! Object key generation and prefix validation.

use uuid::Uuid;

use crate::error::OffloadError;

/// Longest permitted object key prefix.
///
/// Store keys are capped at 1024 bytes and every generated key ends in a
/// 36-character UUID, which leaves this much room for the prefix.
pub const MAX_KEY_PREFIX_LEN: usize = 1024 - 36;

/// Generate the object key for a new payload: the configured prefix (if any)
/// followed by a fresh random UUID.
#[must_use]
pub fn object_key(prefix: Option<&str>) -> String {
    let uuid = Uuid::new_v4();
    match prefix {
        Some(prefix) => format!("{prefix}{uuid}"),
        None => uuid.to_string(),
    }
}

/// Validate a configured object key prefix.
///
/// Prefixes must fit within [`MAX_KEY_PREFIX_LEN`], must not begin with `.`
/// or `/`, must not contain `..`, and are restricted to ASCII alphanumerics
/// plus `.`, `/`, `_` and `-`.
pub fn validate_key_prefix(prefix: &str) -> Result<(), OffloadError> {
    if prefix.len() > MAX_KEY_PREFIX_LEN {
        return Err(OffloadError::InvalidKeyPrefix(format!(
            "prefix is {} bytes, maximum is {MAX_KEY_PREFIX_LEN}",
            prefix.len()
        )));
    }
    if prefix.starts_with('.') || prefix.starts_with('/') {
        return Err(OffloadError::InvalidKeyPrefix(
            "prefix must not start with '.' or '/'".into(),
        ));
    }
    if prefix.contains("..") {
        return Err(OffloadError::InvalidKeyPrefix(
            "prefix must not contain '..'".into(),
        ));
    }
    if let Some(ch) = prefix.chars().find(|&ch| !is_allowed_key_char(ch)) {
        return Err(OffloadError::InvalidKeyPrefix(format!(
            "prefix contains disallowed character {ch:?}"
        )));
    }
    Ok(())
}

fn is_allowed_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '/' | '_' | '-')
}
