//! Offload and validation policy.

use std::collections::HashMap;

use aws_sdk_sqs::types::MessageAttributeValue;

use crate::config::{MAX_ALLOWED_ATTRIBUTES, OffloadConfig, RESERVED_ATTRIBUTE_NAMES};
use crate::error::ExtendedClientError;
use crate::size;

/// Whether a message of `total` metered bytes must be routed through the
/// payload store.
#[must_use]
pub fn exceeds_threshold(total: usize, config: &OffloadConfig) -> bool {
    config.always_through_store() || total > config.payload_size_threshold()
}

/// Reject attribute sets that cannot accompany an offloaded message.
///
/// Checks, in order: attributes alone must fit under the threshold (they are
/// never offloaded), the attribute count must leave room for the reserved
/// size attribute, and neither reserved name may already be in use.
pub fn check_attributes(
    attributes: &HashMap<String, MessageAttributeValue>,
    config: &OffloadConfig,
) -> Result<(), ExtendedClientError> {
    let attribute_bytes = size::attribute_size(attributes);
    if attribute_bytes > config.payload_size_threshold() {
        return Err(ExtendedClientError::AttributeSizeExceeded {
            size: attribute_bytes,
            threshold: config.payload_size_threshold(),
        });
    }

    if attributes.len() > MAX_ALLOWED_ATTRIBUTES {
        return Err(ExtendedClientError::TooManyAttributes {
            count: attributes.len(),
            max: MAX_ALLOWED_ATTRIBUTES,
        });
    }

    for name in RESERVED_ATTRIBUTE_NAMES {
        if attributes.contains_key(name) {
            return Err(ExtendedClientError::ReservedAttributeName(name));
        }
    }

    Ok(())
}
