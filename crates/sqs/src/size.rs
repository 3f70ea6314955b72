//! Message size accounting.
//!
//! Sizes are computed exactly as the queue meters them: UTF-8 byte length of
//! the body, plus for every attribute its name, data type and value bytes.

use std::collections::HashMap;

use aws_sdk_sqs::types::MessageAttributeValue;

/// Byte length of a message body.
#[must_use]
pub fn body_size(body: &str) -> usize {
    body.len()
}

/// Combined byte length of a set of message attributes.
#[must_use]
pub fn attribute_size(attributes: &HashMap<String, MessageAttributeValue>) -> usize {
    attributes
        .iter()
        .map(|(name, value)| {
            name.len()
                + value.data_type().len()
                + value.string_value().map_or(0, str::len)
                + value.binary_value().map_or(0, |blob| blob.as_ref().len())
        })
        .sum()
}

/// Total metered size of a message: body plus attributes.
#[must_use]
pub fn message_size(body: &str, attributes: &HashMap<String, MessageAttributeValue>) -> usize {
    body_size(body) + attribute_size(attributes)
}
