//! Single-message offload preparation.

use std::collections::HashMap;

use aws_sdk_sqs::types::MessageAttributeValue;
use stowage_core::{PayloadPointer, key};

use crate::config::OffloadConfig;
use crate::error::ExtendedClientError;
use crate::size;

/// A message rewritten for offloading, ready to store and send.
///
/// Produced by [`prepare_offload`] without touching the store, so batch
/// planning can account for the rewritten size of every entry before any
/// write happens.
#[derive(Debug, Clone)]
pub struct PreparedOffload {
    /// Object key the payload will be stored under.
    pub key: String,
    /// Pointer to the payload object.
    pub pointer: PayloadPointer,
    /// Replacement message body: the serialized pointer.
    pub body: String,
    /// Caller attributes plus the reserved size attribute.
    pub attributes: HashMap<String, MessageAttributeValue>,
}

impl PreparedOffload {
    /// Metered size of the rewritten message.
    #[must_use]
    pub fn rewritten_size(&self) -> usize {
        size::message_size(&self.body, &self.attributes)
    }
}

/// Rewrite a message for offloading: pick a fresh object key, serialize the
/// pointer that becomes the new body, and add the reserved attribute
/// recording the original body size.
pub fn prepare_offload(
    body: &str,
    attributes: &HashMap<String, MessageAttributeValue>,
    config: &OffloadConfig,
    namespace: &str,
) -> Result<PreparedOffload, ExtendedClientError> {
    let key = key::object_key(config.object_key_prefix());
    let pointer = PayloadPointer::new(namespace, &key);

    let size_attribute = MessageAttributeValue::builder()
        .data_type("Number")
        .string_value(size::body_size(body).to_string())
        .build()?;
    let mut attributes = attributes.clone();
    attributes.insert(
        config.reserved_attribute().name().to_owned(),
        size_attribute,
    );

    Ok(PreparedOffload {
        body: pointer.to_json(),
        key,
        pointer,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        LEGACY_RESERVED_ATTRIBUTE_NAME, RESERVED_ATTRIBUTE_NAME, ReservedAttribute,
    };

    fn string_attr(value: &str) -> MessageAttributeValue {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .unwrap()
    }

    #[test]
    fn body_becomes_pointer_to_namespace() {
        let prepared = prepare_offload(
            "a large payload",
            &HashMap::new(),
            &OffloadConfig::default(),
            "payload-bucket",
        )
        .unwrap();

        assert_eq!(prepared.pointer.bucket, "payload-bucket");
        assert_eq!(prepared.pointer.key, prepared.key);
        assert_eq!(prepared.body, prepared.pointer.to_json());
        assert_eq!(
            PayloadPointer::from_json(&prepared.body).unwrap(),
            prepared.pointer
        );
    }

    #[test]
    fn reserved_attribute_records_original_size() {
        let prepared = prepare_offload(
            "0123456789",
            &HashMap::new(),
            &OffloadConfig::default(),
            "bucket",
        )
        .unwrap();

        let size_attr = &prepared.attributes[LEGACY_RESERVED_ATTRIBUTE_NAME];
        assert_eq!(size_attr.data_type(), "Number");
        assert_eq!(size_attr.string_value(), Some("10"));
    }

    #[test]
    fn current_reserved_name_is_honored() {
        let config = OffloadConfig::default().with_reserved_attribute(ReservedAttribute::Current);
        let prepared = prepare_offload("payload", &HashMap::new(), &config, "bucket").unwrap();

        assert!(prepared.attributes.contains_key(RESERVED_ATTRIBUTE_NAME));
        assert!(!prepared.attributes.contains_key(LEGACY_RESERVED_ATTRIBUTE_NAME));
    }

    #[test]
    fn caller_attributes_are_preserved() {
        let mut attributes = HashMap::new();
        attributes.insert("trace-id".to_owned(), string_attr("abc"));

        let prepared =
            prepare_offload("payload", &attributes, &OffloadConfig::default(), "bucket").unwrap();

        assert_eq!(prepared.attributes.len(), 2);
        assert_eq!(
            prepared.attributes["trace-id"].string_value(),
            Some("abc")
        );
    }

    #[test]
    fn key_prefix_is_applied() {
        let config = OffloadConfig::default().with_object_key_prefix("events/");
        let prepared = prepare_offload("payload", &HashMap::new(), &config, "bucket").unwrap();

        assert!(prepared.key.starts_with("events/"));
        assert_eq!(prepared.key.len(), "events/".len() + 36);
    }

    #[test]
    fn fresh_key_per_call() {
        let config = OffloadConfig::default();
        let first = prepare_offload("payload", &HashMap::new(), &config, "bucket").unwrap();
        let second = prepare_offload("payload", &HashMap::new(), &config, "bucket").unwrap();
        assert_ne!(first.key, second.key);
    }
}
