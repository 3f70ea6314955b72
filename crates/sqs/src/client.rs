//! The decorated SQS client.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::operation::change_message_visibility::{
    ChangeMessageVisibilityInput, ChangeMessageVisibilityOutput,
};
use aws_sdk_sqs::operation::change_message_visibility_batch::{
    ChangeMessageVisibilityBatchInput, ChangeMessageVisibilityBatchOutput,
};
use aws_sdk_sqs::operation::delete_message::{DeleteMessageInput, DeleteMessageOutput};
use aws_sdk_sqs::operation::delete_message_batch::{
    DeleteMessageBatchInput, DeleteMessageBatchOutput,
};
use aws_sdk_sqs::operation::receive_message::{ReceiveMessageInput, ReceiveMessageOutput};
use aws_sdk_sqs::operation::send_message::{SendMessageInput, SendMessageOutput};
use aws_sdk_sqs::operation::send_message_batch::{SendMessageBatchInput, SendMessageBatchOutput};
use aws_sdk_sqs::types::{
    ChangeMessageVisibilityBatchRequestEntry, DeleteMessageBatchRequestEntry,
};
use futures::future::try_join_all;
use stowage_core::{PayloadStore, key};
use tracing::{debug, instrument, warn};

use crate::batch;
use crate::cleanup;
use crate::config::{OffloadConfig, ReservedAttribute};
use crate::error::ExtendedClientError;
use crate::offload;
use crate::policy;
use crate::receive;
use crate::size;

/// SQS client decorator that keeps oversized payloads in a payload store.
///
/// Send paths move large bodies to the store and put a pointer document on
/// the queue; receive paths resolve pointers back into full bodies; delete
/// paths clean the stored payload up. Requests and responses are the plain
/// SDK types, so swapping this in for a raw client does not change calling
/// code.
///
/// Operations with no offloading concern go through [`inner`](Self::inner).
#[derive(Clone)]
pub struct ExtendedSqsClient {
    sqs: SqsClient,
    store: Arc<dyn PayloadStore>,
    config: OffloadConfig,
}

impl fmt::Debug for ExtendedSqsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedSqsClient")
            .field("sqs", &"<SqsClient>")
            .field("store", &self.store.namespace())
            .field("config", &self.config)
            .finish()
    }
}

impl ExtendedSqsClient {
    /// Decorate `sqs` with offloading through `store`, using the default
    /// configuration.
    pub fn new(sqs: SqsClient, store: impl PayloadStore + 'static) -> Self {
        Self {
            sqs,
            store: Arc::new(store),
            config: OffloadConfig::default(),
        }
    }

    /// Start configuring a decorated client.
    pub fn builder(sqs: SqsClient) -> ExtendedSqsClientBuilder {
        ExtendedSqsClientBuilder {
            sqs,
            store: None,
            config: OffloadConfig::default(),
        }
    }

    /// The undecorated SQS client, for operations without an offloading
    /// concern (queue management, tagging, and the rest).
    #[must_use]
    pub fn inner(&self) -> &SqsClient {
        &self.sqs
    }

    /// The active offloading configuration.
    #[must_use]
    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    /// Send a message, moving its body to the payload store first when the
    /// metered size calls for it.
    ///
    /// The store write completes before the queue send starts; if it fails,
    /// nothing is sent.
    #[instrument(skip(self, input))]
    pub async fn send_message(
        &self,
        input: SendMessageInput,
    ) -> Result<SendMessageOutput, ExtendedClientError> {
        let body = input.message_body().unwrap_or_default();
        if body.is_empty() {
            return Err(ExtendedClientError::InvalidArgument(
                "message body must not be empty".into(),
            ));
        }

        let empty = HashMap::new();
        let attributes = input.message_attributes().unwrap_or(&empty);
        policy::check_attributes(attributes, &self.config)?;

        let total = size::message_size(body, attributes);
        if !policy::exceeds_threshold(total, &self.config) {
            return self.forward_send(input).await;
        }

        let prepared =
            offload::prepare_offload(body, attributes, &self.config, self.store.namespace())?;
        self.store.store_payload(&prepared.key, body).await?;
        debug!(key = %prepared.key, original_bytes = total, "offloaded message payload");

        let mut input = input;
        input.message_body = Some(prepared.body);
        input.message_attributes = Some(prepared.attributes);
        self.forward_send(input).await
    }

    /// Send a batch, offloading the largest entries until the batch fits
    /// under the threshold.
    ///
    /// Planning and validation happen before any store write; all planned
    /// writes then run concurrently and must all succeed before the queue
    /// call starts. Entry order and ids are preserved.
    #[instrument(skip(self, input))]
    pub async fn send_message_batch(
        &self,
        input: SendMessageBatchInput,
    ) -> Result<SendMessageBatchOutput, ExtendedClientError> {
        let mut entries = input.entries.unwrap_or_default();

        let planned = batch::plan_batch_offload(&entries, &self.config, self.store.namespace())?;
        if !planned.is_empty() {
            try_join_all(planned.iter().map(|(i, prepared)| {
                self.store
                    .store_payload(&prepared.key, entries[*i].message_body())
            }))
            .await?;
            debug!(
                offloaded = planned.len(),
                entries = entries.len(),
                "offloaded batch payloads"
            );

            for (i, prepared) in planned {
                let rewritten = batch::rewrite_entry(&entries[i], prepared)?;
                entries[i] = rewritten;
            }
        }

        self.sqs
            .send_message_batch()
            .set_queue_url(input.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(sqs_err)
    }

    /// Receive messages, resolving offloaded bodies from the payload store.
    ///
    /// Both reserved attribute names are added to the requested message
    /// attribute names so offloaded messages are always recognizable.
    /// Fetches for a batch of messages run concurrently; message order is
    /// preserved, and the queue's response is rewritten in place so its
    /// request metadata passes through. A message whose payload is gone is
    /// dropped and deleted when `ignore_payload_not_found` is set, and
    /// fails the call otherwise.
    // attribute_names is deprecated in the SDK but must still be forwarded.
    #[allow(deprecated)]
    #[instrument(skip(self, input))]
    pub async fn receive_message(
        &self,
        input: ReceiveMessageInput,
    ) -> Result<ReceiveMessageOutput, ExtendedClientError> {
        let names = receive::merge_attribute_names(input.message_attribute_names());
        let queue_url = input.queue_url.clone();

        let mut output = self
            .sqs
            .receive_message()
            .set_queue_url(input.queue_url)
            .set_attribute_names(input.attribute_names)
            .set_message_system_attribute_names(input.message_system_attribute_names)
            .set_message_attribute_names(Some(names))
            .set_max_number_of_messages(input.max_number_of_messages)
            .set_visibility_timeout(input.visibility_timeout)
            .set_wait_time_seconds(input.wait_time_seconds)
            .set_receive_request_attempt_id(input.receive_request_attempt_id)
            .send()
            .await
            .map_err(sqs_err)?;

        let dropped =
            receive::rehydrate_output(&mut output, self.store.as_ref(), &self.config).await?;
        for receipt_handle in dropped {
            warn!("dropping received message whose payload is gone");
            self.sqs
                .delete_message()
                .set_queue_url(queue_url.clone())
                .receipt_handle(receipt_handle)
                .send()
                .await
                .map_err(sqs_err)?;
        }

        Ok(output)
    }

    /// Delete a message and, when cleanup is enabled, the stored payload its
    /// receipt handle points at. The payload delete runs first.
    #[instrument(skip(self, input))]
    pub async fn delete_message(
        &self,
        input: DeleteMessageInput,
    ) -> Result<DeleteMessageOutput, ExtendedClientError> {
        let receipt_handle = input.receipt_handle().unwrap_or_default();
        let forwarded =
            cleanup::cleanup_payload(receipt_handle, self.store.as_ref(), &self.config).await?;

        self.sqs
            .delete_message()
            .set_queue_url(input.queue_url)
            .receipt_handle(forwarded)
            .send()
            .await
            .map_err(sqs_err)
    }

    /// Delete a batch of messages with per-entry payload cleanup.
    ///
    /// A failed payload delete is logged and the entry's queue delete still
    /// goes out with the de-augmented handle; one entry's cleanup never
    /// blocks its siblings.
    #[instrument(skip(self, input))]
    pub async fn delete_message_batch(
        &self,
        input: DeleteMessageBatchInput,
    ) -> Result<DeleteMessageBatchOutput, ExtendedClientError> {
        let entries = input.entries.unwrap_or_default();
        let mut forwarded = Vec::with_capacity(entries.len());
        for entry in &entries {
            let original = cleanup::cleanup_batch_entry(
                entry.id(),
                entry.receipt_handle(),
                self.store.as_ref(),
                &self.config,
            )
            .await;
            forwarded.push(
                DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id())
                    .receipt_handle(original)
                    .build()?,
            );
        }

        self.sqs
            .delete_message_batch()
            .set_queue_url(input.queue_url)
            .set_entries(Some(forwarded))
            .send()
            .await
            .map_err(sqs_err)
    }

    /// Change a message's visibility timeout. The receipt handle is
    /// de-augmented but the stored payload is left alone, since the message
    /// has not been consumed.
    #[instrument(skip(self, input))]
    pub async fn change_message_visibility(
        &self,
        input: ChangeMessageVisibilityInput,
    ) -> Result<ChangeMessageVisibilityOutput, ExtendedClientError> {
        let receipt_handle = input.receipt_handle().unwrap_or_default();
        let original = cleanup::strip_handle(receipt_handle).to_owned();

        self.sqs
            .change_message_visibility()
            .set_queue_url(input.queue_url)
            .receipt_handle(original)
            .set_visibility_timeout(input.visibility_timeout)
            .send()
            .await
            .map_err(sqs_err)
    }

    /// Change visibility timeouts for a batch, de-augmenting each entry's
    /// receipt handle.
    #[instrument(skip(self, input))]
    pub async fn change_message_visibility_batch(
        &self,
        input: ChangeMessageVisibilityBatchInput,
    ) -> Result<ChangeMessageVisibilityBatchOutput, ExtendedClientError> {
        let entries = input.entries.unwrap_or_default();
        let mut forwarded = Vec::with_capacity(entries.len());
        for entry in &entries {
            forwarded.push(
                ChangeMessageVisibilityBatchRequestEntry::builder()
                    .id(entry.id())
                    .receipt_handle(cleanup::strip_handle(entry.receipt_handle()))
                    .set_visibility_timeout(entry.visibility_timeout)
                    .build()?,
            );
        }

        self.sqs
            .change_message_visibility_batch()
            .set_queue_url(input.queue_url)
            .set_entries(Some(forwarded))
            .send()
            .await
            .map_err(sqs_err)
    }

    async fn forward_send(
        &self,
        input: SendMessageInput,
    ) -> Result<SendMessageOutput, ExtendedClientError> {
        self.sqs
            .send_message()
            .set_queue_url(input.queue_url)
            .set_message_body(input.message_body)
            .set_delay_seconds(input.delay_seconds)
            .set_message_attributes(input.message_attributes)
            .set_message_system_attributes(input.message_system_attributes)
            .set_message_deduplication_id(input.message_deduplication_id)
            .set_message_group_id(input.message_group_id)
            .send()
            .await
            .map_err(sqs_err)
    }
}

/// Builder for [`ExtendedSqsClient`].
pub struct ExtendedSqsClientBuilder {
    sqs: SqsClient,
    store: Option<Arc<dyn PayloadStore>>,
    config: OffloadConfig,
}

impl fmt::Debug for ExtendedSqsClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedSqsClientBuilder")
            .field("sqs", &"<SqsClient>")
            .field("store", &self.store.as_ref().map(|store| store.namespace()))
            .field("config", &self.config)
            .finish()
    }
}

impl ExtendedSqsClientBuilder {
    /// Set the payload store. Required.
    #[must_use]
    pub fn payload_store(mut self, store: impl PayloadStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared payload store.
    #[must_use]
    pub fn shared_payload_store(mut self, store: Arc<dyn PayloadStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Message size above which bodies are moved to the store. Defaults to
    /// the queue's 256 KiB limit.
    #[must_use]
    pub fn payload_size_threshold(mut self, bytes: usize) -> Self {
        self.config.payload_size_threshold = bytes;
        self
    }

    /// Route every message through the store regardless of size.
    #[must_use]
    pub fn always_through_store(mut self, always: bool) -> Self {
        self.config.always_through_store = always;
        self
    }

    /// Whether deleting a message also deletes its stored payload. Defaults
    /// to true.
    #[must_use]
    pub fn cleanup_on_delete(mut self, cleanup: bool) -> Self {
        self.config.cleanup_on_delete = cleanup;
        self
    }

    /// Which reserved attribute name offloaded sends carry.
    #[must_use]
    pub fn reserved_attribute(mut self, attribute: ReservedAttribute) -> Self {
        self.config.reserved_attribute = attribute;
        self
    }

    /// Drop received messages whose payload is gone instead of failing the
    /// receive call.
    #[must_use]
    pub fn ignore_payload_not_found(mut self, ignore: bool) -> Self {
        self.config.ignore_payload_not_found = ignore;
        self
    }

    /// Prefix for generated object keys, e.g. `"events/"`.
    #[must_use]
    pub fn object_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.object_key_prefix = Some(prefix.into());
        self
    }

    /// Build the client, validating the configuration.
    pub fn build(self) -> Result<ExtendedSqsClient, ExtendedClientError> {
        let store = self.store.ok_or_else(|| {
            ExtendedClientError::InvalidArgument("a payload store is required".into())
        })?;
        if let Some(prefix) = self.config.object_key_prefix() {
            key::validate_key_prefix(prefix)?;
        }

        Ok(ExtendedSqsClient {
            sqs: self.sqs,
            store,
            config: self.config,
        })
    }
}

fn sqs_err(err: impl Into<aws_sdk_sqs::Error>) -> ExtendedClientError {
    ExtendedClientError::Sqs(Box::new(err.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LEGACY_RESERVED_ATTRIBUTE_NAME;
    use aws_sdk_sqs::types::MessageAttributeValue;
    use stowage_core::{MemoryPayloadStore, OffloadError};

    const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/jobs";

    // Unroutable endpoint and static credentials: a dispatch that slips
    // past client-side validation fails fast as an `Sqs` error.
    fn test_sqs_client() -> SqsClient {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(aws_sdk_sqs::config::BehaviorVersion::latest())
            .region(aws_sdk_sqs::config::Region::new("us-east-1"))
            .endpoint_url("http://127.0.0.1:1")
            .credentials_provider(aws_sdk_sqs::config::Credentials::new(
                "akid", "secret", None, None, "test",
            ))
            .build();
        SqsClient::from_conf(config)
    }

    #[test]
    fn builder_requires_a_store() {
        let err = ExtendedSqsClient::builder(test_sqs_client())
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtendedClientError::InvalidArgument(_)));
    }

    #[test]
    fn builder_rejects_bad_key_prefix() {
        let err = ExtendedSqsClient::builder(test_sqs_client())
            .payload_store(MemoryPayloadStore::new("payloads"))
            .object_key_prefix("../escape/")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ExtendedClientError::Offload(OffloadError::InvalidKeyPrefix(_))
        ));
    }

    #[test]
    fn builder_applies_configuration() {
        let client = ExtendedSqsClient::builder(test_sqs_client())
            .payload_store(MemoryPayloadStore::new("payloads"))
            .payload_size_threshold(1024)
            .always_through_store(true)
            .cleanup_on_delete(false)
            .reserved_attribute(ReservedAttribute::Current)
            .ignore_payload_not_found(true)
            .object_key_prefix("events/")
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.payload_size_threshold(), 1024);
        assert!(config.always_through_store());
        assert!(!config.cleanup_on_delete());
        assert_eq!(config.reserved_attribute(), ReservedAttribute::Current);
        assert!(config.ignore_payload_not_found());
        assert_eq!(config.object_key_prefix(), Some("events/"));
    }

    #[test]
    fn new_uses_defaults() {
        let client = ExtendedSqsClient::new(test_sqs_client(), MemoryPayloadStore::new("payloads"));
        assert_eq!(client.config().payload_size_threshold(), 262_144);
        assert!(client.config().cleanup_on_delete());
    }

    #[test]
    fn debug_redacts_clients() {
        let client = ExtendedSqsClient::new(test_sqs_client(), MemoryPayloadStore::new("payloads"));
        let rendered = format!("{client:?}");
        assert!(rendered.contains("<SqsClient>"));
        assert!(rendered.contains("payloads"));
    }

    #[tokio::test]
    async fn send_message_rejects_missing_or_empty_body() {
        let client = ExtendedSqsClient::new(test_sqs_client(), MemoryPayloadStore::new("payloads"));

        let missing = SendMessageInput::builder()
            .queue_url(QUEUE_URL)
            .build()
            .unwrap();
        let err = client.send_message(missing).await.unwrap_err();
        // A typed validation error, not `Sqs`: the guard ran before any
        // queue call.
        assert!(matches!(err, ExtendedClientError::InvalidArgument(_)));

        let empty = SendMessageInput::builder()
            .queue_url(QUEUE_URL)
            .message_body("")
            .build()
            .unwrap();
        let err = client.send_message(empty).await.unwrap_err();
        assert!(matches!(err, ExtendedClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn send_message_rejects_reserved_attribute_names() {
        let client = ExtendedSqsClient::new(test_sqs_client(), MemoryPayloadStore::new("payloads"));
        let reserved = MessageAttributeValue::builder()
            .data_type("Number")
            .string_value("123")
            .build()
            .unwrap();
        let input = SendMessageInput::builder()
            .queue_url(QUEUE_URL)
            .message_body("small")
            .message_attributes(LEGACY_RESERVED_ATTRIBUTE_NAME, reserved)
            .build()
            .unwrap();

        let err = client.send_message(input).await.unwrap_err();
        assert!(matches!(err, ExtendedClientError::ReservedAttributeName(_)));
    }

    #[tokio::test]
    async fn send_message_rejects_oversized_attributes() {
        let client = ExtendedSqsClient::new(test_sqs_client(), MemoryPayloadStore::new("payloads"));
        let oversized = MessageAttributeValue::builder()
            .data_type("String")
            .string_value("x".repeat(262_200))
            .build()
            .unwrap();
        let input = SendMessageInput::builder()
            .queue_url(QUEUE_URL)
            .message_body("small")
            .message_attributes("blob", oversized)
            .build()
            .unwrap();

        let err = client.send_message(input).await.unwrap_err();
        assert!(matches!(
            err,
            ExtendedClientError::AttributeSizeExceeded { .. }
        ));
    }
}
