//! Receive-side rehydration.

use aws_sdk_sqs::operation::receive_message::ReceiveMessageOutput;
use aws_sdk_sqs::types::Message;
use futures::future::try_join_all;
use stowage_core::{PayloadPointer, PayloadStore, handle};
use tracing::debug;

use crate::config::{OffloadConfig, RESERVED_ATTRIBUTE_NAMES};
use crate::error::ExtendedClientError;

/// Outcome of rehydrating one received message.
#[derive(Debug)]
pub enum Rehydrated {
    /// The message to hand to the consumer, rehydrated or passed through.
    Message(Message),
    /// The message's payload is gone and the configuration tolerates that:
    /// drop it from the result set and delete it from the queue.
    DropAndDelete {
        /// Queue receipt handle, never augmented (there is no payload left
        /// to track).
        receipt_handle: Option<String>,
    },
}

/// Extend the caller's requested message attribute names so offloaded
/// messages are recognizable regardless of which reserved name wrote them.
/// Existing entries are kept; each reserved name is appended at most once.
#[must_use]
pub fn merge_attribute_names(requested: &[String]) -> Vec<String> {
    let mut names = requested.to_vec();
    for reserved in RESERVED_ATTRIBUTE_NAMES {
        if !names.iter().any(|name| name == reserved) {
            names.push(reserved.to_owned());
        }
    }
    names
}

/// Resolve one received message against the payload store.
///
/// Messages without a reserved size attribute pass through unchanged, which
/// also makes rehydration idempotent. Offloaded messages get their pointer
/// body replaced by the stored payload, both reserved attribute names
/// stripped, and the pointer folded into the receipt handle so delete can
/// find the payload later.
pub async fn rehydrate_message(
    message: Message,
    store: &dyn PayloadStore,
    config: &OffloadConfig,
) -> Result<Rehydrated, ExtendedClientError> {
    if !has_reserved_attribute(&message) {
        return Ok(Rehydrated::Message(message));
    }

    let pointer = PayloadPointer::from_json(message.body().unwrap_or_default())?;

    let payload = match store.fetch_payload(&pointer).await {
        Ok(payload) => payload,
        Err(err) if err.is_payload_not_found() && config.ignore_payload_not_found() => {
            debug!(bucket = %pointer.bucket, key = %pointer.key, "payload gone, dropping message");
            return Ok(Rehydrated::DropAndDelete {
                receipt_handle: message.receipt_handle,
            });
        }
        Err(err) => return Err(err.into()),
    };

    let receipt_handle = message
        .receipt_handle()
        .map(|original| handle::embed(original, &pointer));

    let mut attributes = message.message_attributes.unwrap_or_default();
    for name in RESERVED_ATTRIBUTE_NAMES {
        attributes.remove(name);
    }

    // MD5 fields keep the queue's values, computed over the wire form.
    let rebuilt = Message::builder()
        .set_message_id(message.message_id)
        .set_receipt_handle(receipt_handle)
        .set_md5_of_body(message.md5_of_body)
        .set_body(Some(payload))
        .set_attributes(message.attributes)
        .set_md5_of_message_attributes(message.md5_of_message_attributes)
        .set_message_attributes((!attributes.is_empty()).then_some(attributes))
        .build();

    Ok(Rehydrated::Message(rebuilt))
}

/// Resolve every message of a receive response, rewriting the response in
/// place.
///
/// Only the `messages` list changes (order and the none-vs-empty
/// distinction are preserved); everything else on the response, request
/// metadata included, stays as the queue returned it. Store fetches run
/// concurrently. Returns the receipt handles of messages dropped because
/// their payload is gone, for the caller to delete from the queue.
pub async fn rehydrate_output(
    output: &mut ReceiveMessageOutput,
    store: &dyn PayloadStore,
    config: &OffloadConfig,
) -> Result<Vec<String>, ExtendedClientError> {
    let had_messages = output.messages.is_some();
    let received = output.messages.take().unwrap_or_default();

    let rehydrated = try_join_all(
        received
            .into_iter()
            .map(|message| rehydrate_message(message, store, config)),
    )
    .await?;

    let mut messages = Vec::with_capacity(rehydrated.len());
    let mut dropped = Vec::new();
    for outcome in rehydrated {
        match outcome {
            Rehydrated::Message(message) => messages.push(message),
            Rehydrated::DropAndDelete { receipt_handle } => {
                if let Some(receipt_handle) = receipt_handle {
                    dropped.push(receipt_handle);
                }
            }
        }
    }

    output.messages = had_messages.then_some(messages);
    Ok(dropped)
}

fn has_reserved_attribute(message: &Message) -> bool {
    message.message_attributes().is_some_and(|attributes| {
        RESERVED_ATTRIBUTE_NAMES
            .iter()
            .any(|name| attributes.contains_key(*name))
    })
}
