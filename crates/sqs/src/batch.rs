//! Batch offload planning.

use std::cmp::Reverse;
use std::collections::HashMap;

use aws_sdk_sqs::types::SendMessageBatchRequestEntry;

use crate::config::OffloadConfig;
use crate::error::ExtendedClientError;
use crate::offload::{self, PreparedOffload};
use crate::policy;
use crate::size;

/// Pick the entries of a send batch that must be offloaded for the whole
/// batch to fit under the size threshold.
///
/// Entries are considered largest first (ties keep submission order) and
/// planning stops as soon as the running total fits, so store writes are
/// the minimum needed to clear the threshold. With `always_through_store`
/// every entry is planned.
///
/// Attribute validation runs only on planned entries, and any failure
/// aborts the whole plan. Nothing is written to the store here; the
/// returned `(index, prepared)` pairs carry the keys and rewritten
/// messages for the caller to store and apply.
pub fn plan_batch_offload(
    entries: &[SendMessageBatchRequestEntry],
    config: &OffloadConfig,
    namespace: &str,
) -> Result<Vec<(usize, PreparedOffload)>, ExtendedClientError> {
    let sizes: Vec<usize> = entries.iter().map(entry_size).collect();
    let mut total: usize = sizes.iter().sum();

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| Reverse(sizes[i]));

    let mut planned = Vec::new();
    let mut candidates = order.into_iter();
    while policy::exceeds_threshold(total, config) {
        let Some(i) = candidates.next() else { break };

        let entry = &entries[i];
        let empty = HashMap::new();
        let attributes = entry.message_attributes().unwrap_or(&empty);
        policy::check_attributes(attributes, config)?;

        let prepared =
            offload::prepare_offload(entry.message_body(), attributes, config, namespace)?;
        total = total - sizes[i] + prepared.rewritten_size();
        planned.push((i, prepared));
    }

    Ok(planned)
}

/// Rebuild a batch entry with its offloaded body and attributes, keeping
/// every other field (id, delay, FIFO settings) as submitted.
pub fn rewrite_entry(
    entry: &SendMessageBatchRequestEntry,
    prepared: PreparedOffload,
) -> Result<SendMessageBatchRequestEntry, ExtendedClientError> {
    Ok(SendMessageBatchRequestEntry::builder()
        .id(entry.id())
        .message_body(prepared.body)
        .set_delay_seconds(entry.delay_seconds)
        .set_message_attributes(Some(prepared.attributes))
        .set_message_system_attributes(entry.message_system_attributes.clone())
        .set_message_deduplication_id(entry.message_deduplication_id.clone())
        .set_message_group_id(entry.message_group_id.clone())
        .build()?)
}

fn entry_size(entry: &SendMessageBatchRequestEntry) -> usize {
    size::body_size(entry.message_body())
        + entry.message_attributes().map_or(0, size::attribute_size)
}
