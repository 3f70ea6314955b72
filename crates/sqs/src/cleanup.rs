//! Delete-time payload cleanup.

use stowage_core::{PayloadStore, handle};
use tracing::{debug, warn};

use crate::config::OffloadConfig;
use crate::error::ExtendedClientError;

/// Delete the stored payload named by an augmented receipt handle (when
/// cleanup is enabled) and return the handle to forward to the queue.
///
/// Plain handles pass through untouched. The store delete happens before
/// the caller's queue delete, so a failure here leaves the message visible
/// for a retry instead of orphaning the payload.
pub async fn cleanup_payload(
    receipt_handle: &str,
    store: &dyn PayloadStore,
    config: &OffloadConfig,
) -> Result<String, ExtendedClientError> {
    if !handle::is_offloaded(receipt_handle) {
        return Ok(receipt_handle.to_owned());
    }

    if config.cleanup_on_delete() {
        if let Some(pointer) = handle::extract_pointer(receipt_handle) {
            store.delete_payload(&pointer).await?;
            debug!(bucket = %pointer.bucket, key = %pointer.key, "deleted offloaded payload");
        }
    }

    Ok(handle::original_handle(receipt_handle)
        .unwrap_or(receipt_handle)
        .to_owned())
}

/// De-augment a receipt handle without touching the store. Visibility
/// changes use this: the message has not been consumed, so its payload must
/// survive.
#[must_use]
pub fn strip_handle(receipt_handle: &str) -> &str {
    handle::original_handle(receipt_handle).unwrap_or(receipt_handle)
}

/// Cleanup for one entry of a batch delete. A failed payload delete is
/// logged and the de-augmented handle is still returned, so one entry's
/// cleanup never blocks its siblings or the queue call.
pub async fn cleanup_batch_entry(
    id: &str,
    receipt_handle: &str,
    store: &dyn PayloadStore,
    config: &OffloadConfig,
) -> String {
    match cleanup_payload(receipt_handle, store, config).await {
        Ok(original) => original,
        Err(err) => {
            warn!(id, error = %err, "payload cleanup failed, forwarding delete anyway");
            strip_handle(receipt_handle).to_owned()
        }
    }
}
