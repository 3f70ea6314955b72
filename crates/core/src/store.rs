use async_trait::async_trait;

use crate::error::OffloadError;
use crate::pointer::PayloadPointer;

/// Backend that holds offloaded payloads.
///
/// Implementations are addressed through [`PayloadPointer`]s: storing a
/// payload yields the pointer that later fetches or deletes it.
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Namespace (bucket) that stored payloads land in.
    ///
    /// Exposed separately from [`store_payload`](Self::store_payload) so
    /// callers can compute the size of a pointer document before writing
    /// anything.
    fn namespace(&self) -> &str;

    /// Write a payload under `key` and return the pointer to it.
    async fn store_payload(&self, key: &str, payload: &str)
    -> Result<PayloadPointer, OffloadError>;

    /// Fetch the payload a pointer refers to.
    ///
    /// Returns [`OffloadError::PayloadNotFound`] when the object does not
    /// exist (including when it was already deleted).
    async fn fetch_payload(&self, pointer: &PayloadPointer) -> Result<String, OffloadError>;

    /// Delete the payload a pointer refers to. Deleting an absent payload is
    /// not an error.
    async fn delete_payload(&self, pointer: &PayloadPointer) -> Result<(), OffloadError>;
}
