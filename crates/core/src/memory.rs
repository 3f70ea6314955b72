//! In-memory payload store for tests and local development.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::OffloadError;
use crate::pointer::PayloadPointer;
use crate::store::PayloadStore;

/// [`PayloadStore`] backed by a concurrent in-process map.
///
/// Behaves like the real store from the caller's perspective: fetching a
/// payload that was never stored (or was deleted) fails with
/// [`OffloadError::PayloadNotFound`], and pointers into a different
/// namespace never resolve.
#[derive(Debug, Default)]
pub struct MemoryPayloadStore {
    namespace: String,
    objects: DashMap<String, String>,
}

impl MemoryPayloadStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            objects: DashMap::new(),
        }
    }

    /// Number of payloads currently held.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether a payload exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// The payload stored under `key`, if any.
    #[must_use]
    pub fn payload(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl PayloadStore for MemoryPayloadStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn store_payload(
        &self,
        key: &str,
        payload: &str,
    ) -> Result<PayloadPointer, OffloadError> {
        self.objects.insert(key.to_owned(), payload.to_owned());
        Ok(PayloadPointer::new(&self.namespace, key))
    }

    async fn fetch_payload(&self, pointer: &PayloadPointer) -> Result<String, OffloadError> {
        if pointer.bucket != self.namespace {
            return Err(not_found(pointer));
        }
        self.objects
            .get(&pointer.key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(pointer))
    }

    async fn delete_payload(&self, pointer: &PayloadPointer) -> Result<(), OffloadError> {
        if pointer.bucket == self.namespace {
            self.objects.remove(&pointer.key);
        }
        Ok(())
    }
}

fn not_found(pointer: &PayloadPointer) -> OffloadError {
    OffloadError::PayloadNotFound {
        bucket: pointer.bucket.clone(),
        key: pointer.key.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_fetch_round_trip() {
        let store = MemoryPayloadStore::new("payloads");
        let pointer = store.store_payload("key-1", "hello").await.unwrap();

        assert_eq!(pointer, PayloadPointer::new("payloads", "key-1"));
        assert_eq!(store.fetch_payload(&pointer).await.unwrap(), "hello");
        assert_eq!(store.object_count(), 1);
        assert!(store.contains("key-1"));
    }

    #[tokio::test]
    async fn fetch_of_missing_payload_is_not_found() {
        let store = MemoryPayloadStore::new("payloads");
        let err = store
            .fetch_payload(&PayloadPointer::new("payloads", "absent"))
            .await
            .unwrap_err();
        assert!(err.is_payload_not_found());
    }

    #[tokio::test]
    async fn fetch_across_namespaces_is_not_found() {
        let store = MemoryPayloadStore::new("payloads");
        store.store_payload("key-1", "hello").await.unwrap();

        let err = store
            .fetch_payload(&PayloadPointer::new("other-bucket", "key-1"))
            .await
            .unwrap_err();
        assert!(err.is_payload_not_found());
    }

    #[tokio::test]
    async fn delete_removes_payload_and_is_idempotent() {
        let store = MemoryPayloadStore::new("payloads");
        let pointer = store.store_payload("key-1", "hello").await.unwrap();

        store.delete_payload(&pointer).await.unwrap();
        assert!(!store.contains("key-1"));
        assert!(store.fetch_payload(&pointer).await.is_err());

        store.delete_payload(&pointer).await.unwrap();
    }

    #[tokio::test]
    async fn delete_in_foreign_namespace_leaves_payload_alone() {
        let store = MemoryPayloadStore::new("payloads");
        store.store_payload("key-1", "hello").await.unwrap();

        store
            .delete_payload(&PayloadPointer::new("other-bucket", "key-1"))
            .await
            .unwrap();
        assert!(store.contains("key-1"));
    }
}
