use thiserror::Error;

/// Errors from payload offloading primitives and payload store backends.
#[derive(Debug, Error)]
pub enum OffloadError {
    /// A message body could not be parsed as a payload pointer.
    #[error("malformed payload pointer: {0}")]
    MalformedPointer(String),

    /// The configured object key prefix violates the key-safety rules.
    #[error("invalid object key prefix: {0}")]
    InvalidKeyPrefix(String),

    /// The payload object a pointer refers to does not exist.
    #[error("payload not found: {bucket}/{key}")]
    PayloadNotFound {
        /// Namespace (bucket) the pointer referenced.
        bucket: String,
        /// Object key the pointer referenced.
        key: String,
    },

    /// An error surfaced by the payload store backend.
    ///
    /// The concrete backend error is preserved rather than stringified, so
    /// callers can downcast (e.g. to the S3 SDK's service error) and apply
    /// their own retry policy.
    #[error(transparent)]
    Store(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl OffloadError {
    /// Wrap a backend error without losing its concrete type.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }

    /// Returns `true` for [`OffloadError::PayloadNotFound`], which receive
    /// paths may be configured to tolerate.
    pub fn is_payload_not_found(&self) -> bool {
        matches!(self, Self::PayloadNotFound { .. })
    }
}
