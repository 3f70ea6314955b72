//! Offloading configuration.

/// Default size above which a message is routed through the payload store,
/// in bytes. Matches the queue's maximum message size (256 KiB).
pub const DEFAULT_PAYLOAD_SIZE_THRESHOLD: usize = 262_144;

/// SQS caps messages at ten attributes; one slot is kept free for the
/// reserved size attribute written on offload.
pub const MAX_ALLOWED_ATTRIBUTES: usize = 9;

/// Current name of the reserved attribute recording the original body size.
pub const RESERVED_ATTRIBUTE_NAME: &str = "ExtendedPayloadSize";

/// Reserved attribute name written by older producers. Recognized and
/// stripped on receive alongside the current name.
pub const LEGACY_RESERVED_ATTRIBUTE_NAME: &str = "SQSLargePayloadSize";

/// Both reserved attribute names, current first.
pub const RESERVED_ATTRIBUTE_NAMES: [&str; 2] =
    [RESERVED_ATTRIBUTE_NAME, LEGACY_RESERVED_ATTRIBUTE_NAME];

/// Which reserved attribute name is written on offloaded sends.
///
/// The read side always recognizes both; this only selects what new
/// messages carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReservedAttribute {
    /// `SQSLargePayloadSize`. The default, so consumers that predate the
    /// renamed attribute keep working.
    #[default]
    Legacy,
    /// `ExtendedPayloadSize`.
    Current,
}

impl ReservedAttribute {
    /// The attribute name this variant writes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Legacy => LEGACY_RESERVED_ATTRIBUTE_NAME,
            Self::Current => RESERVED_ATTRIBUTE_NAME,
        }
    }
}

/// Offloading behavior of an [`ExtendedSqsClient`](crate::ExtendedSqsClient).
///
/// Built through [`ExtendedSqsClientBuilder`](crate::ExtendedSqsClientBuilder);
/// fields are read-only afterwards.
#[derive(Debug, Clone)]
pub struct OffloadConfig {
    pub(crate) payload_size_threshold: usize,
    pub(crate) always_through_store: bool,
    pub(crate) cleanup_on_delete: bool,
    pub(crate) reserved_attribute: ReservedAttribute,
    pub(crate) ignore_payload_not_found: bool,
    pub(crate) object_key_prefix: Option<String>,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            payload_size_threshold: DEFAULT_PAYLOAD_SIZE_THRESHOLD,
            always_through_store: false,
            cleanup_on_delete: true,
            reserved_attribute: ReservedAttribute::default(),
            ignore_payload_not_found: false,
            object_key_prefix: None,
        }
    }
}

impl OffloadConfig {
    /// Set the size above which bodies are moved to the store.
    #[must_use]
    pub fn with_payload_size_threshold(mut self, bytes: usize) -> Self {
        self.payload_size_threshold = bytes;
        self
    }

    /// Route every message through the store regardless of size.
    #[must_use]
    pub fn with_always_through_store(mut self, always: bool) -> Self {
        self.always_through_store = always;
        self
    }

    /// Set whether deleting a message also deletes its stored payload.
    #[must_use]
    pub fn with_cleanup_on_delete(mut self, cleanup: bool) -> Self {
        self.cleanup_on_delete = cleanup;
        self
    }

    /// Set which reserved attribute name offloaded sends carry.
    #[must_use]
    pub fn with_reserved_attribute(mut self, attribute: ReservedAttribute) -> Self {
        self.reserved_attribute = attribute;
        self
    }

    /// Drop received messages whose payload is gone instead of failing the
    /// receive call.
    #[must_use]
    pub fn with_ignore_payload_not_found(mut self, ignore: bool) -> Self {
        self.ignore_payload_not_found = ignore;
        self
    }

    /// Set the prefix prepended to generated object keys.
    #[must_use]
    pub fn with_object_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_key_prefix = Some(prefix.into());
        self
    }

    /// Message size above which the body is moved to the payload store.
    #[must_use]
    pub fn payload_size_threshold(&self) -> usize {
        self.payload_size_threshold
    }

    /// Whether every message is offloaded regardless of size.
    #[must_use]
    pub fn always_through_store(&self) -> bool {
        self.always_through_store
    }

    /// Whether deleting a message also deletes its stored payload.
    #[must_use]
    pub fn cleanup_on_delete(&self) -> bool {
        self.cleanup_on_delete
    }

    /// Reserved attribute name written on offloaded sends.
    #[must_use]
    pub fn reserved_attribute(&self) -> ReservedAttribute {
        self.reserved_attribute
    }

    /// Whether a missing payload on receive drops the message instead of
    /// failing the call.
    #[must_use]
    pub fn ignore_payload_not_found(&self) -> bool {
        self.ignore_payload_not_found
    }

    /// Prefix prepended to generated object keys.
    #[must_use]
    pub fn object_key_prefix(&self) -> Option<&str> {
        self.object_key_prefix.as_deref()
    }
}
