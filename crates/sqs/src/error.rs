use stowage_core::OffloadError;
use thiserror::Error;

/// Errors surfaced by the extended SQS client.
///
/// Validation errors are raised before any network call. Queue and store
/// errors pass through with their original types intact so callers can apply
/// their own retry policies.
#[derive(Debug, Error)]
pub enum ExtendedClientError {
    /// A request was rejected before any network call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Message attributes alone exceed the size threshold. Attributes are
    /// never offloaded, so such a message can never fit.
    #[error(
        "message attributes total {size} bytes, over the {threshold}-byte threshold; \
         attributes cannot be offloaded, move large values into the message body"
    )]
    AttributeSizeExceeded {
        /// Combined byte size of the attributes.
        size: usize,
        /// Configured threshold.
        threshold: usize,
    },

    /// More attributes than can be sent alongside the reserved size
    /// attribute.
    #[error("message has {count} attributes, limit is {max} plus the reserved attribute")]
    TooManyAttributes {
        /// Attributes on the message.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// The caller supplied an attribute under a name reserved for the
    /// original-size marker.
    #[error("message attribute name {0:?} is reserved")]
    ReservedAttributeName(&'static str),

    /// A payload store operation failed.
    #[error(transparent)]
    Offload(#[from] OffloadError),

    /// The queue rejected a request.
    #[error(transparent)]
    Sqs(Box<aws_sdk_sqs::Error>),

    /// A request could not be assembled from its parts.
    #[error("invalid request: {0}")]
    Build(#[from] aws_sdk_sqs::error::BuildError),
}

impl From<aws_sdk_sqs::Error> for ExtendedClientError {
    fn from(err: aws_sdk_sqs::Error) -> Self {
        Self::Sqs(Box::new(err))
    }
}
