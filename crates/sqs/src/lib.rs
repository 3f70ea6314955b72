//! Transparent payload offloading for SQS.
//!
//! SQS caps a message (body plus attributes) at 256 KiB. [`ExtendedSqsClient`]
//! wraps an [`aws_sdk_sqs::Client`] together with a payload store; bodies
//! over the threshold are written to the store and travel the queue as a
//! small pointer document. Receives resolve pointers back into full bodies,
//! deletes clean up the stored payload, and receipt handles keep working
//! across the round trip. Requests and responses stay the plain SDK types,
//! so swapping the decorated client in does not change calling code.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn wiring() -> Result<(), Box<dyn std::error::Error>> {
//! use aws_sdk_sqs::operation::send_message::SendMessageInput;
//! use stowage_s3::S3PayloadStore;
//! use stowage_sqs::ExtendedSqsClient;
//!
//! let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
//!     .load()
//!     .await;
//! let store = S3PayloadStore::new(aws_sdk_s3::Client::new(&aws_config), "payload-bucket");
//! let client = ExtendedSqsClient::builder(aws_sdk_sqs::Client::new(&aws_config))
//!     .payload_store(store)
//!     .build()?;
//!
//! let input = SendMessageInput::builder()
//!     .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/jobs")
//!     .message_body("a".repeat(300 * 1024))
//!     .build()?;
//! client.send_message(input).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod error;
pub mod offload;
pub mod policy;
pub mod receive;
pub mod size;

pub use client::{ExtendedSqsClient, ExtendedSqsClientBuilder};
pub use config::{
    DEFAULT_PAYLOAD_SIZE_THRESHOLD, LEGACY_RESERVED_ATTRIBUTE_NAME, MAX_ALLOWED_ATTRIBUTES,
    OffloadConfig, RESERVED_ATTRIBUTE_NAME, RESERVED_ATTRIBUTE_NAMES, ReservedAttribute,
};
pub use error::ExtendedClientError;

pub use stowage_core::{MemoryPayloadStore, OffloadError, PayloadPointer, PayloadStore};
