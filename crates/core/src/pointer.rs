//! Payload pointer serialization.
//!
//! An offloaded message carries a small JSON document in place of its body,
//! naming the store namespace (bucket) and object key where the real payload
//! lives:
//!
//! ```json
//! {"s3BucketName":"my-bucket","s3Key":"4cd1cd18-..."}
//! ```
//!
//! Older producers wrapped the pointer in a two-element array with a type tag
//! as the first element. Both forms are accepted on the read path; only the
//! bare object is ever produced.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::OffloadError;

/// Type tag emitted by current producers of the wrapper-array pointer form.
pub const POINTER_TYPE_TAG: &str = "software.amazon.payloadoffloading.PayloadS3Pointer";

/// Type tag emitted by legacy producers. Rewritten to [`POINTER_TYPE_TAG`]
/// before parsing so old messages stay readable.
pub const LEGACY_POINTER_TYPE_TAG: &str = "com.amazon.sqs.javamessaging.MessageS3Pointer";

/// Location of an offloaded payload in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadPointer {
    /// Store namespace holding the payload object.
    #[serde(rename = "s3BucketName")]
    pub bucket: String,
    /// Key of the payload object within the namespace.
    #[serde(rename = "s3Key")]
    pub key: String,
}

impl PayloadPointer {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Render the pointer as the JSON document sent in place of the payload.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("two string fields always serialize")
    }

    /// Parse a pointer from a message body.
    ///
    /// Accepts the bare-object form and the tagged wrapper-array form, with
    /// the legacy type tag rewritten to the current one first. Anything else
    /// is a [`OffloadError::MalformedPointer`].
    pub fn from_json(raw: &str) -> Result<Self, OffloadError> {
        let raw = if raw.contains(LEGACY_POINTER_TYPE_TAG) {
            Cow::Owned(raw.replace(LEGACY_POINTER_TYPE_TAG, POINTER_TYPE_TAG))
        } else {
            Cow::Borrowed(raw)
        };

        if raw.trim_start().starts_with('[') {
            let (tag, pointer): (String, Self) =
                serde_json::from_str(&raw).map_err(|err| malformed(&err))?;
            if tag != POINTER_TYPE_TAG {
                return Err(OffloadError::MalformedPointer(format!(
                    "unrecognized pointer type tag: {tag}"
                )));
            }
            return Ok(pointer);
        }

        serde_json::from_str(&raw).map_err(|err| malformed(&err))
    }
}

fn malformed(err: &serde_json::Error) -> OffloadError {
    OffloadError::MalformedPointer(err.to_string())
}
