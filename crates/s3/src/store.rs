use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption};
use stowage_core::{OffloadError, PayloadPointer, PayloadStore};
use tracing::{debug, error, info};

/// Server-side encryption applied to stored payload objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionStrategy {
    /// SSE-KMS with the AWS managed key for the bucket.
    AwsManagedKey,
    /// SSE-KMS with a customer managed key.
    CustomerKey {
        /// Key id or ARN passed to S3 on every put.
        kms_key_id: String,
    },
}

/// [`PayloadStore`] backed by an S3 bucket.
///
/// Payloads are stored as UTF-8 text objects. A missing object on fetch maps
/// to [`OffloadError::PayloadNotFound`]; every other service error is passed
/// through untyped so callers can inspect the underlying SDK error.
#[derive(Clone)]
pub struct S3PayloadStore {
    client: S3Client,
    bucket: String,
    encryption: Option<EncryptionStrategy>,
    canned_acl: Option<ObjectCannedAcl>,
}

impl S3PayloadStore {
    /// Create a store writing to `bucket` with no encryption or ACL options.
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self::builder(client, bucket).build()
    }

    /// Start configuring a store for `bucket`.
    pub fn builder(client: S3Client, bucket: impl Into<String>) -> S3PayloadStoreBuilder {
        S3PayloadStoreBuilder {
            client,
            bucket: bucket.into(),
            encryption: None,
            canned_acl: None,
        }
    }

    /// The bucket this store writes to.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl fmt::Debug for S3PayloadStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3PayloadStore")
            .field("client", &"<S3Client>")
            .field("bucket", &self.bucket)
            .field("encryption", &self.encryption)
            .field("canned_acl", &self.canned_acl)
            .finish()
    }
}

/// Builder for [`S3PayloadStore`].
#[derive(Debug)]
pub struct S3PayloadStoreBuilder {
    client: S3Client,
    bucket: String,
    encryption: Option<EncryptionStrategy>,
    canned_acl: Option<ObjectCannedAcl>,
}

impl S3PayloadStoreBuilder {
    /// Encrypt stored objects server-side.
    #[must_use]
    pub fn encryption(mut self, encryption: EncryptionStrategy) -> Self {
        self.encryption = Some(encryption);
        self
    }

    /// Apply a canned ACL to stored objects.
    #[must_use]
    pub fn canned_acl(mut self, acl: ObjectCannedAcl) -> Self {
        self.canned_acl = Some(acl);
        self
    }

    /// Build the store.
    #[must_use]
    pub fn build(self) -> S3PayloadStore {
        S3PayloadStore {
            client: self.client,
            bucket: self.bucket,
            encryption: self.encryption,
            canned_acl: self.canned_acl,
        }
    }
}

#[async_trait]
impl PayloadStore for S3PayloadStore {
    fn namespace(&self) -> &str {
        &self.bucket
    }

    async fn store_payload(
        &self,
        key: &str,
        payload: &str,
    ) -> Result<PayloadPointer, OffloadError> {
        debug!(bucket = %self.bucket, key, size = payload.len(), "uploading payload to S3");

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(payload.as_bytes().to_vec()));

        match &self.encryption {
            Some(EncryptionStrategy::AwsManagedKey) => {
                request = request.server_side_encryption(ServerSideEncryption::AwsKms);
            }
            Some(EncryptionStrategy::CustomerKey { kms_key_id }) => {
                request = request
                    .server_side_encryption(ServerSideEncryption::AwsKms)
                    .ssekms_key_id(kms_key_id);
            }
            None => {}
        }
        if let Some(acl) = &self.canned_acl {
            request = request.acl(acl.clone());
        }

        request.send().await.map_err(|err| {
            let err = aws_sdk_s3::Error::from(err);
            error!(error = %err, "S3 put_object failed");
            OffloadError::store(err)
        })?;

        info!(bucket = %self.bucket, key, "payload uploaded");
        Ok(PayloadPointer::new(&self.bucket, key))
    }

    async fn fetch_payload(&self, pointer: &PayloadPointer) -> Result<String, OffloadError> {
        debug!(bucket = %pointer.bucket, key = %pointer.key, "downloading payload from S3");

        let result = self
            .client
            .get_object()
            .bucket(&pointer.bucket)
            .key(&pointer.key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    debug!(bucket = %pointer.bucket, key = %pointer.key, "payload object missing");
                    OffloadError::PayloadNotFound {
                        bucket: pointer.bucket.clone(),
                        key: pointer.key.clone(),
                    }
                } else {
                    let err = aws_sdk_s3::Error::from(err);
                    error!(error = %err, "S3 get_object failed");
                    OffloadError::store(err)
                }
            })?;

        let data = result
            .body
            .collect()
            .await
            .map_err(OffloadError::store)?
            .into_bytes();

        info!(bucket = %pointer.bucket, key = %pointer.key, size = data.len(), "payload downloaded");
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    async fn delete_payload(&self, pointer: &PayloadPointer) -> Result<(), OffloadError> {
        debug!(bucket = %pointer.bucket, key = %pointer.key, "deleting payload from S3");

        self.client
            .delete_object()
            .bucket(&pointer.bucket)
            .key(&pointer.key)
            .send()
            .await
            .map_err(|err| {
                let err = aws_sdk_s3::Error::from(err);
                error!(error = %err, "S3 delete_object failed");
                OffloadError::store(err)
            })?;

        info!(bucket = %pointer.bucket, key = %pointer.key, "payload deleted");
        Ok(())
    }
}
