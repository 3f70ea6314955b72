//! S3-backed payload store.
//!
//! Implements [`stowage_core::PayloadStore`] on top of the AWS S3 SDK, with
//! optional server-side encryption and canned ACLs on stored objects.

pub mod store;

pub use store::{EncryptionStrategy, S3PayloadStore, S3PayloadStoreBuilder};
