//! Queue-agnostic payload offloading primitives.
//!
//! Message queues cap payload sizes; large payloads are written to a blob
//! store instead and the queue carries a small pointer document in their
//! place. This crate holds the pieces of that scheme that do not depend on
//! any particular queue or store:
//!
//! - [`PayloadPointer`], the JSON pointer document and its legacy-compatible
//!   parsing rules,
//! - receipt-handle augmentation in [`handle`], which folds a pointer into a
//!   receipt handle so it survives until the message is deleted,
//! - object key generation and prefix validation in [`key`],
//! - the [`PayloadStore`] trait that store backends implement, plus the
//!   in-process [`MemoryPayloadStore`] for tests.

pub mod error;
pub mod handle;
pub mod key;
pub mod memory;
pub mod pointer;
pub mod store;

pub use error::OffloadError;
pub use memory::MemoryPayloadStore;
pub use pointer::{LEGACY_POINTER_TYPE_TAG, POINTER_TYPE_TAG, PayloadPointer};
pub use store::PayloadStore;
