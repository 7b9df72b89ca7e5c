//! ERM Storage - Storage backends for the entity/relationship model
//!
//! This crate provides record-level backends ([`MemoryStorage`],
//! [`RedbStorage`]) and [`GraphStore`], which turns any backend into the
//! repositories the `erm-core` use cases consume.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod memory;
pub mod store;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use store::GraphStore;
pub use traits::StorageBackend;

#[cfg(feature = "redb")]
pub use redb::RedbStorage;
