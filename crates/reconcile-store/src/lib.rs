//! Storage capability for bucket-reconcile.
//!
//! The reconciliation engine talks to object stores only through the
//! [`StorageClient`] trait. Two backends are provided:
//!
//! - [`S3Store`]: any S3-compatible service (AWS, Cloudflare R2, MinIO)
//!   through `aws-sdk-s3`.
//! - [`InMemoryStore`]: a process-local store with S3-like paging and an
//!   injectable [`FaultPlan`], used by tests and dry runs.
//!
//! # Architecture
//!
//! ```text
//! Reconciler / ObjectCatalog
//!        |
//!        v
//!  dyn StorageClient
//!     |          |
//!     v          v
//!  S3Store   InMemoryStore
//! ```

mod client;
pub mod error;
pub mod memory;
pub mod s3;
mod types;

pub use client::StorageClient;
pub use error::{StoreError, StoreResult};
pub use memory::{FaultPlan, InMemoryStore};
pub use s3::S3Store;
pub use types::{CountPage, ObjectContent, ObjectHead, ObjectPage, ObjectRecord};
