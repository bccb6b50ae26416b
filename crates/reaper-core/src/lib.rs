//! Empty and delete an S3 bucket.
//!
//! The [`Reaper`] removes every object version and delete marker (when the
//! bucket is versioned), then every current object, then the bucket itself.
//! It talks to storage through the [`ObjectStorage`] trait, implemented for
//! AWS by [`S3Storage`] and in process by [`MemoryStorage`].

pub mod config;
pub mod error;
pub mod model;
mod reaper;
pub mod storage;

pub use config::ReaperConfig;
pub use error::{Phase, ReapError, ReapResult, StorageError};
pub use model::{
    DeleteFailure, DeleteOutcome, DeletionBatch, MAX_DELETE_BATCH, ObjectIdentifier, ObjectPage,
    VersionEntry, VersionPage, VersioningStatus,
};
pub use reaper::{PurgeStats, ReapOptions, ReapReport, ReapState, Reaper};
pub use storage::{MemoryStorage, ObjectStorage, S3Storage};
