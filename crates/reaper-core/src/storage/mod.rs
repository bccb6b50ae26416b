//! Provider API surface consumed by the reaper.
//!
//! [`ObjectStorage`] names the five S3 operations the reaper needs.
//! [`S3Storage`] implements it on top of `aws-sdk-s3`; [`MemoryStorage`]
//! keeps buckets in process and records every batch it receives.
//!
//! # Object safety
//!
//! The trait uses `#[async_trait]` so it can be used behind
//! `Box<dyn ObjectStorage>` as well as through generics.

mod memory;
mod s3;

pub use memory::MemoryStorage;
pub use s3::S3Storage;

use crate::error::StorageError;
use crate::model::{DeleteOutcome, DeletionBatch, ObjectPage, VersionPage, VersioningStatus};

/// Object-storage operations needed to empty and delete a bucket.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// `GetBucketVersioning`.
    async fn get_bucket_versioning(&self, bucket: &str)
    -> Result<VersioningStatus, StorageError>;

    /// `ListObjectVersions`, resuming after the given markers.
    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
        max_keys: usize,
    ) -> Result<VersionPage, StorageError>;

    /// `ListObjectsV2`, resuming from the given continuation token.
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage, StorageError>;

    /// `DeleteObjects` for one batch.
    ///
    /// A call-level failure is an `Err`. Per-item refusals are reported in
    /// [`DeleteOutcome::failures`].
    async fn delete_objects(
        &self,
        bucket: &str,
        batch: &DeletionBatch,
    ) -> Result<DeleteOutcome, StorageError>;

    /// `DeleteBucket`. The provider rejects non-empty buckets.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError>;
}

macro_rules! forward_object_storage {
    ($($ty:ty),+) => {$(
        #[async_trait::async_trait]
        impl<T: ObjectStorage + ?Sized> ObjectStorage for $ty {
            async fn get_bucket_versioning(
                &self,
                bucket: &str,
            ) -> Result<VersioningStatus, StorageError> {
                (**self).get_bucket_versioning(bucket).await
            }

            async fn list_object_versions(
                &self,
                bucket: &str,
                key_marker: Option<&str>,
                version_id_marker: Option<&str>,
                max_keys: usize,
            ) -> Result<VersionPage, StorageError> {
                (**self)
                    .list_object_versions(bucket, key_marker, version_id_marker, max_keys)
                    .await
            }

            async fn list_objects(
                &self,
                bucket: &str,
                continuation_token: Option<&str>,
                max_keys: usize,
            ) -> Result<ObjectPage, StorageError> {
                (**self).list_objects(bucket, continuation_token, max_keys).await
            }

            async fn delete_objects(
                &self,
                bucket: &str,
                batch: &DeletionBatch,
            ) -> Result<DeleteOutcome, StorageError> {
                (**self).delete_objects(bucket, batch).await
            }

            async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError> {
                (**self).delete_bucket(bucket).await
            }
        }
    )+};
}

forward_object_storage!(&T, Box<T>);
