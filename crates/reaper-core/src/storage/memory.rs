//! In-process [`ObjectStorage`].
//!
//! Models the parts of S3 the reaper touches: per-bucket versioning status,
//! version stacks with delete markers (newest first), `BTreeMap` ordering for
//! correct pagination, and batch deletes. Keys can be marked as undeletable
//! to produce per-item `DeleteObjects` errors. Every batch received is
//! recorded so callers can assert on request shapes.

use std::collections::{BTreeMap, HashSet};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::ObjectStorage;
use crate::error::StorageError;
use crate::model::{
    DeleteFailure, DeleteOutcome, DeletionBatch, ObjectIdentifier, ObjectPage, VersionEntry,
    VersionPage, VersioningStatus,
};

/// Version id S3 assigns to objects written while versioning is off.
const NULL_VERSION_ID: &str = "null";

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    is_delete_marker: bool,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    versioning: VersioningStatus,
    /// Key to versions, newest first.
    objects: BTreeMap<String, Vec<StoredVersion>>,
    /// Keys that `DeleteObjects` refuses with `AccessDenied`.
    protected: HashSet<String>,
}

impl MemoryBucket {
    fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn put(&mut self, key: &str, is_delete_marker: bool) -> String {
        let versions = self.objects.entry(key.to_owned()).or_default();
        let version_id = if self.versioning == VersioningStatus::Enabled {
            Uuid::new_v4().to_string()
        } else {
            // Unversioned and suspended writes replace the "null" version.
            versions.retain(|v| v.version_id != NULL_VERSION_ID);
            NULL_VERSION_ID.to_owned()
        };
        versions.insert(
            0,
            StoredVersion {
                version_id: version_id.clone(),
                is_delete_marker,
            },
        );
        version_id
    }

    fn delete_current(&mut self, key: &str) {
        if self.versioning == VersioningStatus::Unversioned {
            self.objects.remove(key);
        } else if self.objects.contains_key(key) {
            self.put(key, true);
        }
    }

    fn delete_version(&mut self, key: &str, version_id: &str) {
        if let Some(versions) = self.objects.get_mut(key) {
            versions.retain(|v| v.version_id != version_id);
            if versions.is_empty() {
                self.objects.remove(key);
            }
        }
    }

    fn current_keys(&self) -> impl Iterator<Item = &String> {
        self.objects
            .iter()
            .filter(|(_, versions)| versions.first().is_some_and(|v| !v.is_delete_marker))
            .map(|(key, _)| key)
    }
}

/// In-memory bucket store.
///
/// # Examples
///
/// ```
/// use reaper_core::MemoryStorage;
///
/// let storage = MemoryStorage::new();
/// storage.create_bucket("photos");
/// storage.put_object("photos", "cat.jpg");
/// assert_eq!(storage.entry_count("photos"), Some(1));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    buckets: Mutex<BTreeMap<String, MemoryBucket>>,
    batches: Mutex<Vec<DeletionBatch>>,
}

impl MemoryStorage {
    /// Create an empty store with no buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket. Existing buckets are left untouched.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.lock().entry(bucket.to_owned()).or_default();
    }

    /// Set a bucket's versioning status. Returns `false` if the bucket is missing.
    pub fn set_versioning(&self, bucket: &str, status: VersioningStatus) -> bool {
        match self.buckets.lock().get_mut(bucket) {
            Some(b) => {
                b.versioning = status;
                true
            }
            None => false,
        }
    }

    /// Write an object and return its version id (`"null"` when unversioned).
    pub fn put_object(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets
            .lock()
            .get_mut(bucket)
            .map(|b| b.put(key, false))
    }

    /// Delete the current object under `key` the way a plain `DeleteObject` would.
    pub fn delete_object(&self, bucket: &str, key: &str) {
        if let Some(b) = self.buckets.lock().get_mut(bucket) {
            b.delete_current(key);
        }
    }

    /// Make `DeleteObjects` refuse every identifier under `key`.
    pub fn protect_key(&self, bucket: &str, key: &str) {
        if let Some(b) = self.buckets.lock().get_mut(bucket) {
            b.protected.insert(key.to_owned());
        }
    }

    /// Whether the bucket exists.
    #[must_use]
    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.buckets.lock().contains_key(bucket)
    }

    /// Total versions and delete markers held by the bucket.
    #[must_use]
    pub fn entry_count(&self, bucket: &str) -> Option<usize> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|b| b.objects.values().map(Vec::len).sum())
    }

    /// Number of keys whose latest entry is a real object.
    #[must_use]
    pub fn current_object_count(&self, bucket: &str) -> Option<usize> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|b| b.current_keys().count())
    }

    /// Every batch received by `delete_objects`, in call order.
    #[must_use]
    pub fn recorded_batches(&self) -> Vec<DeletionBatch> {
        self.batches.lock().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MemoryStorage {
    async fn get_bucket_versioning(
        &self,
        bucket: &str,
    ) -> Result<VersioningStatus, StorageError> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|b| b.versioning)
            .ok_or_else(|| no_such_bucket(bucket))
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
        max_keys: usize,
    ) -> Result<VersionPage, StorageError> {
        let buckets = self.buckets.lock();
        let b = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let max_keys = max_keys.max(1);

        let mut page = VersionPage::default();
        'outer: for (key, versions) in &b.objects {
            let mut skip = 0;
            if let Some(marker) = key_marker {
                if key.as_str() < marker {
                    continue;
                }
                if key.as_str() == marker {
                    // Resume after the version marker, or after the whole key
                    // when no version marker was given. A marker that no longer
                    // exists was deleted together with everything before it.
                    skip = match version_id_marker {
                        Some(vid) => versions
                            .iter()
                            .position(|v| v.version_id == vid)
                            .map_or(0, |idx| idx + 1),
                        None => versions.len(),
                    };
                }
            }

            for version in versions.iter().skip(skip) {
                if page.entries.len() >= max_keys {
                    page.is_truncated = true;
                    break 'outer;
                }
                page.entries.push(VersionEntry {
                    id: ObjectIdentifier::version(key.clone(), version.version_id.clone()),
                    is_delete_marker: version.is_delete_marker,
                });
            }
        }

        if page.is_truncated {
            if let Some(last) = page.entries.last() {
                page.next_key_marker = Some(last.id.key.clone());
                page.next_version_id_marker = last.id.version_id.clone();
            }
        }
        debug!(
            bucket,
            entries = page.entries.len(),
            is_truncated = page.is_truncated,
            "list_object_versions completed"
        );
        Ok(page)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage, StorageError> {
        let buckets = self.buckets.lock();
        let b = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let max_keys = max_keys.max(1);

        let mut remaining = b
            .current_keys()
            .filter(|key| continuation_token.is_none_or(|token| key.as_str() > token));
        let keys: Vec<String> = remaining.by_ref().take(max_keys).cloned().collect();
        let is_truncated = remaining.next().is_some();

        Ok(ObjectPage {
            next_continuation_token: if is_truncated {
                keys.last().cloned()
            } else {
                None
            },
            keys,
            is_truncated,
        })
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        batch: &DeletionBatch,
    ) -> Result<DeleteOutcome, StorageError> {
        let mut buckets = self.buckets.lock();
        let b = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        self.batches.lock().push(batch.clone());

        let mut outcome = DeleteOutcome::default();
        for id in batch.ids() {
            if b.protected.contains(&id.key) {
                outcome.failures.push(DeleteFailure {
                    key: id.key.clone(),
                    version_id: id.version_id.clone(),
                    code: "AccessDenied".to_owned(),
                    message: "Access Denied".to_owned(),
                });
                continue;
            }
            match &id.version_id {
                Some(version_id) => b.delete_version(&id.key, version_id),
                None => b.delete_current(&id.key),
            }
            outcome.deleted += 1;
        }
        Ok(outcome)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.lock();
        match buckets.get(bucket) {
            None => Err(no_such_bucket(bucket)),
            Some(b) if !b.is_empty() => Err(StorageError::BucketNotEmpty {
                bucket: bucket.to_owned(),
            }),
            Some(_) => {
                buckets.remove(bucket);
                debug!(bucket, "bucket removed");
                Ok(())
            }
        }
    }
}

fn no_such_bucket(bucket: &str) -> StorageError {
    StorageError::NoSuchBucket {
        bucket: bucket.to_owned(),
    }
}
