//! Empty a bucket and delete it.
//!
//! A run walks three states in order:
//!
//! ```text
//! VersionsPending -> ObjectsPending -> BucketDeleted
//! ```
//!
//! The version purge only does work when versioning is `Enabled`. Every call
//! is awaited before the next one is issued, and the first error ends the run.

use std::fmt;

use tracing::{error, info, warn};

use crate::config::{ReaperConfig, clamp_page_size};
use crate::error::{Phase, ReapError, ReapResult, StorageError};
use crate::model::{
    DeleteFailure, DeletionBatch, MAX_DELETE_BATCH, ObjectIdentifier, VersioningStatus,
};
use crate::storage::ObjectStorage;

/// State of a reaper run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapState {
    /// Versions and delete markers may remain.
    VersionsPending,
    /// Current objects may remain.
    ObjectsPending,
    /// The bucket is gone.
    BucketDeleted,
}

impl fmt::Display for ReapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionsPending => f.write_str("VERSIONS_PENDING"),
            Self::ObjectsPending => f.write_str("OBJECTS_PENDING"),
            Self::BucketDeleted => f.write_str("BUCKET_DELETED"),
        }
    }
}

/// Counts gathered by one purge phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Identifiers the provider reported as deleted.
    pub deleted: usize,
    /// `DeleteObjects` calls issued.
    pub batches: usize,
    /// Per-item failures that were tolerated.
    pub failures: Vec<DeleteFailure>,
}

impl PurgeStats {
    fn absorb(&mut self, other: PurgeStats) {
        self.deleted += other.deleted;
        self.batches += other.batches;
        self.failures.extend(other.failures);
    }
}

/// Summary of a successful [`Reaper::delete_bucket`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapReport {
    /// Bucket that was deleted.
    pub bucket: String,
    /// Whether the version purge ran (versioning was enabled).
    pub versions_purged: bool,
    /// Version purge counts.
    pub versions: PurgeStats,
    /// Current-object purge counts.
    pub objects: PurgeStats,
}

impl ReapReport {
    /// All per-item failures tolerated during the run.
    pub fn failures(&self) -> impl Iterator<Item = &DeleteFailure> {
        self.versions.failures.iter().chain(&self.objects.failures)
    }
}

/// Options controlling a reaper run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapOptions {
    /// Max keys requested per listing page.
    pub page_size: usize,
    /// Abort on per-item `DeleteObjects` errors instead of recording them.
    pub fail_on_partial_delete: bool,
}

impl Default for ReapOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_DELETE_BATCH,
            fail_on_partial_delete: true,
        }
    }
}

impl From<&ReaperConfig> for ReapOptions {
    fn from(config: &ReaperConfig) -> Self {
        Self {
            page_size: config.effective_page_size(),
            fail_on_partial_delete: config.fail_on_partial_delete,
        }
    }
}

/// Empties and deletes buckets through an [`ObjectStorage`].
///
/// # Examples
///
/// ```
/// use reaper_core::{MemoryStorage, ReapOptions, Reaper};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let storage = MemoryStorage::new();
/// storage.create_bucket("logs");
/// storage.put_object("logs", "2024/01/01.log");
///
/// let reaper = Reaper::new(&storage, ReapOptions::default());
/// let report = reaper.delete_bucket("logs").await.unwrap();
/// assert_eq!(report.objects.deleted, 1);
/// assert!(!storage.bucket_exists("logs"));
/// # });
/// ```
#[derive(Debug)]
pub struct Reaper<S> {
    storage: S,
    options: ReapOptions,
}

impl<S: ObjectStorage> Reaper<S> {
    /// Create a reaper over `storage`.
    ///
    /// `options.page_size` is clamped to `1..=1000`.
    pub fn new(storage: S, mut options: ReapOptions) -> Self {
        options.page_size = clamp_page_size(options.page_size);
        Self { storage, options }
    }

    /// The storage this reaper issues calls against.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Delete every version and delete marker, if versioning is enabled.
    ///
    /// Returns `None` when versioning is not enabled; no delete call is
    /// issued in that case.
    pub async fn purge_versions(&self, bucket: &str) -> ReapResult<Option<PurgeStats>> {
        let phase = Phase::VersionPurge;
        let status = self
            .storage
            .get_bucket_versioning(bucket)
            .await
            .map_err(|e| fail(phase, bucket, e))?;

        if status != VersioningStatus::Enabled {
            info!(bucket, %status, "versioning not enabled, skipping version purge");
            return Ok(None);
        }
        info!(bucket, "Bucket has versioning enabled, deleting all versions");

        let mut stats = PurgeStats::default();
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;
        loop {
            let page = self
                .storage
                .list_object_versions(
                    bucket,
                    key_marker.as_deref(),
                    version_id_marker.as_deref(),
                    self.options.page_size,
                )
                .await
                .map_err(|e| fail(phase, bucket, e))?;

            let ids = page.entries.iter().map(|e| e.id.clone()).collect();
            let page_stats = self.delete_all(phase, bucket, ids).await?;
            if page_stats.deleted > 0 {
                info!(
                    bucket,
                    versions = page.version_count(),
                    delete_markers = page.delete_marker_count(),
                    "deleted {} object versions",
                    page_stats.deleted
                );
            }
            stats.absorb(page_stats);

            if !page.is_truncated {
                break;
            }
            if page.next_key_marker.is_none() {
                warn!(bucket, "truncated version listing without a key marker, stopping");
                break;
            }
            key_marker = page.next_key_marker;
            version_id_marker = page.next_version_id_marker;
        }

        Ok(Some(stats))
    }

    /// Delete every current object, one batch per listing page.
    pub async fn purge_current_objects(&self, bucket: &str) -> ReapResult<PurgeStats> {
        let phase = Phase::ObjectPurge;
        let mut stats = PurgeStats::default();
        let mut continuation_token: Option<String> = None;
        loop {
            let page = self
                .storage
                .list_objects(bucket, continuation_token.as_deref(), self.options.page_size)
                .await
                .map_err(|e| fail(phase, bucket, e))?;

            let ids = page
                .keys
                .into_iter()
                .map(ObjectIdentifier::current)
                .collect();
            let page_stats = self.delete_all(phase, bucket, ids).await?;
            if page_stats.deleted > 0 {
                info!(bucket, "deleted {} current objects", page_stats.deleted);
            }
            stats.absorb(page_stats);

            match page.next_continuation_token {
                Some(token) if page.is_truncated => continuation_token = Some(token),
                _ => break,
            }
        }
        Ok(stats)
    }

    /// Purge versions, purge current objects, then delete the bucket.
    pub async fn delete_bucket(&self, bucket: &str) -> ReapResult<ReapReport> {
        enter(bucket, ReapState::VersionsPending);
        let versions = self.purge_versions(bucket).await?;

        enter(bucket, ReapState::ObjectsPending);
        let objects = self.purge_current_objects(bucket).await?;
        info!(bucket, "All objects and versions deleted from {bucket}");

        info!(bucket, "Deleting bucket {bucket}");
        self.storage
            .delete_bucket(bucket)
            .await
            .map_err(|e| fail(Phase::BucketDeletion, bucket, e))?;
        enter(bucket, ReapState::BucketDeleted);
        info!(bucket, "Bucket {bucket} deleted successfully");

        Ok(ReapReport {
            bucket: bucket.to_owned(),
            versions_purged: versions.is_some(),
            versions: versions.unwrap_or_default(),
            objects,
        })
    }

    /// Submit `ids` in as many batches as needed.
    async fn delete_all(
        &self,
        phase: Phase,
        bucket: &str,
        ids: Vec<ObjectIdentifier>,
    ) -> ReapResult<PurgeStats> {
        let mut stats = PurgeStats::default();
        for batch in DeletionBatch::chunked(ids) {
            let outcome = self
                .storage
                .delete_objects(bucket, &batch)
                .await
                .map_err(|e| fail(phase, bucket, e))?;
            stats.batches += 1;
            stats.deleted += outcome.deleted;

            if outcome.failures.is_empty() {
                continue;
            }
            for f in &outcome.failures {
                warn!(
                    bucket,
                    %phase,
                    key = %f.key,
                    version_id = ?f.version_id,
                    code = %f.code,
                    message = %f.message,
                    "object was not deleted"
                );
            }
            if self.options.fail_on_partial_delete {
                let failed = outcome.failures.len();
                error!(bucket, %phase, failed, "batch delete refused some objects");
                return Err(ReapError::PartialDelete {
                    phase,
                    failed,
                    first: outcome.failures[0].clone(),
                });
            }
            stats.failures.extend(outcome.failures);
        }
        Ok(stats)
    }
}

fn enter(bucket: &str, state: ReapState) {
    info!(bucket, %state, "entering state");
}

fn fail(phase: Phase, bucket: &str, source: StorageError) -> ReapError {
    error!(bucket, %phase, error = %source, "Error occurred during {phase}");
    ReapError::Provider { phase, source }
}
