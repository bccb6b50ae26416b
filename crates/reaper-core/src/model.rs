//! Identifiers, listing pages and deletion batches.

use std::fmt;

/// Maximum number of identifiers accepted by a single `DeleteObjects` call.
pub const MAX_DELETE_BATCH: usize = 1000;

/// Versioning state of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersioningStatus {
    /// Versioning was never enabled.
    #[default]
    Unversioned,
    /// Versioning is enabled.
    Enabled,
    /// Versioning was enabled and later suspended.
    Suspended,
}

impl fmt::Display for VersioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unversioned => f.write_str("Unversioned"),
            Self::Enabled => f.write_str("Enabled"),
            Self::Suspended => f.write_str("Suspended"),
        }
    }
}

/// Key plus optional version id, as submitted to `DeleteObjects`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    /// Object key.
    pub key: String,
    /// Version id. `None` addresses the current object.
    pub version_id: Option<String>,
}

impl ObjectIdentifier {
    /// Identifier for the current object under `key`.
    #[must_use]
    pub fn current(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: None,
        }
    }

    /// Identifier for one specific version (or delete marker).
    #[must_use]
    pub fn version(key: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version_id: Some(version_id.into()),
        }
    }
}

/// A single row of a version listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Key and version id of the entry.
    pub id: ObjectIdentifier,
    /// Whether this entry is a delete marker rather than a real version.
    pub is_delete_marker: bool,
}

/// One page of `ListObjectVersions`.
#[derive(Debug, Clone, Default)]
pub struct VersionPage {
    /// Object versions and delete markers on this page.
    pub entries: Vec<VersionEntry>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Key marker for the next page.
    pub next_key_marker: Option<String>,
    /// Version-id marker for the next page.
    pub next_version_id_marker: Option<String>,
}

impl VersionPage {
    /// Number of real versions on this page.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_delete_marker).count()
    }

    /// Number of delete markers on this page.
    #[must_use]
    pub fn delete_marker_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_delete_marker).count()
    }
}

/// One page of `ListObjectsV2`.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Keys of the current objects on this page.
    pub keys: Vec<String>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Continuation token for the next page.
    pub next_continuation_token: Option<String>,
}

/// Identifiers submitted together in one `DeleteObjects` request.
///
/// Never empty and never larger than [`MAX_DELETE_BATCH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionBatch {
    ids: Vec<ObjectIdentifier>,
}

impl DeletionBatch {
    /// Split identifiers into batches of at most [`MAX_DELETE_BATCH`].
    ///
    /// An empty input yields no batches.
    #[must_use]
    pub fn chunked(ids: Vec<ObjectIdentifier>) -> Vec<Self> {
        ids.chunks(MAX_DELETE_BATCH)
            .map(|chunk| Self {
                ids: chunk.to_vec(),
            })
            .collect()
    }

    /// Identifiers in submission order.
    #[must_use]
    pub fn ids(&self) -> &[ObjectIdentifier] {
        &self.ids
    }

    /// Number of identifiers in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the batch holds no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A per-item error reported inside a successful `DeleteObjects` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// Key that was not deleted.
    pub key: String,
    /// Version id that was not deleted, if one was addressed.
    pub version_id: Option<String>,
    /// Provider error code (e.g. `AccessDenied`).
    pub code: String,
    /// Provider error message.
    pub message: String,
}

impl fmt::Display for DeleteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_id {
            Some(v) => write!(f, "{}@{}: {}: {}", self.key, v, self.code, self.message),
            None => write!(f, "{}: {}: {}", self.key, self.code, self.message),
        }
    }
}

/// Result of one `DeleteObjects` call.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Number of identifiers the provider reports as deleted.
    pub deleted: usize,
    /// Identifiers the provider refused to delete.
    pub failures: Vec<DeleteFailure>,
}
