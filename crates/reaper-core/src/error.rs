//! Error types for the reaper.
//!
//! [`StorageError`] classifies what the provider returned for a single call.
//! [`ReapError`] adds the [`Phase`] the call belonged to.

use std::fmt;

use crate::model::DeleteFailure;

/// Phase of a reaper run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Deleting object versions and delete markers.
    VersionPurge,
    /// Deleting current objects.
    ObjectPurge,
    /// Deleting the bucket itself.
    BucketDeletion,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionPurge => f.write_str("version purge"),
            Self::ObjectPurge => f.write_str("object purge"),
            Self::BucketDeletion => f.write_str("bucket deletion"),
        }
    }
}

/// Error returned by an [`ObjectStorage`](crate::storage::ObjectStorage) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The bucket is not empty and cannot be deleted.
    #[error("The bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty {
        /// The bucket name that is not empty.
        bucket: String,
    },

    /// Credentials were rejected or lack permission.
    #[error("Access Denied: {message}")]
    AccessDenied {
        /// Provider message.
        message: String,
    },

    /// Any other provider error code.
    #[error("{code}: {message}")]
    Service {
        /// Provider error code.
        code: String,
        /// Provider message.
        message: String,
    },

    /// Network, timeout, credential resolution or response parsing failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not be built.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl StorageError {
    /// Classify a provider error code.
    #[must_use]
    pub fn from_code(bucket: &str, code: &str, message: &str) -> Self {
        match code {
            "NoSuchBucket" => Self::NoSuchBucket {
                bucket: bucket.to_owned(),
            },
            "BucketNotEmpty" => Self::BucketNotEmpty {
                bucket: bucket.to_owned(),
            },
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
                Self::AccessDenied {
                    message: format!("{code}: {message}"),
                }
            }
            _ => Self::Service {
                code: code.to_owned(),
                message: message.to_owned(),
            },
        }
    }
}

/// Error that aborted a reaper run.
#[derive(Debug, thiserror::Error)]
pub enum ReapError {
    /// A provider call failed.
    #[error("{phase} failed: {source}")]
    Provider {
        /// Phase the failing call belonged to.
        phase: Phase,
        /// Underlying provider error.
        #[source]
        source: StorageError,
    },

    /// A batch delete succeeded as a call but refused some identifiers.
    #[error("{phase} failed: {failed} item(s) were not deleted, first: {first}")]
    PartialDelete {
        /// Phase the batch belonged to.
        phase: Phase,
        /// Number of identifiers that were not deleted.
        failed: usize,
        /// First reported failure.
        first: DeleteFailure,
    },
}

impl ReapError {
    /// Phase the error occurred in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Provider { phase, .. } | Self::PartialDelete { phase, .. } => *phase,
        }
    }

    /// Whether the target bucket does not exist.
    #[must_use]
    pub fn is_bucket_not_found(&self) -> bool {
        matches!(
            self,
            Self::Provider {
                source: StorageError::NoSuchBucket { .. },
                ..
            }
        )
    }

    /// Whether the final delete found the bucket still holding data.
    #[must_use]
    pub fn is_bucket_not_empty(&self) -> bool {
        matches!(
            self,
            Self::Provider {
                source: StorageError::BucketNotEmpty { .. },
                ..
            }
        )
    }
}

/// Convenience result type for reaper operations.
pub type ReapResult<T> = Result<T, ReapError>;
