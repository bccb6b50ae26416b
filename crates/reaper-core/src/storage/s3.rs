//! [`ObjectStorage`] backed by `aws-sdk-s3`.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{BucketVersioningStatus, Delete};
use tracing::{debug, info};

use super::ObjectStorage;
use crate::config::ReaperConfig;
use crate::error::StorageError;
use crate::model::{
    DeleteFailure, DeleteOutcome, DeletionBatch, ObjectIdentifier, ObjectPage, VersionEntry,
    VersionPage, VersioningStatus,
};

/// Storage client for Amazon S3 and S3-compatible servers.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Wrap an already configured client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the configuration.
    ///
    /// Static credentials are used when both the access key and the secret
    /// are configured; otherwise the SDK default provider chain applies.
    pub async fn connect(config: &ReaperConfig) -> Self {
        let region = Region::new(config.region.clone());
        let base_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region.clone())
            .load()
            .await;

        let mut builder = Builder::from(&base_config)
            .region(region)
            .force_path_style(config.force_path_style);

        if let Some((access_key_id, secret_access_key)) = config.static_credentials() {
            let creds = Credentials::new(access_key_id, secret_access_key, None, None, "reaper");
            builder = builder.credentials_provider(creds);
        } else {
            info!("no static credentials configured, using the default provider chain");
        }
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(Client::from_conf(builder.build()))
    }

    /// The underlying SDK client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map an SDK error to a [`StorageError`] using its error code.
fn map_sdk_error<E, R>(bucket: &str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some(code) => StorageError::from_code(bucket, code, err.message().unwrap_or_default()),
        None => StorageError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3Storage {
    async fn get_bucket_versioning(
        &self,
        bucket: &str,
    ) -> Result<VersioningStatus, StorageError> {
        let resp = self
            .client
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| map_sdk_error(bucket, e))?;

        let status = match resp.status() {
            Some(BucketVersioningStatus::Enabled) => VersioningStatus::Enabled,
            Some(BucketVersioningStatus::Suspended) => VersioningStatus::Suspended,
            _ => VersioningStatus::Unversioned,
        };
        debug!(bucket, %status, "get_bucket_versioning completed");
        Ok(status)
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<&str>,
        version_id_marker: Option<&str>,
        max_keys: usize,
    ) -> Result<VersionPage, StorageError> {
        let resp = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .set_key_marker(key_marker.map(ToOwned::to_owned))
            .set_version_id_marker(version_id_marker.map(ToOwned::to_owned))
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| map_sdk_error(bucket, e))?;

        let versions = resp.versions().iter().filter_map(|v| {
            Some(VersionEntry {
                id: ObjectIdentifier::version(v.key()?, v.version_id()?),
                is_delete_marker: false,
            })
        });
        let markers = resp.delete_markers().iter().filter_map(|m| {
            Some(VersionEntry {
                id: ObjectIdentifier::version(m.key()?, m.version_id()?),
                is_delete_marker: true,
            })
        });

        let page = VersionPage {
            entries: versions.chain(markers).collect(),
            is_truncated: resp.is_truncated().unwrap_or(false),
            next_key_marker: resp.next_key_marker().map(ToOwned::to_owned),
            next_version_id_marker: resp.next_version_id_marker().map(ToOwned::to_owned),
        };
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
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token.map(ToOwned::to_owned))
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| map_sdk_error(bucket, e))?;

        let page = ObjectPage {
            keys: resp
                .contents()
                .iter()
                .filter_map(|o| o.key().map(ToOwned::to_owned))
                .collect(),
            is_truncated: resp.is_truncated().unwrap_or(false),
            next_continuation_token: resp.next_continuation_token().map(ToOwned::to_owned),
        };
        debug!(
            bucket,
            keys = page.keys.len(),
            is_truncated = page.is_truncated,
            "list_objects_v2 completed"
        );
        Ok(page)
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        batch: &DeletionBatch,
    ) -> Result<DeleteOutcome, StorageError> {
        let objects = batch
            .ids()
            .iter()
            .map(|id| {
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key(&id.key)
                    .set_version_id(id.version_id.clone())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::MalformedRequest(e.to_string()))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StorageError::MalformedRequest(e.to_string()))?;

        let resp = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| map_sdk_error(bucket, e))?;

        let failures: Vec<DeleteFailure> = resp
            .errors()
            .iter()
            .map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_owned(),
                version_id: e.version_id().map(ToOwned::to_owned),
                code: e.code().unwrap_or("Unknown").to_owned(),
                message: e.message().unwrap_or_default().to_owned(),
            })
            .collect();

        Ok(DeleteOutcome {
            deleted: batch.len().saturating_sub(failures.len()),
            failures,
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| map_sdk_error(bucket, e))?;
        Ok(())
    }
}
