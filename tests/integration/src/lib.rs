//! Integration tests for the bucket reaper.
//!
//! These tests require a running S3-compatible server at `localhost:4566`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p reaper-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketVersioningStatus, VersioningConfiguration};
use reaper_core::{ReapOptions, Reaper, ReaperConfig, S3Storage};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Reaper configuration pointing at the local server.
#[must_use]
pub fn test_config(bucket: &str, page_size: usize) -> ReaperConfig {
    ReaperConfig::builder()
        .bucket(bucket.to_owned())
        .access_key_id(Some("test".to_owned()))
        .secret_access_key(Some("test".to_owned()))
        .endpoint_url(Some(endpoint_url()))
        .force_path_style(true)
        .page_size(page_size)
        .build()
}

/// Create a storage client pointing at the local server.
pub async fn storage() -> S3Storage {
    init_tracing();
    S3Storage::connect(&test_config("unused", 1000)).await
}

/// Create a reaper with the given listing page size.
pub async fn reaper(page_size: usize) -> Reaper<S3Storage> {
    init_tracing();
    let config = test_config("unused", page_size);
    Reaper::new(S3Storage::connect(&config).await, ReapOptions::from(&config))
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name. The reaper under test removes it.
pub async fn create_test_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Turn on versioning for a bucket.
pub async fn enable_versioning(client: &aws_sdk_s3::Client, bucket: &str) {
    client
        .put_bucket_versioning()
        .bucket(bucket)
        .versioning_configuration(
            VersioningConfiguration::builder()
                .status(BucketVersioningStatus::Enabled)
                .build(),
        )
        .send()
        .await
        .expect("enable versioning");
}

/// Upload a small object.
pub async fn put(client: &aws_sdk_s3::Client, bucket: &str, key: &str) {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from_static(b"data"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to put {key}: {e}"));
}

/// Whether the bucket still exists.
pub async fn bucket_exists(client: &aws_sdk_s3::Client, bucket: &str) -> bool {
    client.head_bucket().bucket(bucket).send().await.is_ok()
}

mod test_reaper;
