//! Bucket Reaper - empty and delete an S3 bucket.
//!
//! Deletes every object version and delete marker (if versioning is
//! enabled), then every current object, then the bucket itself. Calls are
//! issued one at a time; the first error stops the run with a non-zero exit.
//!
//! # Usage
//!
//! ```text
//! AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=... REAPER_BUCKET=my-bucket bucket-reaper
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `REAPER_BUCKET` | `weather-dashboard-17972` | Bucket to delete |
//! | `AWS_ACCESS_KEY_ID` | *(unset)* | Access key |
//! | `AWS_SECRET_ACCESS_KEY` | *(unset)* | Secret key |
//! | `AWS_REGION` | `us-east-1` | Bucket region |
//! | `AWS_ENDPOINT_URL` | *(unset)* | S3-compatible endpoint |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style addressing |
//! | `REAPER_PAGE_SIZE` | `1000` | Keys per listing page |
//! | `REAPER_FAIL_ON_PARTIAL_DELETE` | `true` | Abort on per-object delete errors |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result};
use reaper_core::{ReapOptions, Reaper, ReaperConfig, S3Storage};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = ReaperConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        bucket = %config.bucket,
        region = %config.region,
        endpoint_url = ?config.endpoint_url,
        page_size = config.page_size,
        fail_on_partial_delete = config.fail_on_partial_delete,
        "starting bucket reaper",
    );

    let storage = S3Storage::connect(&config).await;
    let reaper = Reaper::new(storage, ReapOptions::from(&config));

    let report = match reaper.delete_bucket(&config.bucket).await {
        Ok(report) => report,
        Err(e) => {
            error!(
                bucket = %config.bucket,
                phase = %e.phase(),
                "Error occurred while deleting the bucket: {e}"
            );
            return Err(e).with_context(|| format!("failed to delete bucket {}", config.bucket));
        }
    };

    for failure in report.failures() {
        warn!(bucket = %report.bucket, %failure, "object left behind");
    }
    info!(
        bucket = %report.bucket,
        versions_deleted = report.versions.deleted,
        version_batches = report.versions.batches,
        objects_deleted = report.objects.deleted,
        object_batches = report.objects.batches,
        "done",
    );

    Ok(())
}
