//! Reaper configuration.
//!
//! Provides [`ReaperConfig`], loaded from environment variables once at
//! startup and then passed explicitly to the storage client and the reaper.

use std::fmt;

use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::model::MAX_DELETE_BATCH;

/// Bucket targeted when `REAPER_BUCKET` is not set.
pub const DEFAULT_BUCKET: &str = "weather-dashboard-17972";

/// Region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for a single reaper run.
///
/// # Examples
///
/// ```
/// use reaper_core::ReaperConfig;
///
/// let config = ReaperConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// assert_eq!(config.page_size, 1000);
/// assert!(config.fail_on_partial_delete);
/// ```
#[derive(Clone, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ReaperConfig {
    /// Name of the bucket to empty and delete.
    #[builder(default = String::from(DEFAULT_BUCKET))]
    pub bucket: String,

    /// Access key id. Falls back to the SDK provider chain when unset.
    #[builder(default)]
    pub access_key_id: Option<String>,

    /// Secret access key. Never serialized or printed.
    #[builder(default)]
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Region the bucket lives in.
    #[builder(default = String::from(DEFAULT_REGION))]
    pub region: String,

    /// Custom endpoint for S3-compatible servers.
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing (`endpoint/bucket/key`).
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Max keys requested per listing page, in `1..=1000`.
    #[builder(default = MAX_DELETE_BATCH)]
    pub page_size: usize,

    /// Abort a phase when a batch delete reports per-item errors.
    #[builder(default = true)]
    pub fail_on_partial_delete: bool,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            bucket: String::from(DEFAULT_BUCKET),
            access_key_id: None,
            secret_access_key: None,
            region: String::from(DEFAULT_REGION),
            endpoint_url: None,
            force_path_style: false,
            page_size: MAX_DELETE_BATCH,
            fail_on_partial_delete: true,
            log_level: String::from("info"),
        }
    }
}

impl fmt::Debug for ReaperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaperConfig")
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .field("page_size", &self.page_size)
            .field("fail_on_partial_delete", &self.fail_on_partial_delete)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ReaperConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `REAPER_BUCKET` | `weather-dashboard-17972` |
    /// | `AWS_ACCESS_KEY_ID` | *(unset)* |
    /// | `AWS_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `AWS_REGION` | `us-east-1` |
    /// | `AWS_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `REAPER_PAGE_SIZE` | `1000` |
    /// | `REAPER_FAIL_ON_PARTIAL_DELETE` | `true` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `get`, which maps a variable name to its value.
    ///
    /// Empty values count as unset. Unparseable numbers keep the default.
    #[must_use]
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| get(name).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = var("REAPER_BUCKET") {
            config.bucket = v;
        }
        config.access_key_id = var("AWS_ACCESS_KEY_ID");
        config.secret_access_key = var("AWS_SECRET_ACCESS_KEY");
        if let Some(v) = var("AWS_REGION") {
            config.region = v;
        }
        config.endpoint_url = var("AWS_ENDPOINT_URL");
        if let Some(v) = var("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(v) = var("REAPER_PAGE_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                config.page_size = n;
            }
        }
        if let Some(v) = var("REAPER_FAIL_ON_PARTIAL_DELETE") {
            config.fail_on_partial_delete = parse_bool(&v);
        }
        if let Some(v) = var("LOG_LEVEL") {
            config.log_level = v;
        }

        config.page_size = clamp_page_size(config.page_size);
        config
    }

    /// Static credentials, if both halves are configured.
    #[must_use]
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Page size clamped to the provider's limits.
    #[must_use]
    pub fn effective_page_size(&self) -> usize {
        clamp_page_size(self.page_size)
    }
}

pub(crate) fn clamp_page_size(n: usize) -> usize {
    n.clamp(1, MAX_DELETE_BATCH)
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
