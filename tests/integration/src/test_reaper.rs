//! End-to-end reaper tests.

#[cfg(test)]
mod tests {
    use reaper_core::{ObjectStorage, Phase, VersioningStatus};

    use crate::{bucket_exists, create_test_bucket, enable_versioning, put, reaper, storage};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_empty_bucket() {
        let reaper = reaper(1000).await;
        let client = reaper.storage().client().clone();
        let bucket = create_test_bucket(&client, "empty").await;

        let report = reaper.delete_bucket(&bucket).await.expect("delete bucket");

        assert!(!report.versions_purged);
        assert_eq!(report.objects.batches, 0);
        assert!(!bucket_exists(&client, &bucket).await);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_versions_and_delete_markers() {
        let reaper = reaper(1000).await;
        let client = reaper.storage().client().clone();
        let bucket = create_test_bucket(&client, "versioned").await;
        enable_versioning(&client, &bucket).await;

        put(&client, &bucket, "a.txt").await;
        put(&client, &bucket, "a.txt").await;
        put(&client, &bucket, "b.txt").await;
        client
            .delete_object()
            .bucket(&bucket)
            .key("b.txt")
            .send()
            .await
            .expect("create delete marker");

        let report = reaper.delete_bucket(&bucket).await.expect("delete bucket");

        assert!(report.versions_purged);
        assert_eq!(report.versions.deleted, 4);
        assert_eq!(report.versions.batches, 1);
        assert_eq!(report.objects.deleted, 0);
        assert!(!bucket_exists(&client, &bucket).await);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_current_objects() {
        let reaper = reaper(2).await;
        let client = reaper.storage().client().clone();
        let bucket = create_test_bucket(&client, "paged").await;
        for i in 0..5 {
            put(&client, &bucket, &format!("obj-{i}")).await;
        }

        let report = reaper.delete_bucket(&bucket).await.expect("delete bucket");

        assert_eq!(report.objects.deleted, 5);
        assert_eq!(report.objects.batches, 3);
        assert!(!bucket_exists(&client, &bucket).await);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_versions() {
        let reaper = reaper(3).await;
        let client = reaper.storage().client().clone();
        let bucket = create_test_bucket(&client, "verpaged").await;
        enable_versioning(&client, &bucket).await;
        for i in 0..4 {
            put(&client, &bucket, &format!("doc-{i}")).await;
            put(&client, &bucket, &format!("doc-{i}")).await;
        }

        let report = reaper.delete_bucket(&bucket).await.expect("delete bucket");

        assert_eq!(report.versions.deleted, 8);
        assert_eq!(report.versions.batches, 3);
        assert!(!bucket_exists(&client, &bucket).await);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_bucket_on_second_run() {
        let reaper = reaper(1000).await;
        let client = reaper.storage().client().clone();
        let bucket = create_test_bucket(&client, "twice").await;
        put(&client, &bucket, "only.txt").await;

        reaper.delete_bucket(&bucket).await.expect("first run");
        let err = reaper
            .delete_bucket(&bucket)
            .await
            .expect_err("second run must fail");

        assert!(err.is_bucket_not_found(), "unexpected error: {err}");
        assert_eq!(err.phase(), Phase::VersionPurge);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_read_versioning_status() {
        let storage = storage().await;
        let client = storage.client().clone();
        let bucket = create_test_bucket(&client, "status").await;

        let before = storage
            .get_bucket_versioning(&bucket)
            .await
            .expect("get versioning");
        assert_eq!(before, VersioningStatus::Unversioned);

        enable_versioning(&client, &bucket).await;
        let after = storage
            .get_bucket_versioning(&bucket)
            .await
            .expect("get versioning");
        assert_eq!(after, VersioningStatus::Enabled);

        storage.delete_bucket(&bucket).await.expect("cleanup");
    }
}
