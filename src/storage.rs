//! Object storage for cover images. Uploads never pass through the API
//! server: an admin asks for a presigned PUT URL, pushes the image straight
//! to the bucket, and stores the returned key in the book's `cover` field.

use crate::config::AppConfig;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client, Config,
    config::{Credentials, Region},
    presigning::PresigningConfig,
};
use std::{sync::Arc, time::Duration};

/// How long an issued upload URL stays valid.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// MIME types accepted for cover uploads. Everything else is rejected before
/// a presigned URL is ever issued.
pub const ALLOWED_COVER_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Returns true when the given MIME type may be uploaded as a cover image.
pub fn is_allowed_cover_type(content_type: &str) -> bool {
    ALLOWED_COVER_TYPES.contains(&content_type)
}

/// Strips directory-navigation segments from a user-influenced object key.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// StorageService
///
/// Contract for the cover image store. Swappable between the real S3 client
/// and the in-memory mock used by tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the configured bucket when missing. Called at startup in
    /// the Local environment only; production buckets are managed externally.
    async fn ensure_bucket_exists(&self);

    /// Signs a URL allowing one PUT of the given content type under `key`.
    async fn presigned_cover_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;
}

/// StorageState
///
/// The shared handle stored in the application state.
pub type StorageState = Arc<dyn StorageService>;

/// S3StorageClient
///
/// Real implementation over the AWS SDK, configured from `AppConfig`.
/// Path-style addressing keeps it compatible with MinIO and the other
/// S3-alike gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: Client,
    bucket: String,
}

impl S3StorageClient {
    pub async fn from_config(config: &AppConfig) -> Self {
        let credentials =
            Credentials::new(&config.s3_key, &config.s3_secret, None, None, "static");

        let s3_config = Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .region(Region::new(config.s3_region.clone()))
            .behavior_version_latest()
            // MinIO only routes path-style requests (endpoint/bucket/key).
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.s3_bucket.clone(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket is idempotent; safe to fire at every startup.
        let _ = self.client.create_bucket().bucket(&self.bucket).send().await;
    }

    async fn presigned_cover_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let presigning =
            PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?;

        // The signature binds this Content-Type; an upload claiming another
        // type is refused by the storage gateway.
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(request.uri().to_string())
    }
}

/// MockStorageService
///
/// Test double: deterministic URLs, no network. The failing variant
/// exercises the handler's storage-error path.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presigned_cover_upload(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage failure requested".to_string());
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_key_drops_traversal_segments() {
        assert_eq!(sanitize_key("covers/../../etc/passwd"), "covers/etc/passwd");
        assert_eq!(sanitize_key("covers/./x.png"), "covers/x.png");
        assert_eq!(sanitize_key("covers//x.png"), "covers/x.png");
    }

    #[test]
    fn cover_type_allowlist() {
        assert!(is_allowed_cover_type("image/jpeg"));
        assert!(is_allowed_cover_type("image/webp"));
        assert!(!is_allowed_cover_type("application/pdf"));
        assert!(!is_allowed_cover_type("video/mp4"));
    }
}
