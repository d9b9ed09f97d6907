use crate::models::{ObjectPage, ObjectRecord};
use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Fetches one page of the bucket listing.
    async fn list_objects_page(&self, continuation_token: Option<String>) -> Result<ObjectPage>;

    /// Enumerates the whole bucket, following continuation tokens until exhausted.
    async fn list_all_objects(&self) -> Result<Vec<ObjectRecord>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let page = self.list_objects_page(continuation_token).await?;
            objects.extend(page.objects);

            match page.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(objects)
    }

    /// Streams a local file into the bucket under `key`.
    async fn upload_file(&self, key: &str, path: &Path, content_type: Option<&str>) -> Result<()>;
    async fn get_file(&self, key: &str) -> Result<Bytes>;
    async fn delete_file(&self, key: &str) -> Result<()>;

    /// Issues a time-limited, credential-free GET URL for `key`.
    async fn generate_presigned_url(&self, key: &str, expires_in: Duration) -> Result<String>;

    async fn health_check(&self) -> bool;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn list_objects_page(&self, continuation_token: Option<String>) -> Result<ObjectPage> {
        let res = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token)
            .send()
            .await?;

        let objects = res
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                let key = object.key?;
                let last_modified = object
                    .last_modified
                    .map(|d| {
                        chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                            .unwrap_or_default()
                    })
                    .unwrap_or_default();
                Some(ObjectRecord {
                    key,
                    size: object.size.unwrap_or(0),
                    last_modified,
                })
            })
            .collect();

        let next_continuation_token = if res.is_truncated.unwrap_or(false) {
            res.next_continuation_token
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_continuation_token,
        })
    }

    async fn upload_file(&self, key: &str, path: &Path, content_type: Option<&str>) -> Result<()> {
        let body = ByteStream::from_path(path).await?;

        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn get_file(&self, key: &str) -> Result<Bytes> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        let data = res.body.collect().await?.into_bytes();
        Ok(data)
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    async fn generate_presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in)?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await?;

        Ok(presigned_request.uri().to_string())
    }

    async fn health_check(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}
