use crate::services::storage::{S3StorageService, StorageService};
use anyhow::{Context, Result};
use aws_sdk_s3::config::{Credentials, Region};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_storage() -> Result<Arc<S3StorageService>> {
    let bucket = env::var("S3_BUCKET_NAME").context("S3_BUCKET_NAME must be set")?;
    let endpoint_url = env::var("S3_ENDPOINT").ok();

    let mut loader = aws_config::from_env();
    if let Ok(region) = env::var("AWS_REGION") {
        loader = loader.region(Region::new(region));
    }
    if let (Ok(access_key), Ok(secret_key)) = (
        env::var("AWS_ACCESS_KEY_ID"),
        env::var("AWS_SECRET_ACCESS_KEY"),
    ) {
        loader = loader.credentials_provider(Credentials::new(
            access_key, secret_key, None, None, "static",
        ));
    }
    if let Some(endpoint_url) = &endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    let aws_config = loader.load().await;
    let region = aws_config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "default".to_string());

    info!(
        "☁️  S3 Storage: {} (Bucket: {}, Region: {})",
        endpoint_url.as_deref().unwrap_or("aws"),
        bucket,
        region
    );

    // Custom endpoints (MinIO and friends) generally need path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(endpoint_url.is_some())
        .build();

    let storage = S3StorageService::new(aws_sdk_s3::Client::from_conf(s3_config), bucket);

    if storage.health_check().await {
        info!("✅ Bucket '{}' is reachable", storage.bucket());
    } else {
        warn!(
            "⚠️  Bucket '{}' is not reachable yet; requests will fail until it is",
            storage.bucket()
        );
    }

    Ok(Arc::new(storage))
}
