use crate::models::{MediaKind, ObjectRecord};
use crate::services::listing_cache::ListingCache;
use crate::services::storage::StorageService;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Failed to refresh gallery listing: {0}")]
    Refresh(#[source] anyhow::Error),

    #[error("Failed to sign URL for {key}: {source}")]
    Signing {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GalleryItem {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GalleryPage {
    pub media: Vec<GalleryItem>,
    #[serde(rename = "nextOffset")]
    pub next_offset: Option<usize>,
}

pub struct GalleryService {
    storage: Arc<dyn StorageService>,
    cache: Arc<ListingCache>,
    staleness: Duration,
    url_expiry: Duration,
}

impl GalleryService {
    pub fn new(
        storage: Arc<dyn StorageService>,
        cache: Arc<ListingCache>,
        staleness: Duration,
        url_expiry: Duration,
    ) -> Self {
        Self {
            storage,
            cache,
            staleness,
            url_expiry,
        }
    }

    /// Returns one page of signed media URLs, newest first.
    ///
    /// A stale cache is refreshed before answering. A single signing failure
    /// fails the whole page.
    pub async fn list_page(&self, limit: usize, offset: usize) -> Result<GalleryPage, GalleryError> {
        if self.cache.is_stale(self.staleness).await {
            self.cache
                .refresh_if_stale(self.staleness)
                .await
                .map_err(GalleryError::Refresh)?;
        }

        let page = self.cache.get_page(offset, limit).await;
        let media = try_join_all(page.records.into_iter().map(|record| self.sign(record))).await?;

        Ok(GalleryPage {
            media,
            next_offset: page.next_offset,
        })
    }

    async fn sign(&self, record: ObjectRecord) -> Result<GalleryItem, GalleryError> {
        let url = self
            .storage
            .generate_presigned_url(&record.key, self.url_expiry)
            .await
            .map_err(|source| GalleryError::Signing {
                key: record.key.clone(),
                source,
            })?;

        Ok(GalleryItem {
            url,
            kind: MediaKind::from_key(&record.key),
            last_modified: record.last_modified,
            key: record.key,
        })
    }
}
