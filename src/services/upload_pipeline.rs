use crate::models::UploadedObject;
use crate::services::listing_cache::ListingCache;
use crate::services::storage::StorageService;
use crate::services::transcoder::{TranscodeError, Transcoder};
use crate::utils::sniff::{MediaFormat, sniff_file};
use crate::utils::validation::{file_extension, normalize_content_type};
use bytes::Bytes;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

const CONVERTED_SUFFIX: &str = "_converted.mp4";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to stage {name}: {source}")]
    Staging {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to transcode {name}: {source}")]
    Transcode {
        name: String,
        #[source]
        source: TranscodeError,
    },

    #[error("Failed to upload {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Uploaded files but failed to refresh the gallery listing: {0}")]
    CacheRefresh(#[source] anyhow::Error),
}

/// One file as received from the client. Name and content type are untrusted.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Working state of a single file on its way to the store.
///
/// The local artifact is held as a [`TempPath`], so it is removed when the
/// pipeline aborts and explicitly closed once the upload succeeds.
#[derive(Debug)]
pub struct StagedUpload {
    pub original_name: String,
    pub extension: String,
    pub staging_path: PathBuf,
    pub detected_format: MediaFormat,
    artifact: TempPath,
}

impl StagedUpload {
    pub fn final_path(&self) -> &Path {
        &self.artifact
    }

    pub fn is_transcoded(&self) -> bool {
        self.final_path() != self.staging_path.as_path()
    }

    /// The store key is the final artifact's file name.
    pub fn object_key(&self) -> String {
        self.final_path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Stage → sniff → optional transcode → upload → cleanup, per file.
pub struct UploadPipeline {
    storage: Arc<dyn StorageService>,
    transcoder: Arc<dyn Transcoder>,
    cache: Arc<ListingCache>,
    staging_dir: PathBuf,
    rollback_failed_batches: bool,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn StorageService>,
        transcoder: Arc<dyn Transcoder>,
        cache: Arc<ListingCache>,
        staging_dir: PathBuf,
        rollback_failed_batches: bool,
    ) -> Self {
        Self {
            storage,
            transcoder,
            cache,
            staging_dir,
            rollback_failed_batches,
        }
    }

    /// Runs every file through the pipeline concurrently.
    ///
    /// The batch succeeds only if every file does; siblings of a failed file
    /// still run to completion. On success the listing cache is refreshed
    /// before returning so the new objects are immediately visible.
    pub async fn process_batch(
        &self,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<UploadedObject>, UploadError> {
        let count = files.len();
        let outcomes = join_all(files.into_iter().map(|file| self.process_file(file))).await;

        let mut uploaded = Vec::with_capacity(count);
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(object) => uploaded.push(object),
                Err(e) => {
                    error!("Upload pipeline failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(err) = first_error {
            if self.rollback_failed_batches {
                self.rollback(&uploaded).await;
            } else if !uploaded.is_empty() {
                warn!(
                    "Batch failed; {} already uploaded object(s) remain in the store",
                    uploaded.len()
                );
            }
            return Err(err);
        }

        self.cache.refresh().await.map_err(UploadError::CacheRefresh)?;

        info!("✅ Uploaded batch of {} file(s)", uploaded.len());
        Ok(uploaded)
    }

    pub async fn process_file(&self, file: IncomingFile) -> Result<UploadedObject, UploadError> {
        let mut staged = self.stage(&file).await?;
        let IncomingFile {
            original_name,
            content_type,
            data,
        } = file;
        // The staged copy is authoritative from here on
        drop(data);

        staged.detected_format =
            sniff_file(&staged.staging_path)
                .await
                .map_err(|source| UploadError::Staging {
                    name: original_name.clone(),
                    source,
                })?;

        if staged.detected_format.requires_normalization() {
            self.normalize(&mut staged).await?;
        }

        let key = staged.object_key();
        let content_type = normalize_content_type(content_type.as_deref());
        self.storage
            .upload_file(&key, staged.final_path(), content_type.as_deref())
            .await
            .map_err(|source| UploadError::Storage {
                key: key.clone(),
                source,
            })?;

        info!(
            "☁️  Stored {} as {} ({:?}{})",
            staged.original_name,
            key,
            staged.detected_format,
            if staged.is_transcoded() { ", transcoded" } else { "" }
        );

        let final_path = staged.final_path().to_path_buf();
        if let Err(e) = staged.artifact.close() {
            warn!(
                "Uploaded {} but could not remove {}: {}",
                key,
                final_path.display(),
                e
            );
        }

        Ok(UploadedObject { key })
    }

    async fn stage(&self, file: &IncomingFile) -> Result<StagedUpload, UploadError> {
        let staging_error = |source: std::io::Error| UploadError::Staging {
            name: file.original_name.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(staging_error)?;

        let extension = file_extension(&file.original_name);
        let artifact = TempPath::try_from_path(
            self.staging_dir
                .join(format!("{}{}", Uuid::new_v4(), extension)),
        )
        .map_err(staging_error)?;
        let staging_path = artifact.to_path_buf();

        tokio::fs::write(&staging_path, &file.data)
            .await
            .map_err(staging_error)?;

        Ok(StagedUpload {
            original_name: file.original_name.clone(),
            extension,
            staging_path,
            detected_format: MediaFormat::Unknown,
            artifact,
        })
    }

    /// Transcodes a staged file; on success the converted copy becomes the
    /// artifact and the original staged file is deleted.
    async fn normalize(&self, staged: &mut StagedUpload) -> Result<(), UploadError> {
        let converted = TempPath::try_from_path(
            self.staging_dir
                .join(format!("{}{}", Uuid::new_v4(), CONVERTED_SUFFIX)),
        )
        .map_err(|source| UploadError::Staging {
            name: staged.original_name.clone(),
            source,
        })?;

        self.transcoder
            .transcode(&staged.staging_path, &converted)
            .await
            .map_err(|source| UploadError::Transcode {
                name: staged.original_name.clone(),
                source,
            })?;

        let original = std::mem::replace(&mut staged.artifact, converted);
        original.close().map_err(|source| UploadError::Staging {
            name: staged.original_name.clone(),
            source,
        })?;

        Ok(())
    }

    async fn rollback(&self, uploaded: &[UploadedObject]) {
        for object in uploaded {
            match self.storage.delete_file(&object.key).await {
                Ok(()) => info!("↩️  Rolled back {}", object.key),
                Err(e) => error!("Failed to roll back {}: {}", object.key, e),
            }
        }
    }
}
