use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the gallery backend
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Basic auth username (default: "user")
    pub auth_username: String,

    /// Basic auth password. Authentication is disabled when unset.
    pub auth_password: Option<String>,

    /// Byte ceiling for the listing cache (default: 2 GB)
    pub max_cache_bytes: i64,

    /// Age after which a gallery query forces a cache refresh (default: 300s)
    pub cache_ttl_secs: u64,

    /// Lifetime of signed read URLs (default: 3600s)
    pub signed_url_expiry_secs: u64,

    /// Local directory for staged uploads (default: "temp")
    pub staging_dir: PathBuf,

    /// Maximum number of files per upload request (default: 10)
    pub max_files_per_upload: usize,

    /// Maximum request body size in bytes (default: 1 GB)
    pub max_upload_size: usize,

    /// Largest accepted gallery page (default: 100)
    pub max_page_size: usize,

    /// ffmpeg binary (default: "ffmpeg")
    pub ffmpeg_path: String,

    /// Video codec for normalized uploads (default: "libx264")
    pub video_codec: String,

    /// Encoder preset (default: "fast")
    pub transcode_preset: String,

    /// Constant rate factor (default: 23)
    pub transcode_crf: u8,

    /// Delete already-uploaded siblings when a batch fails (default: false)
    pub rollback_failed_batches: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            auth_username: "user".to_string(),
            auth_password: None,
            max_cache_bytes: 2 * 1024 * 1024 * 1024, // 2 GB
            cache_ttl_secs: 5 * 60,
            signed_url_expiry_secs: 3600,
            staging_dir: PathBuf::from("temp"),
            max_files_per_upload: 10,
            max_upload_size: 1024 * 1024 * 1024, // 1 GB
            max_page_size: 100,
            ffmpeg_path: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            transcode_preset: "fast".to_string(),
            transcode_crf: 23,
            rollback_failed_batches: false,
        }
    }
}

impl GalleryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            auth_username: env::var("AUTH_USERNAME").unwrap_or(default.auth_username),

            auth_password: env::var("AUTH_PASSWORD").ok().filter(|v| !v.is_empty()),

            max_cache_bytes: env::var("MAX_CACHE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_cache_bytes),

            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.cache_ttl_secs),

            signed_url_expiry_secs: env::var("SIGNED_URL_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.signed_url_expiry_secs),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            max_files_per_upload: env::var("MAX_FILES_PER_UPLOAD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_files_per_upload),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_page_size),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),

            video_codec: env::var("TRANSCODE_VIDEO_CODEC").unwrap_or(default.video_codec),

            transcode_preset: env::var("TRANSCODE_PRESET").unwrap_or(default.transcode_preset),

            transcode_crf: env::var("TRANSCODE_CRF")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.transcode_crf),

            rollback_failed_batches: env::var("ROLLBACK_FAILED_BATCHES")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.rollback_failed_batches),
        }
    }

    /// Create config for local development and tests (no auth, temp staging dir)
    pub fn development() -> Self {
        Self {
            staging_dir: env::temp_dir().join("media-gallery-staging"),
            ..Self::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }
}
