//! Content-based format detection.
//!
//! Uploads carry a client-declared MIME type that is never trusted for
//! processing decisions; the staged bytes are inspected instead.

use std::path::Path;
use tokio::io::AsyncReadExt;

/// Enough leading bytes for every matcher `infer` ships with.
const SNIFF_LEN: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Heif,
    Avif,
    Bmp,
    Tiff,
    Mp4,
    QuickTime,
    Webm,
    Matroska,
    Avi,
    Ogg,
    /// Recognized by magic bytes but outside the media set above.
    Other(&'static str),
    Unknown,
}

impl MediaFormat {
    pub fn from_mime(mime: &'static str) -> Self {
        match mime {
            "image/jpeg" => MediaFormat::Jpeg,
            "image/png" => MediaFormat::Png,
            "image/gif" => MediaFormat::Gif,
            "image/webp" => MediaFormat::Webp,
            "image/heif" | "image/heic" => MediaFormat::Heif,
            "image/avif" => MediaFormat::Avif,
            "image/bmp" => MediaFormat::Bmp,
            "image/tiff" => MediaFormat::Tiff,
            "video/mp4" | "video/x-m4v" => MediaFormat::Mp4,
            "video/quicktime" => MediaFormat::QuickTime,
            "video/webm" => MediaFormat::Webm,
            "video/x-matroska" => MediaFormat::Matroska,
            "video/x-msvideo" => MediaFormat::Avi,
            "audio/ogg" | "video/ogg" => MediaFormat::Ogg,
            other => MediaFormat::Other(other),
        }
    }

    /// QuickTime containers frequently carry HEVC, which most browsers cannot play.
    pub fn requires_normalization(&self) -> bool {
        matches!(self, MediaFormat::QuickTime)
    }
}

/// Identifies a format from its leading bytes.
pub fn sniff(bytes: &[u8]) -> MediaFormat {
    infer::get(bytes)
        .map(|kind| MediaFormat::from_mime(kind.mime_type()))
        .unwrap_or(MediaFormat::Unknown)
}

/// Reads the head of a staged file and sniffs it.
pub async fn sniff_file(path: &Path) -> std::io::Result<MediaFormat> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buffer = vec![0u8; SNIFF_LEN];
    let mut n = 0;
    while n < SNIFF_LEN {
        let read = file.read(&mut buffer[n..]).await?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(sniff(&buffer[..n]))
}
