use crate::config::GalleryConfig;
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Failed to launch transcoder: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Transcoder exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

/// Converts a video into a browser-compatible codec.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// Re-encodes the video stream with ffmpeg, copying audio untouched.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    video_codec: String,
    preset: String,
    crf: u8,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: String, video_codec: String, preset: String, crf: u8) -> Self {
        Self {
            ffmpeg_path,
            video_codec,
            preset,
            crf,
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(
            config.ffmpeg_path.clone(),
            config.video_codec.clone(),
            config.transcode_preset.clone(),
            config.transcode_crf,
        )
    }

    fn build_command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-y")
            .arg("-i")
            .arg(input.as_os_str())
            .arg("-c:v")
            .arg(&self.video_codec)
            .arg("-preset")
            .arg(&self.preset)
            .arg("-crf")
            .arg(self.crf.to_string())
            .arg("-c:a")
            .arg("copy")
            .arg(output.as_os_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        info!(
            "🎞️  Transcoding {} -> {} ({}, preset={}, crf={})",
            input.display(),
            output.display(),
            self.video_codec,
            self.preset,
            self.crf
        );

        let result = self.build_command(input, output).output().await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!("ffmpeg failed: {}", stderr);
            return Err(TranscodeError::Failed {
                status: result.status,
                stderr,
            });
        }

        Ok(())
    }
}
