//! ffprobe / ffmpeg subprocess helpers used by the thumbnail worker.

use std::path::Path;

use serde::Deserialize;

/// Width of generated swing thumbnails; height keeps the aspect ratio.
pub const THUMBNAIL_WIDTH: i32 = 480;

/// Preferred capture point for a thumbnail, in seconds.
pub const THUMBNAIL_OFFSET_SECS: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

impl FfmpegError {
    /// `true` when the failure says something about the media itself rather
    /// than the host (missing binary, missing file).
    pub fn is_unreadable_media(&self) -> bool {
        matches!(self, Self::ExecutionFailed { .. } | Self::ParseError(_))
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
///
/// Only the fields the thumbnail worker reads; serde skips the rest.
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn inspect_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Extract a single frame as a JPEG at `timestamp_secs`, scaled to `width`.
pub async fn extract_frame_thumbnail(
    video_path: &Path,
    output_path: &Path,
    timestamp_secs: f64,
    width: i32,
) -> Result<(), FfmpegError> {
    if !video_path.exists() {
        return Err(FfmpegError::VideoNotFound(
            video_path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-ss", &format!("{timestamp_secs:.3}"), "-i"])
        .arg(video_path)
        .args([
            "-vframes",
            "1",
            "-vf",
            &format!("scale={width}:-2"),
            "-q:v",
            "2",
        ])
        .arg(output_path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn first_video_stream(info: &FfprobeOutput) -> Option<&FfprobeStream> {
    info.streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Whether the container holds at least one video stream.
pub fn has_video_stream(info: &FfprobeOutput) -> bool {
    first_video_stream(info).is_some()
}

/// Parse the video duration in seconds from ffprobe output.
pub fn parse_duration(info: &FfprobeOutput) -> f64 {
    if let Some(secs) = info.format.duration.as_deref().and_then(|d| d.parse().ok()) {
        return secs;
    }
    first_video_stream(info)
        .and_then(|s| s.duration.as_deref())
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0)
}

/// Pick the capture point: one second in, or the midpoint of shorter clips.
pub fn thumbnail_timestamp(duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        0.0
    } else if duration_secs > THUMBNAIL_OFFSET_SECS * 2.0 {
        THUMBNAIL_OFFSET_SECS
    } else {
        duration_secs / 2.0
    }
}
