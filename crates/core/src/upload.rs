//! Upload contract: accepted content types, declared length, storage keys,
//! and the re-upload policy.

use chrono::{Datelike, NaiveDateTime};

use crate::error::CoreError;
use crate::types::DbId;

/// Chunk size used when copying an inbound body into storage (192 KiB).
pub const UPLOAD_CHUNK_SIZE: usize = 8192 * 24;

/// Prefix applied to storage keys outside production.
pub const NON_PRODUCTION_KEY_PREFIX: &str = "test/";

/// Root folder for swing videos inside the bucket.
const SWING_KEY_ROOT: &str = "swings";

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadContentType {
    Mp4,
    Webm,
    QuickTime,
    OctetStream,
}

/// Accepted `Content-Type` header values.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "application/octet-stream",
];

impl UploadContentType {
    /// Parse a `Content-Type` header value against the allow-list.
    ///
    /// Parameters such as `; codecs=...` are ignored.
    pub fn parse(header: Option<&str>) -> Result<Self, CoreError> {
        let mime = header
            .map(|h| h.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .unwrap_or_default();
        match mime.as_str() {
            "video/mp4" => Ok(Self::Mp4),
            "video/webm" => Ok(Self::Webm),
            "video/quicktime" => Ok(Self::QuickTime),
            "application/octet-stream" => Ok(Self::OctetStream),
            _ => Err(CoreError::Validation(format!(
                "Content-Type header must be specified. Acceptable values: {}",
                ACCEPTED_CONTENT_TYPES.join(", ")
            ))),
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::QuickTime => "video/quicktime",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// File extension (without the dot) for stored objects.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::QuickTime => "mov",
            Self::OctetStream => "bin",
        }
    }
}

/// Validate the declared body length. Absent or zero is rejected.
pub fn validate_declared_length(length: Option<u64>) -> Result<u64, CoreError> {
    match length {
        Some(n) if n > 0 => Ok(n),
        _ => Err(CoreError::Validation(
            "Content-Length header must be specified".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Deployment environment, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Production,
    Staging,
    Local,
    Testing,
}

impl AppEnvironment {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "local" | "development" | "dev" => Ok(Self::Local),
            "testing" | "test" => Ok(Self::Testing),
            other => Err(CoreError::Validation(format!(
                "Unknown APP_ENV '{other}'. Must be one of: production, staging, local, testing"
            ))),
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Build the storage key for a swing video.
///
/// `swings/{YYYY}/{YYYYMMDDHHMMSS}-{swing_id}.{ext}`, prefixed with `test/`
/// outside production. The swing id keeps two uploads in the same second
/// from sharing a key.
pub fn build_video_key(
    now: NaiveDateTime,
    swing_id: DbId,
    content_type: UploadContentType,
    env: AppEnvironment,
) -> String {
    let key = format!(
        "{SWING_KEY_ROOT}/{year}/{stamp}-{swing_id}.{ext}",
        year = now.year(),
        stamp = now.format("%Y%m%d%H%M%S"),
        ext = content_type.extension(),
    );
    if env.is_production() {
        key
    } else {
        format!("{NON_PRODUCTION_KEY_PREFIX}{key}")
    }
}

// ---------------------------------------------------------------------------
// Re-upload policy
// ---------------------------------------------------------------------------

/// What to do when media is uploaded for a swing that already has a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuploadPolicy {
    Overwrite,
    Reject,
}

impl ReuploadPolicy {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            other => Err(CoreError::Validation(format!(
                "Unknown re-upload policy '{other}'. Must be 'overwrite' or 'reject'"
            ))),
        }
    }

    /// Check an upload target against the policy.
    pub fn check(self, existing_video_path: &str) -> Result<(), CoreError> {
        if self == Self::Reject && !existing_video_path.is_empty() {
            return Err(CoreError::Conflict("Video already uploaded".into()));
        }
        Ok(())
    }
}
