//! Public media URL shaping.
//!
//! Stored `video_path` values are either absolute URLs (new uploads) or
//! paths relative to the legacy media origin. Thumbnails live next to the
//! video with a `.jpg` extension; whether that object exists yet depends on
//! the thumbnail worker, so derived thumbnail URLs are best effort.

/// Legacy media origin for relative stored paths.
pub const DEFAULT_MEDIA_ORIGIN: &str = "https://v1sports.com/SwingStore/";

/// Video extensions that have a sibling `.jpg` thumbnail.
pub const THUMBNAIL_SOURCE_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".bin", ".mov"];

/// Extension of generated thumbnails.
pub const THUMBNAIL_EXTENSION: &str = ".jpg";

/// Turn a stored path into an absolute URL.
///
/// Empty paths stay empty and `http(s)` URLs are returned as-is.
pub fn absolute_media_url(origin: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with("http") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Derive the thumbnail path for a video path or key.
///
/// Replaces a trailing video extension with `.jpg`; other paths are
/// returned unchanged.
pub fn thumbnail_path(video_path: &str) -> String {
    for ext in THUMBNAIL_SOURCE_EXTENSIONS {
        if let Some(stem) = video_path.strip_suffix(ext) {
            return format!("{stem}{THUMBNAIL_EXTENSION}");
        }
    }
    video_path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_substitutes_known_extensions() {
        assert_eq!(thumbnail_path("a/b/clip.mp4"), "a/b/clip.jpg");
        assert_eq!(thumbnail_path("clip.webm"), "clip.jpg");
        assert_eq!(thumbnail_path("clip.bin"), "clip.jpg");
        assert_eq!(thumbnail_path("https://cdn.example/x/clip.mov"), "https://cdn.example/x/clip.jpg");
    }

    #[test]
    fn test_thumbnail_leaves_other_paths_alone() {
        assert_eq!(thumbnail_path("clip.avi"), "clip.avi");
        assert_eq!(thumbnail_path("clip"), "clip");
        assert_eq!(thumbnail_path(""), "");
    }

    #[test]
    fn test_relative_paths_get_origin() {
        assert_eq!(
            absolute_media_url(DEFAULT_MEDIA_ORIGIN, "190424231844IP9M2449503.mp4"),
            "https://v1sports.com/SwingStore/190424231844IP9M2449503.mp4"
        );
        assert_eq!(
            absolute_media_url("https://media.example", "/x.mp4"),
            "https://media.example/x.mp4"
        );
    }

    #[test]
    fn test_absolute_and_empty_paths_unchanged() {
        assert_eq!(
            absolute_media_url(DEFAULT_MEDIA_ORIGIN, "https://vos-media.example/swings/a.mp4"),
            "https://vos-media.example/swings/a.mp4"
        );
        assert_eq!(absolute_media_url(DEFAULT_MEDIA_ORIGIN, ""), "");
    }
}
