//! Path utilities for upload validation and output naming.
//!
//! Uploaded file names come straight from the client, so anything derived
//! from them (the output base name, download names) goes through these helpers
//! before it touches the filesystem.

use std::path::Path;

/// Video extensions accepted for upload when nothing else is configured.
const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Base name used when a client-supplied name sanitizes to nothing.
const FALLBACK_STEM: &str = "video";

/// Default list of accepted upload extensions.
#[must_use]
pub fn default_video_extensions() -> &'static [&'static str] {
    DEFAULT_VIDEO_EXTENSIONS
}

/// Lowercased extension of `path`, if any.
///
/// ```
/// use std::path::Path;
/// use segtrim_common::paths::extension_of;
///
/// assert_eq!(extension_of(Path::new("clip.MKV")).as_deref(), Some("mkv"));
/// assert_eq!(extension_of(Path::new("noext")), None);
/// ```
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path carries one of the allowed extensions (case-insensitive).
///
/// ```
/// use std::path::Path;
/// use segtrim_common::paths::is_allowed_video;
///
/// let allowed = ["mp4", "mov", "avi", "mkv"];
/// assert!(is_allowed_video(Path::new("talk.mp4"), &allowed));
/// assert!(is_allowed_video(Path::new("talk.MkV"), &allowed));
/// assert!(!is_allowed_video(Path::new("talk.webm"), &allowed));
/// assert!(!is_allowed_video(Path::new("mp4"), &allowed));
/// ```
pub fn is_allowed_video<S: AsRef<str>>(path: &Path, allowed: &[S]) -> bool {
    extension_of(path)
        .map(|ext| allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Reduce a client-supplied file name to a safe stem.
///
/// Directory components are dropped, the extension is removed, and every
/// character that is not a (Unicode) letter or digit, `.`, `_` or `-` becomes
/// `_`. Leading dots are stripped so the result can never be `.` or `..`.
///
/// ```
/// use segtrim_common::paths::sanitize_stem;
///
/// assert_eq!(sanitize_stem("My Trip (2024).mp4"), "My_Trip__2024_");
/// assert_eq!(sanitize_stem("../../etc/passwd.mkv"), "passwd");
/// assert_eq!(sanitize_stem("Reunião.mp4"), "Reunião");
/// assert_eq!(sanitize_stem("..."), "video");
/// ```
pub fn sanitize_stem(file_name: &str) -> String {
    // Clients on Windows send backslash separators.
    let last = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let stem = match last.rfind('.') {
        Some(idx) if idx > 0 => &last[..idx],
        _ => last,
    };

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Whether `name` is a plain file name that can be joined onto a directory
/// without escaping it.
///
/// ```
/// use segtrim_common::paths::is_safe_file_name;
///
/// assert!(is_safe_file_name("talk_20240101_120000.mp4"));
/// assert!(!is_safe_file_name("../secret.mp4"));
/// assert!(!is_safe_file_name("a/b.mp4"));
/// assert!(!is_safe_file_name(""));
/// ```
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.starts_with('.')
}
