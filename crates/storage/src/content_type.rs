//! Content-type inference from file extensions.

use std::fmt;

/// A MIME type string such as `image/png`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentType(&'static str);

pub const APPLICATION_JSON: ContentType = ContentType("application/json");
pub const APPLICATION_OCTET_STREAM: ContentType = ContentType("application/octet-stream");
pub const IMAGE_PNG: ContentType = ContentType("image/png");
pub const TEXT_PLAIN: ContentType = ContentType("text/plain");

/// Extension to MIME type table. Keys are lowercase.
const EXTENSIONS: &[(&str, &str)] = &[
    // text
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("log", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("xml", "application/xml"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("toml", "application/toml"),
    // images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    // audio / video
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    // fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    // documents and archives
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("wasm", "application/wasm"),
    ("bin", "application/octet-stream"),
];

impl ContentType {
    /// Look up the content type for an extension (without the dot).
    ///
    /// The lookup is case-insensitive. Unknown and empty extensions yield `None`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        if extension.is_empty() {
            return None;
        }
        EXTENSIONS
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, mime)| ContentType(mime))
    }

    /// The MIME type string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Final dot-separated segment of `path`, or `None` when it contains no `.`.
///
/// A trailing `.` yields `Some("")`.
pub fn extension_of(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, extension)| extension)
}

/// Content type inferred from the final dot-separated segment of `path`.
pub fn content_type_for_path(path: &str) -> Option<ContentType> {
    extension_of(path).and_then(ContentType::from_extension)
}
