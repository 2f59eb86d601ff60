//! Request classification: manifest vs. static pass-through.

use url::Url;

/// Path suffixes treated as static media (raw byte pass-through).
pub const STATIC_EXTENSIONS: &[&str] = &[
    ".ts", ".jpg", ".key", ".mp4", ".m4s", ".aac", ".mp3", ".webm",
];

/// How a proxied resource is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceClass {
    /// Binary media artifact, streamed through unmodified.
    Static,
    /// Playlist text, piped through the manifest rewriter.
    Manifest,
}

impl ResourceClass {
    /// Classify a target URL.
    ///
    /// Matching is suffix-of-path and case-insensitive; the query string is
    /// ignored so extension-like substrings in parameters cannot flip a
    /// manifest into pass-through.
    pub fn of(url: &Url) -> Self {
        let path = url.path().to_ascii_lowercase();
        if STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            ResourceClass::Static
        } else {
            ResourceClass::Manifest
        }
    }

    pub fn is_static(self) -> bool {
        self == ResourceClass::Static
    }

    /// Label used in logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            ResourceClass::Static => "static",
            ResourceClass::Manifest => "manifest",
        }
    }
}

/// Derive the base URL used to resolve relative playlist references.
///
/// Everything after the last `/` of the raw URL string is removed, never
/// counting the `//` of the scheme separator. The result always ends in `/`:
/// a URL with no path at all gets one appended.
pub fn base_url_of(url: &str) -> String {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].rfind('/') {
        Some(i) => url[..after_scheme + i + 1].to_string(),
        None => format!("{url}/"),
    }
}

/// Fallback Content-Type when the origin response carries none.
pub fn content_type_for(url: &Url) -> &'static str {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else if path.ends_with(".ts") {
        "video/mp2t"
    } else if path.ends_with(".jpg") {
        "image/jpeg"
    } else if path.ends_with(".key") {
        "application/octet-stream"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn segment_extensions_are_static() {
        for ext in STATIC_EXTENSIONS {
            let url = parse(&format!("https://cdn.example.com/media/file{ext}"));
            assert_eq!(ResourceClass::of(&url), ResourceClass::Static, "{ext}");
        }
    }

    #[test]
    fn playlists_are_manifests() {
        let url = parse("https://cdn.example.com/live/playlist.m3u8");
        assert_eq!(ResourceClass::of(&url), ResourceClass::Manifest);
    }

    #[test]
    fn extensionless_paths_are_manifests() {
        let url = parse("https://cdn.example.com/live/master");
        assert_eq!(ResourceClass::of(&url), ResourceClass::Manifest);
    }

    #[test]
    fn classification_is_case_insensitive() {
        let url = parse("https://cdn.example.com/media/SEGMENT.TS");
        assert_eq!(ResourceClass::of(&url), ResourceClass::Static);
    }

    #[test]
    fn extension_in_query_string_does_not_match() {
        // Path-suffix matching: a ".ts" buried in a parameter is not a segment.
        let url = parse("https://cdn.example.com/playlist.m3u8?next=seg.ts");
        assert_eq!(ResourceClass::of(&url), ResourceClass::Manifest);
    }

    #[test]
    fn base_url_strips_final_segment() {
        assert_eq!(
            base_url_of("https://cdn.example.com/videos/playlist.m3u8"),
            "https://cdn.example.com/videos/"
        );
    }

    #[test]
    fn base_url_of_host_only_url_gains_slash() {
        assert_eq!(base_url_of("https://cdn.example.com"), "https://cdn.example.com/");
    }

    #[test]
    fn base_url_ignores_scheme_slashes() {
        // The // after the scheme must not count as a path separator.
        assert_eq!(base_url_of("https://host/x"), "https://host/");
    }

    #[test]
    fn base_url_always_ends_with_slash() {
        for url in [
            "https://cdn.example.com/a/b/c.m3u8",
            "https://cdn.example.com/a/",
            "https://cdn.example.com",
            "http://host:8080/live/chunklist.m3u8?token=abc",
        ] {
            assert!(base_url_of(url).ends_with('/'), "{url}");
        }
    }

    #[test]
    fn content_type_inference() {
        assert_eq!(
            content_type_for(&parse("https://h/p.m3u8")),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(content_type_for(&parse("https://h/s.ts")), "video/mp2t");
        assert_eq!(content_type_for(&parse("https://h/t.jpg")), "image/jpeg");
        assert_eq!(
            content_type_for(&parse("https://h/k.key")),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for(&parse("https://h/unknown.bin")),
            "application/octet-stream"
        );
    }
}
