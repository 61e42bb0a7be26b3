//! Catalog URL classification.

use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;

/// What a catalog URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Album,
    Song,
    Playlist,
    Artist,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Song => "song",
            Self::Playlist => "playlist",
            Self::Artist => "artist",
        }
    }

    /// Progress line shown once the URL has been recognised.
    pub fn detected_message(self) -> &'static str {
        match self {
            Self::Album => "Album detected, preparing download...",
            Self::Song => "Single song detected, preparing download...",
            Self::Playlist => "Playlist detected, preparing download...",
            Self::Artist => "Artist detected, preparing download...",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify by path segment. An album link with a `?i=` track selector is a
/// single song.
pub fn classify_url(url: &str) -> Option<MediaKind> {
    let track_selector = url.contains("?i=");
    if url.contains("/album/") && !track_selector {
        Some(MediaKind::Album)
    } else if url.contains("/song/") || (url.contains("/album/") && track_selector) {
        Some(MediaKind::Song)
    } else if url.contains("/playlist/") {
        Some(MediaKind::Playlist)
    } else if url.contains("/artist/") {
        Some(MediaKind::Artist)
    } else {
        None
    }
}

/// Trailing catalog id: digits for albums/songs/artists, `pl.<hex>` for
/// playlists. A `?i=` track selector wins over the album id.
pub fn catalog_id(url: &str) -> Option<String> {
    static TRACK: OnceLock<Option<Regex>> = OnceLock::new();
    static TRAILING: OnceLock<Option<Regex>> = OnceLock::new();

    let track = TRACK.get_or_init(|| Regex::new(r"[?&]i=(\d+)").ok()).as_ref()?;
    if let Some(caps) = track.captures(url) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let trailing = TRAILING
        .get_or_init(|| Regex::new(r"/((?:pl\.)?[A-Za-z0-9.\-]*\d[A-Za-z0-9.\-]*)/?$").ok())
        .as_ref()?;
    trailing
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_kind() {
        assert_eq!(
            classify_url("https://music.example/us/album/best-of/123"),
            Some(MediaKind::Album)
        );
        assert_eq!(
            classify_url("https://music.example/us/album/best-of/123?i=456"),
            Some(MediaKind::Song)
        );
        assert_eq!(
            classify_url("https://music.example/us/song/track/456"),
            Some(MediaKind::Song)
        );
        assert_eq!(
            classify_url("https://music.example/us/playlist/mix/pl.abc123"),
            Some(MediaKind::Playlist)
        );
        assert_eq!(
            classify_url("https://music.example/us/artist/someone/789"),
            Some(MediaKind::Artist)
        );
    }

    #[test]
    fn rejects_unrecognised_urls() {
        assert_eq!(classify_url("https://music.example/us/browse"), None);
        assert_eq!(classify_url("not a url"), None);
        assert_eq!(classify_url(""), None);
    }

    #[test]
    fn extracts_catalog_ids() {
        assert_eq!(
            catalog_id("https://music.example/album/123").as_deref(),
            Some("123")
        );
        assert_eq!(
            catalog_id("https://music.example/us/album/x/123?i=456").as_deref(),
            Some("456")
        );
        assert_eq!(
            catalog_id("https://music.example/us/playlist/mix/pl.u-abc123").as_deref(),
            Some("pl.u-abc123")
        );
        assert_eq!(catalog_id("https://music.example/us/browse"), None);
    }

    #[test]
    fn display_is_lowercase_kind() {
        assert_eq!(MediaKind::Album.to_string(), "album");
        assert!(MediaKind::Album.detected_message().contains("Album"));
    }
}
