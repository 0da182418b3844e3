use serde::{Deserialize, Serialize};

/// A single playable track, decoupled from any provider schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    /// First credited artist, or `"Unknown"`.
    pub artist: String,
    /// Containing album name, or `"Unknown"`.
    pub album: String,
    pub album_cover: String,
    pub duration_ms: u64,
    pub preview_url: Option<String>,
}

/// An album or an album-shaped playlist.
///
/// `tracks` is only populated by single-album lookups; list endpoints leave it unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub cover_image: String,
    /// Provider release date verbatim; empty for playlists.
    pub release_date: String,
    pub total_tracks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub image: String,
    pub genres: Vec<String>,
    /// `None` means the provider did not report a count, which is not the same as zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
}

/// Results of a combined search. The three lists are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.albums.is_empty() && self.artists.is_empty()
    }
}
