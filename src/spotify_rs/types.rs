//! Wire types for the Spotify Web API.
//!
//! Every nested collection tolerates being absent or `null`, and paging
//! containers skip `null` entries, so schema gaps never fail a whole response.

use serde::{Deserialize, Deserializer};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client-credentials token response
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SpotifyPaging<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Option<T>>,
    pub total: Option<u32>,
}

impl<T> SpotifyPaging<T> {
    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.items.into_iter().flatten()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// Simplified artist as embedded in tracks and albums
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtistRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Simplified album as embedded in a track
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbumRef {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<SpotifyArtistRef>,
    pub album: Option<SpotifyAlbumRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration_ms: u64,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<SpotifyArtistRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
    /// Only present on the full album object
    pub tracks: Option<SpotifyPaging<SpotifyTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyFollowers {
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    pub followers: Option<SpotifyFollowers>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistOwner {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistTracks {
    pub total: Option<u32>,
}

/// Simplified playlist as returned by the browse endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub owner: Option<SpotifyPlaylistOwner>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<SpotifyImage>,
    pub tracks: Option<SpotifyPlaylistTracks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchResponse {
    pub tracks: Option<SpotifyPaging<SpotifyTrack>>,
    pub albums: Option<SpotifyPaging<SpotifyAlbum>>,
    pub artists: Option<SpotifyPaging<SpotifyArtist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyFeaturedPlaylistsResponse {
    pub message: Option<String>,
    pub playlists: Option<SpotifyPaging<SpotifyPlaylist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyNewReleasesResponse {
    pub albums: Option<SpotifyPaging<SpotifyAlbum>>,
}
