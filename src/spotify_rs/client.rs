use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::spotify_rs::types::{
    SpotifyAlbum, SpotifyArtist, SpotifyFeaturedPlaylistsResponse, SpotifyNewReleasesResponse,
    SpotifySearchResponse,
};

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },
    #[error("Failed to read response body: {0}")]
    FailedToReadBody(reqwest::Error),
    #[error("Failed to parse response from {url}: {source}")]
    FailedToParseResponse {
        url: String,
        source: serde_json::Error,
    },
}

/// Bearer-authorized reads against the Spotify Web API.
///
/// Returns the provider's own schema; translation happens in the adapter.
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: reqwest::Client,
    base_url: String,
}

impl SpotifyApi {
    pub fn new(client: reqwest::Client, api_url: &Url) -> Self {
        Self {
            client,
            base_url: api_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
        access_token: &str,
    ) -> Result<T, SpotifyApiError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(SpotifyApiError::FailedToSendRequest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(SpotifyApiError::FailedToReadBody)?;

        serde_json::from_slice(&body)
            .map_err(|source| SpotifyApiError::FailedToParseResponse { url, source })
    }

    /// Search the catalog for any combination of `track`, `album` and `artist`.
    pub async fn search(
        &self,
        access_token: &str,
        query: &str,
        types: &[&str],
        limit: u32,
    ) -> Result<SpotifySearchResponse, SpotifyApiError> {
        let path = format!(
            "/search?q={}&type={}&limit={}",
            urlencoding::encode(query),
            types.join(","),
            limit
        );
        self.get(&path, access_token).await
    }

    /// Get a full album, including its first page of tracks
    pub async fn album(&self, access_token: &str, id: &str) -> Result<SpotifyAlbum, SpotifyApiError> {
        self.get(&format!("/albums/{}", urlencoding::encode(id)), access_token)
            .await
    }

    pub async fn artist(
        &self,
        access_token: &str,
        id: &str,
    ) -> Result<SpotifyArtist, SpotifyApiError> {
        self.get(&format!("/artists/{}", urlencoding::encode(id)), access_token)
            .await
    }

    pub async fn featured_playlists(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<SpotifyFeaturedPlaylistsResponse, SpotifyApiError> {
        self.get(
            &format!("/browse/featured-playlists?limit={}", limit),
            access_token,
        )
        .await
    }

    pub async fn new_releases(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<SpotifyNewReleasesResponse, SpotifyApiError> {
        self.get(&format!("/browse/new-releases?limit={}", limit), access_token)
            .await
    }
}
