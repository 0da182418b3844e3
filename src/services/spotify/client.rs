use std::sync::Arc;

use crate::domain::{Album, Artist, SearchResult, Track};
use crate::ports::catalog::{CatalogFetchError, CatalogPort};
use crate::services::spotify::mapping;
use crate::spotify_rs::auth::{AuthError, CredentialManager};
use crate::spotify_rs::client::{SpotifyApi, SpotifyApiError};

pub const TRACK_SEARCH_LIMIT: u32 = 20;
pub const SEARCH_ALL_LIMIT: u32 = 10;
pub const BROWSE_LIMIT: u32 = 10;

impl From<SpotifyApiError> for CatalogFetchError {
    fn from(error: SpotifyApiError) -> Self {
        match error {
            SpotifyApiError::FailedToSendRequest(error) | SpotifyApiError::FailedToReadBody(error) => {
                CatalogFetchError::Request(error.to_string())
            }
            SpotifyApiError::Status { status, url } => CatalogFetchError::Status { status, url },
            SpotifyApiError::FailedToParseResponse { url, source } => {
                CatalogFetchError::Decode(format!("{url}: {source}"))
            }
        }
    }
}

/// Catalog backed by the Spotify Web API.
///
/// Every call first obtains a valid credential, so calls made before the first
/// token arrives wait for it instead of failing.
pub struct SpotifyHttpAdapter {
    api: SpotifyApi,
    credentials: Arc<CredentialManager>,
}

impl SpotifyHttpAdapter {
    pub fn new(api: SpotifyApi, credentials: Arc<CredentialManager>) -> Self {
        Self { api, credentials }
    }

    async fn access_token(&self) -> Result<String, CatalogFetchError> {
        let credential = self.credentials.valid_credential().await?;
        Ok(credential.token().to_string())
    }
}

#[async_trait::async_trait]
impl CatalogPort for SpotifyHttpAdapter {
    async fn ready(&self) -> Result<(), AuthError> {
        self.credentials.valid_credential().await.map(|_| ())
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogFetchError> {
        let token = self.access_token().await?;
        let response = self
            .api
            .search(&token, query, &["track"], TRACK_SEARCH_LIMIT)
            .await?;
        Ok(mapping::tracks(response.tracks))
    }

    async fn search_all(&self, query: &str) -> Result<SearchResult, CatalogFetchError> {
        let token = self.access_token().await?;
        let response = self
            .api
            .search(&token, query, &["track", "album", "artist"], SEARCH_ALL_LIMIT)
            .await?;
        Ok(mapping::search_result(response))
    }

    async fn album(&self, id: &str) -> Result<Album, CatalogFetchError> {
        let token = self.access_token().await?;
        let album = self.api.album(&token, id).await?;
        Ok(mapping::album_with_tracks(album))
    }

    async fn artist(&self, id: &str) -> Result<Artist, CatalogFetchError> {
        let token = self.access_token().await?;
        let artist = self.api.artist(&token, id).await?;
        Ok(mapping::artist(artist))
    }

    async fn featured_playlists(&self) -> Result<Vec<Album>, CatalogFetchError> {
        let token = self.access_token().await?;
        let response = self.api.featured_playlists(&token, BROWSE_LIMIT).await?;
        Ok(mapping::playlists_as_albums(response.playlists))
    }

    async fn new_releases(&self) -> Result<Vec<Album>, CatalogFetchError> {
        let token = self.access_token().await?;
        let response = self.api.new_releases(&token, BROWSE_LIMIT).await?;
        Ok(mapping::albums(response.albums))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ManualClock, spotify_adapter, token_body};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("catalog-token", 3600)))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_tracks_is_bearer_authorized() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "digital love"))
            .and(query_param("type", "track"))
            .and(query_param("limit", "20"))
            .and(header("authorization", "Bearer catalog-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": [
                    { "id": "t1", "name": "Digital Love", "artists": [{ "name": "Daft Punk" }],
                      "album": { "name": "Discovery", "images": [] }, "duration_ms": 301000 }
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = spotify_adapter(&server, Arc::new(ManualClock::default()));
        let tracks = adapter.search_tracks("digital love").await.unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist, "Daft Punk");
    }

    #[tokio::test]
    async fn test_token_is_shared_across_operations() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/browse/new-releases"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "albums": { "items": [{ "id": "n1", "name": "Fresh", "artists": [{ "name": "Someone" }],
                                       "images": [], "release_date": "2026-10-01", "total_tracks": 9 }] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/browse/featured-playlists"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Monday morning",
                "playlists": { "items": [null, { "id": "p1", "name": "Mood Booster", "images": null }] }
            })))
            .mount(&server)
            .await;

        let adapter = spotify_adapter(&server, Arc::new(ManualClock::default()));

        let releases = adapter.new_releases().await.unwrap();
        let playlists = adapter.featured_playlists().await.unwrap();

        assert_eq!(releases[0].release_date, "2026-10-01");
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].artist, "Spotify");
        assert_eq!(playlists[0].cover_image, "");
    }

    #[tokio::test]
    async fn test_operations_before_ready_wait_for_first_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("first-token", 3600))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("authorization", "Bearer first-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": [{ "id": "t9", "name": "Instant Crush", "artists": [{ "name": "Daft Punk" }] }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = spotify_adapter(&server, Arc::new(ManualClock::default()));

        let (ready, tracks) = tokio::join!(adapter.ready(), adapter.search_tracks("instant crush"));

        tokio_test::assert_ok!(ready);
        let tracks = tokio_test::assert_ok!(tracks);
        assert_eq!(tracks[0].title, "Instant Crush");
    }

    #[tokio::test]
    async fn test_album_server_error_is_a_fetch_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/albums/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let adapter = spotify_adapter(&server, Arc::new(ManualClock::default()));

        assert!(matches!(
            adapter.album("broken").await,
            Err(CatalogFetchError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces_as_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = spotify_adapter(&server, Arc::new(ManualClock::default()));

        assert!(matches!(
            adapter.artist("a1").await,
            Err(CatalogFetchError::Unauthorized(AuthError::Rejected { status: 400, .. }))
        ));
        assert!(adapter.ready().await.is_err());
    }
}
