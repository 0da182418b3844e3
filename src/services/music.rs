use std::future::Future;

use crate::domain::{Album, Artist, SearchResult, Track};
use crate::ports::catalog::{CatalogFetchError, CatalogPort, Operation};
use crate::services::cache::{CacheKey, Cacheable, ResultCache, cache_key};
use crate::spotify_rs::auth::AuthError;

fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

/// Single entry point for catalog reads.
///
/// The `try_*` methods report fetch failures; the plain methods log them and
/// fall back to the empty value, so browsing keeps working when the catalog
/// is degraded.
pub struct MusicService<C: CatalogPort> {
    catalog: C,
    cache: ResultCache,
}

impl<C: CatalogPort> MusicService<C> {
    pub fn new(catalog: C, cache: ResultCache) -> Self {
        Self { catalog, cache }
    }

    /// Resolves once the catalog has obtained its first credential.
    pub async fn ready(&self) -> Result<(), AuthError> {
        self.catalog.ready().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        tracing::info!("Result cache cleared");
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    async fn memoized<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, CatalogFetchError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CatalogFetchError>>,
    {
        if let Some(hit) = self.cache.get(&key).await.and_then(T::from_cached) {
            tracing::debug!(%key, "Cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.cache.put(key, value.clone().into_cached()).await;
        Ok(value)
    }

    pub async fn try_search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogFetchError> {
        if is_blank(query) {
            tracing::debug!("Blank track query, skipping catalog");
            return Ok(Vec::new());
        }
        let tracks = self
            .memoized(
                cache_key(Operation::SearchTracks, &[query]),
                || self.catalog.search_tracks(query),
            )
            .await?;
        tracing::info!(query, count = tracks.len(), "Track search finished");
        Ok(tracks)
    }

    pub async fn try_search_all(&self, query: &str) -> Result<SearchResult, CatalogFetchError> {
        if is_blank(query) {
            tracing::debug!("Blank search query, skipping catalog");
            return Ok(SearchResult::default());
        }
        let result = self
            .memoized(
                cache_key(Operation::SearchAll, &[query]),
                || self.catalog.search_all(query),
            )
            .await?;
        tracing::info!(
            query,
            tracks = result.tracks.len(),
            albums = result.albums.len(),
            artists = result.artists.len(),
            "Search finished"
        );
        Ok(result)
    }

    pub async fn try_album(&self, id: &str) -> Result<Album, CatalogFetchError> {
        self.memoized(cache_key(Operation::Album, &[id]), || self.catalog.album(id))
            .await
    }

    pub async fn try_artist(&self, id: &str) -> Result<Artist, CatalogFetchError> {
        self.memoized(cache_key(Operation::Artist, &[id]), || self.catalog.artist(id))
            .await
    }

    pub async fn try_featured_playlists(&self) -> Result<Vec<Album>, CatalogFetchError> {
        self.memoized(
            cache_key(Operation::FeaturedPlaylists, &[]),
            || self.catalog.featured_playlists(),
        )
        .await
    }

    pub async fn try_new_releases(&self) -> Result<Vec<Album>, CatalogFetchError> {
        let releases = self
            .memoized(
                cache_key(Operation::NewReleases, &[]),
                || self.catalog.new_releases(),
            )
            .await?;
        tracing::info!(count = releases.len(), "New releases fetched");
        Ok(releases)
    }

    pub async fn search_tracks(&self, query: &str) -> Vec<Track> {
        or_empty(Operation::SearchTracks, self.try_search_tracks(query).await)
    }

    pub async fn search_all(&self, query: &str) -> SearchResult {
        or_empty(Operation::SearchAll, self.try_search_all(query).await)
    }

    pub async fn album(&self, id: &str) -> Album {
        or_empty(Operation::Album, self.try_album(id).await)
    }

    pub async fn artist(&self, id: &str) -> Artist {
        or_empty(Operation::Artist, self.try_artist(id).await)
    }

    pub async fn featured_playlists(&self) -> Vec<Album> {
        or_empty(
            Operation::FeaturedPlaylists,
            self.try_featured_playlists().await,
        )
    }

    pub async fn new_releases(&self) -> Vec<Album> {
        or_empty(Operation::NewReleases, self.try_new_releases().await)
    }
}

fn or_empty<T: Default>(operation: Operation, result: Result<T, CatalogFetchError>) -> T {
    result.unwrap_or_else(|error| {
        tracing::warn!(%operation, %error, "Catalog fetch failed, returning empty result");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::catalog::MockCatalogPort;
    use crate::services::cache::CachePolicy;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Track {id}"),
            artist: "Daft Punk".to_string(),
            album: "Discovery".to_string(),
            ..Track::default()
        }
    }

    fn service(catalog: MockCatalogPort) -> MusicService<MockCatalogPort> {
        MusicService::new(catalog, ResultCache::new(CachePolicy::default()))
    }

    #[tokio::test]
    async fn test_blank_query_touches_nothing() {
        // No expectations: any catalog call panics
        let service = service(MockCatalogPort::new());

        assert_eq!(service.search_all("").await, SearchResult::default());
        assert_eq!(service.search_all("   \t\n").await, SearchResult::default());
        assert!(service.search_tracks("  ").await.is_empty());
        assert!(service.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_warm_cache_skips_catalog() {
        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_search_tracks()
            .withf(|query| query == "one more time")
            .times(1)
            .returning(|_| Ok(vec![track("t1")]));
        let service = service(catalog);

        let first = service.search_tracks("one more time").await;
        let second = service.search_tracks("one more time").await;

        assert_eq!(first, second);
        assert_eq!(first[0].id, "t1");
    }

    #[tokio::test]
    async fn test_same_query_different_operations_are_cached_separately() {
        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_search_tracks()
            .times(1)
            .returning(|_| Ok(vec![track("t1")]));
        catalog.expect_search_all().times(1).returning(|_| {
            Ok(SearchResult {
                tracks: vec![track("t2")],
                ..SearchResult::default()
            })
        });
        let service = service(catalog);

        let tracks = service.search_tracks("a").await;
        let all = service.search_all("a").await;

        assert_eq!(tracks[0].id, "t1");
        assert_eq!(all.tracks[0].id, "t2");
        assert_eq!(service.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut catalog = MockCatalogPort::new();
        let mut seq = mockall::Sequence::new();
        catalog
            .expect_album()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(CatalogFetchError::Status {
                    status: 500,
                    url: "/albums/al1".to_string(),
                })
            });
        catalog
            .expect_album()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| {
                Ok(Album {
                    id: id.to_string(),
                    name: "Discovery".to_string(),
                    ..Album::default()
                })
            });
        let service = service(catalog);

        assert_eq!(service.album("al1").await, Album::default());
        assert_eq!(service.album("al1").await.name, "Discovery");
        assert_eq!(service.album("al1").await.name, "Discovery");
    }

    #[tokio::test]
    async fn test_tagged_api_distinguishes_failure_from_empty() {
        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_artist()
            .returning(|_| Err(CatalogFetchError::Request("connection reset".to_string())));
        catalog.expect_new_releases().returning(|| Ok(Vec::new()));
        let service = service(catalog);

        assert!(service.try_artist("a1").await.is_err());
        assert_eq!(service.artist("a1").await, Artist::default());
        assert_eq!(tokio_test::assert_ok!(service.try_new_releases().await), Vec::new());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let mut catalog = MockCatalogPort::new();
        catalog
            .expect_featured_playlists()
            .times(2)
            .returning(|| Ok(vec![Album::default()]));
        let service = service(catalog);

        service.featured_playlists().await;
        service.featured_playlists().await;
        service.clear_cache().await;
        service.featured_playlists().await;
    }

    #[tokio::test]
    async fn test_ready_propagates_auth_failure() {
        let mut catalog = MockCatalogPort::new();
        catalog.expect_ready().times(1).returning(|| {
            Err(AuthError::FailedToSendRequest("dns error".to_string()))
        });
        let service = service(catalog);

        assert_eq!(
            service.ready().await,
            Err(AuthError::FailedToSendRequest("dns error".to_string()))
        );
    }
}
