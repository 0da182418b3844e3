use std::fmt;

use crate::domain::{Album, Artist, SearchResult, Track};
use crate::spotify_rs::auth::AuthError;

/// The read operations a catalog offers, used to label logs and cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SearchTracks,
    SearchAll,
    Album,
    Artist,
    FeaturedPlaylists,
    NewReleases,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SearchTracks => "search_tracks",
            Operation::SearchAll => "search_all",
            Operation::Album => "album",
            Operation::Artist => "artist",
            Operation::FeaturedPlaylists => "featured_playlists",
            Operation::NewReleases => "new_releases",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single catalog read produced no value.
#[derive(Debug, thiserror::Error)]
pub enum CatalogFetchError {
    #[error("Not authorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Catalog returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

/// Port trait wrapping the catalog capabilities used by business logic.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
/// Queries are passed through unvalidated; callers reject blank input first.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogPort: Send + Sync {
    /// Resolves once the catalog holds a usable credential.
    async fn ready(&self) -> Result<(), AuthError>;

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogFetchError>;

    async fn search_all(&self, query: &str) -> Result<SearchResult, CatalogFetchError>;

    async fn album(&self, id: &str) -> Result<Album, CatalogFetchError>;

    async fn artist(&self, id: &str) -> Result<Artist, CatalogFetchError>;

    async fn featured_playlists(&self) -> Result<Vec<Album>, CatalogFetchError>;

    async fn new_releases(&self) -> Result<Vec<Album>, CatalogFetchError>;
}
