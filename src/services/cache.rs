use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::{Album, Artist, SearchResult, Track};
use crate::ports::catalog::Operation;

/// Identifies one memoized call: the operation plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: Operation,
    args: Vec<String>,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operation, self.args.join(","))
    }
}

/// Derive the cache key for `operation` called with `args`.
pub fn cache_key(operation: Operation, args: &[&str]) -> CacheKey {
    CacheKey {
        operation,
        args: args.iter().map(|arg| arg.to_string()).collect(),
    }
}

/// Snapshot of a successful catalog result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Tracks(Vec<Track>),
    Search(SearchResult),
    Album(Album),
    Artist(Artist),
    Albums(Vec<Album>),
}

pub trait Cacheable: Clone + Sized {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

impl Cacheable for Vec<Track> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Tracks(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Tracks(tracks) => Some(tracks),
            _ => None,
        }
    }
}

impl Cacheable for SearchResult {
    fn into_cached(self) -> CachedValue {
        CachedValue::Search(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Search(result) => Some(result),
            _ => None,
        }
    }
}

impl Cacheable for Album {
    fn into_cached(self) -> CachedValue {
        CachedValue::Album(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Album(album) => Some(album),
            _ => None,
        }
    }
}

impl Cacheable for Artist {
    fn into_cached(self) -> CachedValue {
        CachedValue::Artist(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Artist(artist) => Some(artist),
            _ => None,
        }
    }
}

impl Cacheable for Vec<Album> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Albums(self)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Albums(albums) => Some(albums),
            _ => None,
        }
    }
}

/// Bounds for the result cache. The default is unbounded with no expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Evict the oldest insertion once this many entries are held
    pub max_entries: Option<usize>,
    /// Entries older than this are treated as misses
    pub ttl: Option<Duration>,
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    inserted_at: Instant,
}

/// In-memory memo of catalog results, only invalidated by [`ResultCache::clear`]
/// unless a bounding [`CachePolicy`] is configured.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    policy: CachePolicy,
}

impl ResultCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Returns an independent copy of the stored value.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if let Some(ttl) = self.policy.ttl {
            if entry.inserted_at.elapsed() >= ttl {
                return None;
            }
        }
        Some(entry.value.clone())
    }

    pub async fn put(&self, key: CacheKey, value: CachedValue) {
        let mut entries = self.entries.write().await;

        if let Some(max_entries) = self.policy.max_entries {
            if max_entries == 0 {
                return;
            }
            if !entries.contains_key(&key) && entries.len() >= max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    tracing::debug!(key = %oldest, "Evicting cached result");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
