//! Translation from Spotify payloads to the domain model.
//!
//! Absent or empty provider strings fall back to fixed placeholders, and
//! absent collections map to empty ones.

use crate::domain::{Album, Artist, SearchResult, Track};
use crate::spotify_rs::types::{
    SpotifyAlbum, SpotifyArtist, SpotifyArtistRef, SpotifyImage, SpotifyPaging, SpotifyPlaylist,
    SpotifySearchResponse, SpotifyTrack,
};

const UNKNOWN: &str = "Unknown";
const DEFAULT_PLAYLIST_OWNER: &str = "Spotify";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn first_image_url(images: Vec<SpotifyImage>) -> String {
    images
        .into_iter()
        .next()
        .map(|image| image.url)
        .unwrap_or_default()
}

fn first_artist_name(artists: Vec<SpotifyArtistRef>) -> String {
    artists
        .into_iter()
        .next()
        .and_then(|artist| non_empty(artist.name))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn paged<T, U>(page: Option<SpotifyPaging<T>>, map: impl Fn(T) -> U) -> Vec<U> {
    page.map(|page| page.into_items().map(map).collect())
        .unwrap_or_default()
}

pub fn track(item: SpotifyTrack) -> Track {
    let (album, album_cover) = match item.album {
        Some(album) => (
            non_empty(album.name).unwrap_or_else(|| UNKNOWN.to_string()),
            first_image_url(album.images),
        ),
        None => (UNKNOWN.to_string(), String::new()),
    };

    Track {
        id: item.id,
        title: item.name,
        artist: first_artist_name(item.artists),
        album,
        album_cover,
        duration_ms: item.duration_ms,
        preview_url: item.preview_url,
    }
}

/// Map an album from a listing. Tracks are left unset.
pub fn album(item: SpotifyAlbum) -> Album {
    Album {
        id: item.id,
        name: item.name,
        artist: first_artist_name(item.artists),
        cover_image: first_image_url(item.images),
        release_date: item.release_date.unwrap_or_default(),
        total_tracks: item.total_tracks.unwrap_or(0),
        tracks: None,
    }
}

/// Map a full album lookup, carrying its track listing.
pub fn album_with_tracks(mut item: SpotifyAlbum) -> Album {
    let tracks = paged(item.tracks.take(), track);
    Album {
        tracks: Some(tracks),
        ..album(item)
    }
}

/// Playlists are presented as albums owned by their curator.
pub fn playlist_as_album(item: SpotifyPlaylist) -> Album {
    Album {
        id: item.id,
        name: item.name,
        artist: item
            .owner
            .and_then(|owner| non_empty(owner.display_name))
            .unwrap_or_else(|| DEFAULT_PLAYLIST_OWNER.to_string()),
        cover_image: first_image_url(item.images),
        release_date: String::new(),
        total_tracks: item.tracks.and_then(|tracks| tracks.total).unwrap_or(0),
        tracks: None,
    }
}

pub fn artist(item: SpotifyArtist) -> Artist {
    Artist {
        id: item.id,
        name: item.name,
        image: first_image_url(item.images),
        genres: item.genres,
        followers: item.followers.and_then(|followers| followers.total),
    }
}

pub fn tracks(page: Option<SpotifyPaging<SpotifyTrack>>) -> Vec<Track> {
    paged(page, track)
}

pub fn albums(page: Option<SpotifyPaging<SpotifyAlbum>>) -> Vec<Album> {
    paged(page, album)
}

pub fn playlists_as_albums(page: Option<SpotifyPaging<SpotifyPlaylist>>) -> Vec<Album> {
    paged(page, playlist_as_album)
}

pub fn search_result(response: SpotifySearchResponse) -> SearchResult {
    SearchResult {
        tracks: tracks(response.tracks),
        albums: albums(response.albums),
        artists: paged(response.artists, artist),
    }
}
