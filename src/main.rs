use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use music_catalog::{
    clock::SystemClock,
    config::Config,
    logging::init_tracing,
    ports::catalog::CatalogPort,
    services::{cache::ResultCache, music::MusicService, spotify::client::SpotifyHttpAdapter},
    spotify_rs::{
        auth::{AuthError, CredentialManager},
        client::SpotifyApi,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Spotify application client id (overrides the config file)
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    client_id: Option<String>,

    /// Spotify application client secret (overrides the config file)
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Log filter, e.g. `info` or `music_catalog=debug`
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for tracks
    Search { query: String },
    /// Search for tracks, albums and artists at once
    SearchAll { query: String },
    /// Show an album with its track listing
    Album { id: String },
    /// Show an artist
    Artist { id: String },
    /// List featured playlists
    Featured,
    /// List new album releases
    NewReleases,
    /// Read commands from stdin, sharing one result cache
    Shell,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the path to the config file
    Path,
}

enum Request {
    SearchTracks(String),
    SearchAll(String),
    Album(String),
    Artist(String),
    FeaturedPlaylists,
    NewReleases,
}

impl Request {
    fn from_shell(command: &str, argument: &str) -> Option<Self> {
        let argument = argument.to_string();
        match command {
            "search" => Some(Request::SearchTracks(argument)),
            "search-all" => Some(Request::SearchAll(argument)),
            "album" if !argument.is_empty() => Some(Request::Album(argument)),
            "artist" if !argument.is_empty() => Some(Request::Artist(argument)),
            "featured" => Some(Request::FeaturedPlaylists),
            "new-releases" => Some(Request::NewReleases),
            _ => None,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_request<C: CatalogPort>(service: &MusicService<C>, request: Request) -> Result<()> {
    match request {
        Request::SearchTracks(query) => print_json(&service.search_tracks(&query).await),
        Request::SearchAll(query) => print_json(&service.search_all(&query).await),
        Request::Album(id) => print_json(&service.album(&id).await),
        Request::Artist(id) => print_json(&service.artist(&id).await),
        Request::FeaturedPlaylists => print_json(&service.featured_playlists().await),
        Request::NewReleases => print_json(&service.new_releases().await),
    }
}

async fn run_shell<C: CatalogPort>(service: &MusicService<C>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map(|(command, argument)| (command, argument.trim()))
            .unwrap_or((line, ""));

        match command {
            "exit" | "quit" => break,
            "clear-cache" => service.clear_cache().await,
            _ => match Request::from_shell(command, argument) {
                Some(request) => run_request(service, request).await?,
                None => eprintln!(
                    "Unknown command `{line}`. Try: search <q>, search-all <q>, album <id>, artist <id>, featured, new-releases, clear-cache, exit"
                ),
            },
        }
    }

    Ok(())
}

fn build_service(config: &Config) -> Result<MusicService<SpotifyHttpAdapter>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("music-catalog/", env!("CARGO_PKG_VERSION")))
        .build()
        .wrap_err("Failed to build http client")?;

    let credentials = Arc::new(CredentialManager::new(
        client.clone(),
        config.spotify.auth_url.clone(),
        config.client_credentials()?,
        Arc::new(SystemClock),
    ));
    let adapter = SpotifyHttpAdapter::new(SpotifyApi::new(client, &config.spotify.api_url), credentials);

    Ok(MusicService::new(
        adapter,
        ResultCache::new(config.cache.policy()?),
    ))
}

/// Wait for the first credential. Transient failures are retried here; a rejected
/// client id/secret is not.
async fn wait_until_ready<C: CatalogPort>(service: &MusicService<C>) -> Result<()> {
    (|| async { service.ready().await })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(3),
        )
        .when(|error| {
            !matches!(error, AuthError::Rejected { status, .. } if (400..500).contains(status))
        })
        .notify(|error, delay| tracing::warn!(%error, ?delay, "Catalog not ready, retrying"))
        .await
        .wrap_err("Failed to authenticate with Spotify")
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    if let Commands::Config(ConfigCommands::Path) = args.command {
        match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No default config path found"),
        }
        return Ok(());
    }

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load music-catalog config")?
    .with_client_credentials(args.client_id, args.client_secret);

    let service = build_service(&config)?;
    wait_until_ready(&service).await?;
    tracing::debug!("Catalog ready");

    match args.command {
        Commands::Search { query } => run_request(&service, Request::SearchTracks(query)).await?,
        Commands::SearchAll { query } => run_request(&service, Request::SearchAll(query)).await?,
        Commands::Album { id } => run_request(&service, Request::Album(id)).await?,
        Commands::Artist { id } => run_request(&service, Request::Artist(id)).await?,
        Commands::Featured => run_request(&service, Request::FeaturedPlaylists).await?,
        Commands::NewReleases => run_request(&service, Request::NewReleases).await?,
        Commands::Shell => run_shell(&service).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}
