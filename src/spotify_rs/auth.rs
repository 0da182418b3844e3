use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use url::Url;

use crate::clock::Clock;
use crate::spotify_rs::types::SpotifyTokenResponse;

pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Client id and secret of a registered application.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn basic_authorization(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret))
        )
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A bearer token together with the instant it stops being accepted.
///
/// Credentials are replaced wholesale on refresh and never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Valid strictly before `expires_at`, and only with a non-empty token.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to send token request: {0}")]
    FailedToSendRequest(String),
    #[error("Token request rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },
    #[error("Failed to parse token response: {0}")]
    FailedToParseResponse(String),
    #[error("Token endpoint issued a token that had already expired at {expires_at}")]
    ExpiredOnArrival { expires_at: DateTime<Utc> },
}

/// Perform a client-credentials exchange against the token endpoint.
/// https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow
pub async fn request_client_credentials_token(
    client: &reqwest::Client,
    token_url: &Url,
    credentials: &ClientCredentials,
) -> Result<SpotifyTokenResponse, AuthError> {
    let response = client
        .post(token_url.clone())
        // Serializes to x-www-form-urlencoded and sets the content type
        .form(&[("grant_type", "client_credentials")])
        .header("Authorization", credentials.basic_authorization())
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|error| AuthError::FailedToSendRequest(error.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(|error| AuthError::FailedToParseResponse(error.to_string()))?;

    if token_response.access_token.is_empty() {
        return Err(AuthError::FailedToParseResponse(
            "Token endpoint returned an empty access token".to_string(),
        ));
    }

    Ok(token_response)
}

type PendingExchange = Shared<BoxFuture<'static, Result<Credential, AuthError>>>;

enum CredentialSlot {
    Empty,
    /// Every caller arriving during a refresh awaits this same exchange.
    Pending(PendingExchange),
    Ready(Credential),
}

/// Owns the single application credential and refreshes it on demand.
///
/// At most one exchange is in flight at any time. Failures are handed to every
/// waiter of that exchange and are not remembered, so the next call retries.
pub struct CredentialManager {
    client: reqwest::Client,
    token_url: Url,
    credentials: ClientCredentials,
    clock: Arc<dyn Clock>,
    slot: Mutex<CredentialSlot>,
}

impl CredentialManager {
    pub fn new(
        client: reqwest::Client,
        token_url: Url,
        credentials: ClientCredentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            token_url,
            credentials,
            clock,
            slot: Mutex::new(CredentialSlot::Empty),
        }
    }

    /// Return a credential that is valid right now, exchanging for a new one if needed.
    pub async fn valid_credential(&self) -> Result<Credential, AuthError> {
        let exchange = {
            let mut slot = self.slot.lock().await;
            match &*slot {
                CredentialSlot::Ready(credential) if credential.is_valid_at(self.clock.now()) => {
                    tracing::debug!("Reusing access token");
                    return Ok(credential.clone());
                }
                CredentialSlot::Pending(exchange) => {
                    tracing::debug!("Joining in-flight token exchange");
                    exchange.clone()
                }
                CredentialSlot::Empty | CredentialSlot::Ready(_) => {
                    let exchange = self.start_exchange();
                    *slot = CredentialSlot::Pending(exchange.clone());
                    exchange
                }
            }
        };

        let result = exchange
            .clone()
            .await
            .and_then(|credential| self.ensure_valid(credential));
        self.settle(&exchange, &result).await;
        result
    }

    fn start_exchange(&self) -> PendingExchange {
        tracing::info!(client_id = %self.credentials.client_id(), "Requesting access token");

        let client = self.client.clone();
        let token_url = self.token_url.clone();
        let credentials = self.credentials.clone();
        let clock = self.clock.clone();

        async move {
            let response =
                request_client_credentials_token(&client, &token_url, &credentials).await?;
            let lifetime = i64::try_from(response.expires_in)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX);
            let expires_at = clock
                .now()
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            Ok(Credential::new(response.access_token, expires_at))
        }
        .boxed()
        .shared()
    }

    /// Never hand out a credential that is already expired, e.g. one issued with `expires_in: 0`.
    fn ensure_valid(&self, credential: Credential) -> Result<Credential, AuthError> {
        if credential.is_valid_at(self.clock.now()) {
            Ok(credential)
        } else {
            Err(AuthError::ExpiredOnArrival {
                expires_at: credential.expires_at(),
            })
        }
    }

    /// Move the slot out of `Pending`, unless another waiter already did.
    async fn settle(&self, exchange: &PendingExchange, result: &Result<Credential, AuthError>) {
        let mut slot = self.slot.lock().await;
        let is_current = matches!(&*slot, CredentialSlot::Pending(current) if current.ptr_eq(exchange));
        if !is_current {
            return;
        }

        *slot = match result {
            Ok(credential) => {
                tracing::info!(expires_at = %credential.expires_at(), "Access token acquired");
                CredentialSlot::Ready(credential.clone())
            }
            Err(error) => {
                tracing::error!(%error, "Token exchange failed");
                CredentialSlot::Empty
            }
        };
    }
}
