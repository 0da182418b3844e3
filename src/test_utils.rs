use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use url::Url;
use wiremock::MockServer;

use crate::clock::Clock;
use crate::services::spotify::client::SpotifyHttpAdapter;
use crate::spotify_rs::auth::{ClientCredentials, CredentialManager};
use crate::spotify_rs::client::SpotifyApi;

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn token_body(access_token: &str, expires_in: u64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Credential manager pointed at `{server}/api/token`.
pub fn credential_manager(server: &MockServer, clock: Arc<dyn Clock>) -> CredentialManager {
    CredentialManager::new(
        reqwest::Client::new(),
        Url::parse(&format!("{}/api/token", server.uri())).unwrap(),
        ClientCredentials::new("client-id".to_string(), "client-secret".to_string()),
        clock,
    )
}

/// Adapter using `{server}/api/token` for auth and `{server}/v1` as API base.
pub fn spotify_adapter(server: &MockServer, clock: Arc<dyn Clock>) -> SpotifyHttpAdapter {
    let api_url = Url::parse(&format!("{}/v1", server.uri())).unwrap();
    SpotifyHttpAdapter::new(
        SpotifyApi::new(reqwest::Client::new(), &api_url),
        Arc::new(credential_manager(server, clock)),
    )
}
