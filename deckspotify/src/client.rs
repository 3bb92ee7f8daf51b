//! Client principal de l'API Web Spotify
//!
//! Chaque appel part avec un timeout borné et **sans retry** : un échec
//! remonte sous forme de `SpotifyError` classifiée et sera observé au tick
//! suivant par l'appelant.

use crate::auth::TokenProvider;
use crate::config_ext::{SpotifyConfigExt, SpotifySettings};
use crate::error::{Result, SpotifyError};
use crate::models::{Device, PlaybackSnapshot, RawDevices, RawPlayback, UserProfile};
use crate::PlaybackApi;
use async_trait::async_trait;
use deckconfig::get_config;
use reqwest::header::{CONTENT_LENGTH, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Client Spotify
pub struct SpotifyClient {
    http: Client,
    api_base_url: String,
    tokens: TokenProvider,
}

impl SpotifyClient {
    /// Crée un client depuis des paramètres explicites
    pub fn new(settings: SpotifySettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        let tokens = TokenProvider::new(
            http.clone(),
            &settings.accounts_base_url,
            settings.credentials,
        );

        Ok(Self {
            http,
            api_base_url: settings.api_base_url,
            tokens,
        })
    }

    /// Crée un client depuis la configuration globale
    pub fn from_config() -> Result<Self> {
        Self::new(get_config().get_spotify_settings())
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Effectue une requête authentifiée ; `None` pour une réponse vide (204)
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Option<String>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.api_base_url, endpoint);

        debug!("{} {} with {} params", method, url, query.len());

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .query(query);

        request = match body {
            Some(body) => request.json(&body),
            // Spotify exige un Content-Length sur les PUT/POST sans corps
            None if method != Method::GET => request.header(CONTENT_LENGTH, "0"),
            None => request,
        };

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Traite la réponse HTTP
    async fn handle_response(&self, response: Response) -> Result<Option<String>> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status.as_u16(), body);

            if status == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            return Err(SpotifyError::from_status_code(
                status.as_u16(),
                retry_after,
                &body,
            ));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        match self.send(Method::GET, endpoint, query, None).await? {
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                warn!("Failed to parse response: {}", e);
                SpotifyError::JsonParse(e)
            }),
            None => Ok(None),
        }
    }

    async fn command(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<()> {
        self.send(method, endpoint, query, body).await.map(|_| ())
    }
}

fn device_query(device_id: Option<&str>) -> Vec<(&'static str, String)> {
    device_id
        .map(|id| vec![("device_id", id.to_string())])
        .unwrap_or_default()
}

#[async_trait]
impl PlaybackApi for SpotifyClient {
    async fn authenticate(&self) -> Result<UserProfile> {
        self.get_json::<UserProfile>("/me", &[])
            .await?
            .ok_or_else(|| SpotifyError::ApiError {
                code: 204,
                message: "empty profile".to_string(),
            })
    }

    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>> {
        Ok(self
            .get_json::<RawPlayback>("/me/player", &[])
            .await?
            .map(PlaybackSnapshot::from))
    }

    async fn resume(&self, device_id: Option<&str>) -> Result<()> {
        self.command(Method::PUT, "/me/player/play", &device_query(device_id), None)
            .await
    }

    async fn start_context(&self, context_uri: &str, device_id: Option<&str>) -> Result<()> {
        self.command(
            Method::PUT,
            "/me/player/play",
            &device_query(device_id),
            Some(json!({ "context_uri": context_uri })),
        )
        .await
    }

    async fn pause(&self) -> Result<()> {
        self.command(Method::PUT, "/me/player/pause", &[], None).await
    }

    async fn next_track(&self) -> Result<()> {
        self.command(Method::POST, "/me/player/next", &[], None).await
    }

    async fn previous_track(&self) -> Result<()> {
        self.command(Method::POST, "/me/player/previous", &[], None)
            .await
    }

    async fn set_volume(&self, percent: u8) -> Result<()> {
        self.command(
            Method::PUT,
            "/me/player/volume",
            &[("volume_percent", percent.min(100).to_string())],
            None,
        )
        .await
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        self.command(
            Method::PUT,
            "/me/player/seek",
            &[("position_ms", position_ms.to_string())],
            None,
        )
        .await
    }

    async fn set_shuffle(&self, state: bool) -> Result<()> {
        self.command(
            Method::PUT,
            "/me/player/shuffle",
            &[("state", state.to_string())],
            None,
        )
        .await
    }

    async fn is_saved(&self, track_id: &str) -> Result<bool> {
        let flags: Option<Vec<bool>> = self
            .get_json("/me/tracks/contains", &[("ids", track_id.to_string())])
            .await?;
        Ok(flags.and_then(|f| f.first().copied()).unwrap_or(false))
    }

    async fn save_track(&self, track_id: &str) -> Result<()> {
        self.command(
            Method::PUT,
            "/me/tracks",
            &[("ids", track_id.to_string())],
            None,
        )
        .await
    }

    async fn remove_track(&self, track_id: &str) -> Result<()> {
        self.command(
            Method::DELETE,
            "/me/tracks",
            &[("ids", track_id.to_string())],
            None,
        )
        .await
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        let raw: Option<RawDevices> = self.get_json("/me/player/devices", &[]).await?;
        Ok(raw
            .map(|r| r.devices.into_iter().map(Device::from).collect())
            .unwrap_or_default())
    }
}
