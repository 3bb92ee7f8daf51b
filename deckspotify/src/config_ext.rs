//! Extension pour intégrer la configuration Spotify dans deckconfig
//!
//! Les credentials viennent de la section `spotify` du fichier de
//! configuration, ou à défaut des variables d'environnement
//! `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` et `SPOTIFY_REFRESH_TOKEN`
//! (un fichier `.env` peut les fournir).

use crate::auth::Credentials;
use anyhow::Result;
use deckconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Paramètres de connexion à l'API Spotify
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub credentials: Option<Credentials>,
    pub api_base_url: String,
    pub accounts_base_url: String,
    pub request_timeout: Duration,
}

impl SpotifySettings {
    /// Paramètres par défaut pointant vers les URLs données (tests)
    pub fn with_base_urls(api_base_url: &str, accounts_base_url: &str) -> Self {
        Self {
            credentials: None,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            accounts_base_url: accounts_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Trait d'extension pour gérer la configuration Spotify dans deckconfig
pub trait SpotifyConfigExt {
    fn get_spotify_client_id(&self) -> Option<String>;

    fn get_spotify_client_secret(&self) -> Option<String>;

    fn get_spotify_refresh_token(&self) -> Option<String>;

    /// Mémorise un refresh token (rotation côté Spotify)
    fn set_spotify_refresh_token(&self, token: &str) -> Result<()>;

    fn get_spotify_settings(&self) -> SpotifySettings;
}

fn from_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Option<String> {
        self.get_optional_string(&["spotify", "client_id"])
            .or_else(|| from_env("SPOTIFY_CLIENT_ID"))
    }

    fn get_spotify_client_secret(&self) -> Option<String> {
        self.get_optional_string(&["spotify", "client_secret"])
            .or_else(|| from_env("SPOTIFY_CLIENT_SECRET"))
    }

    fn get_spotify_refresh_token(&self) -> Option<String> {
        self.get_optional_string(&["spotify", "refresh_token"])
            .or_else(|| from_env("SPOTIFY_REFRESH_TOKEN"))
    }

    fn set_spotify_refresh_token(&self, token: &str) -> Result<()> {
        self.set_value(
            &["spotify", "refresh_token"],
            Value::String(token.to_string()),
        )
    }

    fn get_spotify_settings(&self) -> SpotifySettings {
        let credentials = match (
            self.get_spotify_client_id(),
            self.get_spotify_client_secret(),
            self.get_spotify_refresh_token(),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(Credentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => {
                tracing::warn!("Spotify credentials incomplete, login required");
                None
            }
        };

        let mut settings = SpotifySettings::with_base_urls(
            &self.get_string(&["spotify", "api_base_url"], DEFAULT_API_BASE_URL),
            &self.get_string(&["spotify", "accounts_base_url"], DEFAULT_ACCOUNTS_BASE_URL),
        );
        settings.credentials = credentials;
        settings.request_timeout = Duration::from_secs(
            self.get_u64(&["spotify", "request_timeout_secs"], DEFAULT_TIMEOUT_SECS)
                .max(1),
        );
        settings
    }
}
