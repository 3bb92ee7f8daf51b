//! Module d'authentification pour l'API Spotify
//!
//! Le flux OAuth interactif n'est pas géré ici : on part d'un refresh token
//! déjà obtenu et on l'échange contre des access tokens de courte durée.

use crate::error::{Result, SpotifyError};
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Marge avant expiration en deçà de laquelle on rafraîchit
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Credentials applicatifs + refresh token utilisateur
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Réponse de l'endpoint /api/token
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

struct TokenState {
    credentials: Option<Credentials>,
    cached: Option<CachedToken>,
}

/// Fournit un access token valide, rafraîchi à la demande
pub struct TokenProvider {
    http: Client,
    accounts_base_url: String,
    state: Mutex<TokenState>,
}

impl TokenProvider {
    pub fn new(http: Client, accounts_base_url: &str, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            accounts_base_url: accounts_base_url.trim_end_matches('/').to_string(),
            state: Mutex::new(TokenState {
                credentials,
                cached: None,
            }),
        }
    }

    /// Vérifie si des credentials sont disponibles
    pub async fn has_credentials(&self) -> bool {
        self.state.lock().await.credentials.is_some()
    }

    /// Retourne un access token valide
    ///
    /// Le token en cache est réutilisé jusqu'à 30 s de son expiration.
    ///
    /// # Errors
    ///
    /// * `SpotifyError::NotLoggedIn` - Aucun credential configuré
    /// * `SpotifyError::Unauthorized` - Refresh token refusé
    pub async fn access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(cached) = &state.cached {
            if Instant::now() + EXPIRY_MARGIN < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        let Some(credentials) = state.credentials.clone() else {
            return Err(SpotifyError::NotLoggedIn);
        };

        let token = self.refresh(&credentials).await?;
        debug!("Access token refreshed, valid for {}s", token.expires_in);

        if let Some(rotated) = token.refresh_token {
            if rotated != credentials.refresh_token {
                info!("Spotify rotated the refresh token");
                if let Some(c) = state.credentials.as_mut() {
                    c.refresh_token = rotated;
                }
            }
        }

        state.cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(token.access_token)
    }

    /// Oublie le token en cache (après un 401 de l'API)
    pub async fn invalidate(&self) {
        self.state.lock().await.cached = None;
    }

    /// Refresh token courant (éventuellement renouvelé par Spotify)
    pub async fn refresh_token(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .credentials
            .as_ref()
            .map(|c| c.refresh_token.clone())
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<TokenResponse> {
        let url = format!("{}/api/token", self.accounts_base_url);
        let basic = STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ));

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Basic {}", basic))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Token refresh failed ({}): {}", code, body);
            return Err(match code {
                // invalid_grant / invalid_client
                400 | 401 => SpotifyError::Unauthorized(body),
                _ => SpotifyError::from_status_code(code, None, &body),
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials() {
        let provider = TokenProvider::new(Client::new(), "http://127.0.0.1:9", None);
        assert!(!provider.has_credentials().await);
        assert!(matches!(
            provider.access_token().await,
            Err(SpotifyError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let c = Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
        };
        let dbg = format!("{:?}", c);
        assert!(dbg.contains("id"));
        assert!(!dbg.contains("secret"));
        assert!(!dbg.contains("refresh"));
    }
}
