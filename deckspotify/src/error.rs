//! Gestion des erreurs pour le client Spotify

use serde::Deserialize;
use thiserror::Error;

/// Type Result personnalisé pour deckspotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Délai appliqué quand un 429 n'annonce pas de `Retry-After`
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Erreurs possibles lors de l'utilisation de l'API Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Quota dépassé (HTTP 429)
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Token refusé ou révoqué (HTTP 401, ou grant invalide)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Aucun credential configuré : rien à rafraîchir
    #[error("Not logged in to Spotify")]
    NotLoggedIn,

    /// Action réservée aux comptes Premium
    #[error("Spotify Premium required: {0}")]
    PremiumRequired(String),

    /// Aucun appareil actif pour exécuter la commande
    #[error("No active device: {0}")]
    NoActiveDevice(String),

    /// Ressource non trouvée
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erreur de l'API Spotify
    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Erreur HTTP (connexion, timeout...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Corps d'erreur standard de l'API Web :
/// `{"error": {"status": 403, "message": "...", "reason": "PREMIUM_REQUIRED"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: Option<String>,
}

impl SpotifyError {
    /// Crée une erreur depuis un code de statut HTTP, l'en-tête `Retry-After`
    /// éventuel et le corps de la réponse
    pub fn from_status_code(code: u16, retry_after: Option<u64>, body: &str) -> Self {
        let (message, reason) = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => (envelope.error.message, envelope.error.reason),
            Err(_) => (body.trim().to_string(), None),
        };

        match (code, reason.as_deref()) {
            (429, _) => Self::RateLimited {
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            (401, _) => Self::Unauthorized(message),
            (_, Some("PREMIUM_REQUIRED")) => Self::PremiumRequired(message),
            (_, Some("NO_ACTIVE_DEVICE")) => Self::NoActiveDevice(message),
            (404, _) if message.to_lowercase().contains("no active device") => {
                Self::NoActiveDevice(message)
            }
            (404, _) => Self::NotFound(message),
            _ => Self::ApiError { code, message },
        }
    }

    /// Vérifie si l'erreur impose une (ré)authentification
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::Unauthorized(_) | SpotifyError::NotLoggedIn)
    }

    /// Vérifie si l'erreur est une erreur de rate limiting
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SpotifyError::RateLimited { .. })
    }

    /// Délai d'attente annoncé par le service, si c'est un 429
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            SpotifyError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
