use axum::http::StatusCode;
use deckspotify::SpotifyError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeckError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),
    #[error("Authentication failed: {0}")]
    AuthFailure(String),
    #[error("No active playback")]
    NoActivePlayback,
    #[error("No track currently playing")]
    NoTrackPlaying,
    #[error("Spotify Premium required: {0}")]
    PremiumRequired(String),
    #[error("{0}")]
    UpstreamTransient(String),
    #[error("{0}")]
    MalformedRequest(String),
}

impl DeckError {
    pub fn malformed(message: &str) -> Self {
        DeckError::MalformedRequest(message.to_string())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        DeckError::UpstreamTransient(message.into())
    }

    /// Code HTTP renvoyé par les routes de commande
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeckError::MalformedRequest(_)
            | DeckError::NoActivePlayback
            | DeckError::NoTrackPlaying => StatusCode::BAD_REQUEST,
            DeckError::PremiumRequired(_) => StatusCode::FORBIDDEN,
            DeckError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            DeckError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            DeckError::UpstreamTransient(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SpotifyError> for DeckError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::RateLimited { retry_after } => DeckError::RateLimited(retry_after),
            SpotifyError::Unauthorized(msg) => DeckError::AuthFailure(msg),
            SpotifyError::NotLoggedIn => {
                DeckError::AuthFailure(SpotifyError::NotLoggedIn.to_string())
            }
            SpotifyError::PremiumRequired(msg) => DeckError::PremiumRequired(msg),
            SpotifyError::NoActiveDevice(_) => DeckError::NoActivePlayback,
            other => DeckError::UpstreamTransient(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotify_errors_are_classified() {
        assert_eq!(
            DeckError::from(SpotifyError::RateLimited { retry_after: 30 }),
            DeckError::RateLimited(30)
        );
        assert!(matches!(
            DeckError::from(SpotifyError::NotLoggedIn),
            DeckError::AuthFailure(_)
        ));
        assert_eq!(
            DeckError::from(SpotifyError::NoActiveDevice("x".into())),
            DeckError::NoActivePlayback
        );
        assert!(matches!(
            DeckError::from(SpotifyError::ApiError {
                code: 502,
                message: "bad gateway".into()
            }),
            DeckError::UpstreamTransient(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DeckError::malformed("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            DeckError::PremiumRequired("shuffle".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            DeckError::transient("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
