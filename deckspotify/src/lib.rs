//! # deckspotify - Client de l'API Web Spotify pour NowDeck
//!
//! Cette crate encapsule tout ce qui touche au service de streaming :
//!
//! - Rafraîchissement du token OAuth à partir d'un refresh token
//! - Lecture de l'état de lecture et traduction en types forts
//! - Commandes de transport (play/pause/next/previous/seek/volume/shuffle)
//! - Bibliothèque (liker / déliker un morceau) et liste des appareils
//!
//! Le reste de NowDeck ne dépend que du trait [`PlaybackApi`], ce qui permet
//! de brancher un faux client dans les tests.
//!
//! ```rust,no_run
//! use deckspotify::{PlaybackApi, SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpotifyClient::from_config()?;
//!     if let Some(playback) = client.current_playback().await? {
//!         println!("{:?}", playback.track);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;

pub use auth::{Credentials, TokenProvider};
pub use client::SpotifyClient;
pub use config_ext::{SpotifyConfigExt, SpotifySettings};
pub use error::{Result, SpotifyError};
pub use models::{Device, PlaybackSnapshot, TrackSnapshot, UserProfile};

use async_trait::async_trait;

/// Opérations de lecture/commande dont le cœur de NowDeck a besoin
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    /// Vérifie la session (appel léger `GET /me`)
    async fn authenticate(&self) -> Result<UserProfile>;

    /// État de lecture courant ; `None` si rien n'est actif
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>>;

    async fn resume(&self, device_id: Option<&str>) -> Result<()>;

    /// Démarre la lecture d'un contexte (playlist, album...)
    async fn start_context(&self, context_uri: &str, device_id: Option<&str>) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn next_track(&self) -> Result<()>;

    async fn previous_track(&self) -> Result<()>;

    /// Volume de l'appareil actif, 0..=100
    async fn set_volume(&self, percent: u8) -> Result<()>;

    async fn seek(&self, position_ms: u64) -> Result<()>;

    async fn set_shuffle(&self, state: bool) -> Result<()>;

    /// Le morceau est-il dans la bibliothèque de l'utilisateur ?
    async fn is_saved(&self, track_id: &str) -> Result<bool>;

    async fn save_track(&self, track_id: &str) -> Result<()>;

    async fn remove_track(&self, track_id: &str) -> Result<()>;

    async fn devices(&self) -> Result<Vec<Device>>;
}
