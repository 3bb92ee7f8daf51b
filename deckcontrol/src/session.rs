//! Session du Stream Deck : état, client Spotify et rendu
//!
//! La session relit l'état de lecture, classe les erreurs du service et
//! produit l'image correspondante. Les téléchargements de pochettes et les
//! appels au service se font hors de tout verrou ; seul le remplacement
//! final du jeu d'images est verrouillé. Le rendu du morceau courant, relancé
//! à chaque tour, tourne sur le pool bloquant de tokio.

use crate::config_ext::ControlSettings;
use crate::state::{DisplayMode, StateStore};
use deckrender::{AlbumArtCache, ImageStore, NowPlaying, RenderEngine, RenderedImageSet};
use deckspotify::{PlaybackApi, SpotifyError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Classement d'une relecture de l'état de lecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Normal,
    NoTrack,
    AuthError,
    RateLimited(u64),
    OtherError(String),
}

pub struct DeckSession {
    api: Arc<dyn PlaybackApi>,
    state: StateStore,
    engine: Arc<RenderEngine>,
    art: AlbumArtCache,
    images: ImageStore,
    settings: ControlSettings,
}

impl DeckSession {
    pub fn new(
        api: Arc<dyn PlaybackApi>,
        engine: RenderEngine,
        art: AlbumArtCache,
        settings: ControlSettings,
    ) -> Self {
        Self {
            api,
            state: StateStore::new(&settings),
            engine: Arc::new(engine),
            art,
            images: ImageStore::new(),
            settings,
        }
    }

    pub fn api(&self) -> &Arc<dyn PlaybackApi> {
        &self.api
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    /// Vérifie la session Spotify
    ///
    /// En cas d'échec l'image de connexion (ou d'erreur) reste affichée.
    pub async fn authenticate(&self) -> bool {
        match self.api.authenticate().await {
            Ok(profile) => {
                info!(
                    "👤 Logged in as {} ({})",
                    profile.display_name.as_deref().unwrap_or(&profile.id),
                    profile.product.as_deref().unwrap_or("unknown plan")
                );
                self.state.with(|s| s.needs_login = false);
                true
            }
            Err(e) => {
                self.handle_error(e, Instant::now());
                false
            }
        }
    }

    /// Relit l'état de lecture et met l'affichage à jour
    pub async fn refresh_track(&self, now: Instant) -> PollOutcome {
        let playback = match self.api.current_playback().await {
            Ok(playback) => playback,
            Err(e) => return self.handle_error(e, now),
        };

        let Some(playback) = playback.filter(|p| p.track.is_some()) else {
            self.state.with(|s| {
                s.clear_track();
                s.display = DisplayMode::NoTrack;
                s.rate_limited_until = None;
            });
            self.publish(self.engine.render_no_track());
            return PollOutcome::NoTrack;
        };

        let (changed, track) = self.state.with(|s| {
            let changed = s.apply_playback(&playback, now);
            s.display = DisplayMode::NowPlaying;
            s.needs_login = false;
            s.rate_limited_until = None;
            (changed, s.track.clone())
        });

        if let Some(track) = track {
            if changed {
                info!("🎵 Now playing: {} - {}", track.name, track.artists);
            }
            self.refresh_liked(&track.id).await;
        }

        self.render_now_playing(now).await;
        PollOutcome::Normal
    }

    /// Statut "j'aime", relu une seule fois par morceau
    async fn refresh_liked(&self, track_id: &str) {
        if self.state.with(|s| s.liked_for(track_id)).is_some() {
            return;
        }
        match self.api.is_saved(track_id).await {
            Ok(liked) => self.state.with(|s| s.set_liked(track_id, liked)),
            Err(e) => warn!("Cannot read like status for {}: {}", track_id, e),
        }
    }

    /// Rend le morceau courant avec la progression extrapolée à `now`
    pub async fn render_now_playing(&self, now: Instant) {
        let Some((track, is_playing, is_liked, progress)) = self.state.with(|s| {
            let track = s.track.clone()?;
            let progress = s.clock.as_ref().and_then(|c| c.progress(now));
            Some((track, s.is_playing, s.is_liked, progress))
        }) else {
            return;
        };

        let art = self.art.fetch_or_placeholder(track.art_url.as_deref()).await;
        trace!("Rendering {:?} at {:?}", track.name, progress);

        let engine = self.engine.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            let view = NowPlaying {
                track: track.as_ref(),
                is_playing,
                is_liked,
                progress,
                art: art.as_deref(),
            };
            engine.render_now_playing(&view)
        })
        .await;

        match rendered {
            Ok(rendered) => self.publish(rendered),
            Err(e) => error!("💥 Rendering task failed: {}", e),
        }
    }

    /// Classe une erreur du service et affiche l'image correspondante
    pub fn handle_error(&self, err: SpotifyError, now: Instant) -> PollOutcome {
        if err.is_auth_error() {
            let already = self.state.with(|s| {
                s.needs_login = true;
                std::mem::replace(&mut s.display, DisplayMode::Login) == DisplayMode::Login
            });
            if already {
                debug!("Still not logged in: {}", err);
            } else {
                warn!("🔑 Spotify session unavailable: {}", err);
            }
            self.publish(self.engine.render_login());
            return PollOutcome::AuthError;
        }

        if let Some(retry_after) = err.retry_after() {
            warn!("⏳ Rate limited by Spotify, retry after {}s", retry_after);
            self.state.with(|s| {
                s.display = DisplayMode::RateLimited;
                s.rate_limited_until = Some(now + Duration::from_secs(retry_after));
            });
            self.publish(self.engine.render_rate_limit(retry_after));
            return PollOutcome::RateLimited(retry_after);
        }

        let message = err.to_string();
        warn!("Spotify request failed: {}", message);
        self.state.with(|s| s.display = DisplayMode::Error);
        self.publish(self.engine.render_error(&message));
        PollOutcome::OtherError(message)
    }

    fn publish(&self, rendered: deckrender::Result<RenderedImageSet>) {
        match rendered {
            Ok(set) => self.images.replace(set),
            Err(e) => error!("Rendering failed: {}", e),
        }
    }
}
