//! État partagé entre la boucle de polling et les routes HTTP
//!
//! Un seul verrou protège tout l'état ; il n'est jamais tenu pendant un
//! appel réseau ([`StateStore::with`] prend une closure synchrone). Les
//! écritures concurrentes du polling et des commandes se résolvent au
//! dernier écrivain : le service reste la source de vérité et le prochain
//! polling corrige les écarts.

use crate::accumulator::Accumulator;
use crate::clock::ProgressClock;
use crate::config_ext::ControlSettings;
use crate::openapi::DeckStates;
use crate::track_change::TrackChangeGate;
use deckspotify::{PlaybackSnapshot, TrackSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Variante actuellement affichée
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Blank,
    NowPlaying,
    NoTrack,
    Login,
    Error,
    RateLimited,
}

#[derive(Debug)]
pub struct UiState {
    /// Morceau courant, remplacé d'un bloc à chaque observation
    pub track: Option<Arc<TrackSnapshot>>,
    pub is_playing: bool,
    pub is_liked: bool,
    liked_track_id: Option<String>,
    pub shuffle: bool,
    pub device_id: Option<String>,

    pub volume: Accumulator,
    pub last_unmuted_volume: Option<u8>,
    pub seek: Accumulator,
    pub track_change: TrackChangeGate,
    pub clock: Option<ProgressClock>,

    pub display: DisplayMode,
    pub needs_login: bool,
    pub rate_limited_until: Option<Instant>,
    pub last_poll: Option<Instant>,
    pub refresh_rate: Duration,
}

impl UiState {
    pub fn new(settings: &ControlSettings) -> Self {
        Self {
            track: None,
            is_playing: false,
            is_liked: false,
            liked_track_id: None,
            shuffle: false,
            device_id: None,
            volume: Accumulator::new(
                settings.volume_apply_interval,
                settings.volume_refresh_interval,
            ),
            last_unmuted_volume: None,
            seek: Accumulator::new(settings.seek_apply_interval, settings.seek_refresh_interval),
            track_change: TrackChangeGate::new(
                settings.track_change_ignore,
                settings.track_change_same_direction,
            ),
            clock: None,
            display: DisplayMode::Blank,
            needs_login: true,
            rate_limited_until: None,
            last_poll: None,
            refresh_rate: settings.paused_refresh,
        }
    }

    /// Intègre une observation du service
    ///
    /// Retourne `true` si le morceau a changé.
    pub fn apply_playback(&mut self, playback: &PlaybackSnapshot, now: Instant) -> bool {
        let Some(track) = playback.track.as_ref() else {
            self.clear_track();
            return false;
        };

        let changed = self.track.as_ref().map(|t| t.id.as_str()) != Some(track.id.as_str());
        if changed {
            self.seek.invalidate();
        }
        if self.liked_track_id.as_deref() != Some(track.id.as_str()) {
            self.liked_track_id = None;
            self.is_liked = false;
        }

        self.track = Some(Arc::new(track.clone()));
        self.is_playing = playback.is_playing;
        self.shuffle = playback.shuffle;
        self.clock = Some(ProgressClock::new(
            track.progress_ms,
            track.duration_ms,
            playback.is_playing,
            now,
        ));

        if let Some(device) = &playback.device {
            self.device_id = device.id.clone();
            if let Some(volume) = device.volume_percent {
                self.volume.observe(volume as i64);
                if volume > 0 {
                    self.last_unmuted_volume = Some(volume);
                }
            }
        }

        changed
    }

    pub fn clear_track(&mut self) {
        self.track = None;
        self.is_playing = false;
        self.is_liked = false;
        self.liked_track_id = None;
        self.clock = None;
        self.seek.invalidate();
    }

    /// Statut "j'aime" déjà connu pour ce morceau
    pub fn liked_for(&self, track_id: &str) -> Option<bool> {
        (self.liked_track_id.as_deref() == Some(track_id)).then_some(self.is_liked)
    }

    pub fn set_liked(&mut self, track_id: &str, liked: bool) {
        // Réponse arrivée après un changement de morceau : sans objet
        if self.track.as_ref().is_some_and(|t| t.id != track_id) {
            return;
        }
        self.liked_track_id = Some(track_id.to_string());
        self.is_liked = liked;
    }

    /// Bascule optimiste lecture/pause
    ///
    /// La pause fige l'horloge de progression, la reprise la réancre.
    pub fn set_playing(&mut self, playing: bool, now: Instant) {
        self.is_playing = playing;
        self.track = self
            .track
            .as_ref()
            .map(|t| Arc::new(t.with_playing(playing)));
        if let Some(clock) = self.clock.as_mut() {
            if playing {
                clock.resume(now);
            } else {
                clock.freeze(now);
            }
        }
    }

    pub fn volume(&self) -> Option<u8> {
        self.volume.current().map(|v| v.clamp(0, 100) as u8)
    }

    pub fn states(&self) -> DeckStates {
        DeckStates {
            is_playing: self.is_playing,
            is_liked: self.is_liked,
            is_shuffle: self.shuffle,
            is_muted: self.volume() == Some(0),
        }
    }

    pub fn is_rate_limited(&self, now: Instant) -> bool {
        self.rate_limited_until.is_some_and(|until| now < until)
    }
}

/// Poignée partagée sur [`UiState`]
pub struct StateStore {
    inner: Mutex<UiState>,
}

impl StateStore {
    pub fn new(settings: &ControlSettings) -> Self {
        Self {
            inner: Mutex::new(UiState::new(settings)),
        }
    }

    /// Exécute `f` sous le verrou
    pub fn with<R>(&self, f: impl FnOnce(&mut UiState) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn states(&self) -> DeckStates {
        self.inner.lock().states()
    }

    pub fn track(&self) -> Option<Arc<TrackSnapshot>> {
        self.inner.lock().track.clone()
    }
}
