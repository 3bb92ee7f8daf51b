#![allow(dead_code)]

use async_trait::async_trait;
use deckcontrol::{ActionCoalescer, ControlSettings, DeckSession, Worker};
use deckrender::{AlbumArtCache, FontBook, RenderEngine};
use deckspotify::{
    Device, PlaybackApi, PlaybackSnapshot, Result, SpotifyError, TrackSnapshot, UserProfile,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Faux client Spotify qui enregistre chaque appel
#[derive(Default)]
pub struct FakeApi {
    pub playback: Mutex<Option<PlaybackSnapshot>>,
    pub calls: Mutex<Vec<String>>,
    pub saved: Mutex<HashSet<String>>,
    pub devices: Mutex<Vec<Device>>,
    pub logged_in: Mutex<bool>,
    pub premium: Mutex<bool>,
    /// `resume(None)` répond "no active device"
    pub no_active_device: Mutex<bool>,
    /// Erreur renvoyée (une fois) par le prochain `current_playback`
    pub next_error: Mutex<Option<SpotifyError>>,
    /// Le prochain `current_playback` panique
    pub panic_next: Mutex<bool>,
}

impl FakeApi {
    pub fn new(playback: Option<PlaybackSnapshot>) -> Arc<Self> {
        let api = FakeApi::default();
        *api.playback.lock() = playback;
        *api.logged_in.lock() = true;
        *api.premium.lock() = true;
        Arc::new(api)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl PlaybackApi for FakeApi {
    async fn authenticate(&self) -> Result<UserProfile> {
        self.record("authenticate");
        if !*self.logged_in.lock() {
            return Err(SpotifyError::NotLoggedIn);
        }
        let product = if *self.premium.lock() { "premium" } else { "free" };
        Ok(UserProfile {
            id: "tester".into(),
            display_name: Some("Tester".into()),
            product: Some(product.into()),
        })
    }

    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>> {
        self.record("current_playback");
        if std::mem::take(&mut *self.panic_next.lock()) {
            panic!("current_playback blew up");
        }
        if let Some(err) = self.next_error.lock().take() {
            return Err(err);
        }
        Ok(self.playback.lock().clone())
    }

    async fn resume(&self, device_id: Option<&str>) -> Result<()> {
        self.record(format!("resume:{}", device_id.unwrap_or("-")));
        if device_id.is_none() && *self.no_active_device.lock() {
            return Err(SpotifyError::NoActiveDevice("Player command failed".into()));
        }
        if let Some(p) = self.playback.lock().as_mut() {
            p.is_playing = true;
        }
        Ok(())
    }

    async fn start_context(&self, context_uri: &str, device_id: Option<&str>) -> Result<()> {
        self.record(format!(
            "start_context:{}:{}",
            context_uri,
            device_id.unwrap_or("-")
        ));
        if device_id.is_none() && *self.no_active_device.lock() {
            return Err(SpotifyError::NoActiveDevice("Player command failed".into()));
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record("pause");
        if let Some(p) = self.playback.lock().as_mut() {
            p.is_playing = false;
        }
        Ok(())
    }

    async fn next_track(&self) -> Result<()> {
        self.record("next");
        Ok(())
    }

    async fn previous_track(&self) -> Result<()> {
        self.record("previous");
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> Result<()> {
        self.record(format!("set_volume:{}", percent));
        if let Some(device) = self
            .playback
            .lock()
            .as_mut()
            .and_then(|p| p.device.as_mut())
        {
            device.volume_percent = Some(percent);
        }
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        self.record(format!("seek:{}", position_ms));
        Ok(())
    }

    async fn set_shuffle(&self, state: bool) -> Result<()> {
        if !*self.premium.lock() {
            return Err(SpotifyError::PremiumRequired(
                "Player command failed: Premium required".into(),
            ));
        }
        self.record(format!("shuffle:{}", state));
        Ok(())
    }

    async fn is_saved(&self, track_id: &str) -> Result<bool> {
        self.record(format!("is_saved:{}", track_id));
        Ok(self.saved.lock().contains(track_id))
    }

    async fn save_track(&self, track_id: &str) -> Result<()> {
        self.record(format!("save:{}", track_id));
        self.saved.lock().insert(track_id.to_string());
        Ok(())
    }

    async fn remove_track(&self, track_id: &str) -> Result<()> {
        self.record(format!("remove:{}", track_id));
        self.saved.lock().remove(track_id);
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        self.record("devices");
        Ok(self.devices.lock().clone())
    }
}

pub fn device(id: &str, active: bool, volume: Option<u8>) -> Device {
    Device {
        id: Some(id.into()),
        name: format!("Device {}", id),
        kind: "Computer".into(),
        is_active: active,
        volume_percent: volume,
    }
}

pub fn playing(progress_ms: u64, duration_ms: u64, volume: u8) -> PlaybackSnapshot {
    playback("track-1", progress_ms, duration_ms, true, volume)
}

pub fn playback(
    id: &str,
    progress_ms: u64,
    duration_ms: u64,
    is_playing: bool,
    volume: u8,
) -> PlaybackSnapshot {
    PlaybackSnapshot {
        track: Some(TrackSnapshot {
            id: id.into(),
            name: "Song".into(),
            artists: "Artist".into(),
            art_url: None,
            progress_ms,
            duration_ms,
            is_playing,
        }),
        is_playing,
        shuffle: false,
        device: Some(device("dev1", true, Some(volume))),
    }
}

/// Réglages par défaut sans délai d'attente après les commandes
pub fn settings() -> ControlSettings {
    ControlSettings {
        settle_delay: Duration::ZERO,
        ..ControlSettings::default()
    }
}

pub fn session(api: Arc<FakeApi>, settings: ControlSettings) -> Arc<DeckSession> {
    let engine = RenderEngine::new(FontBook::bitmap_only(), None);
    let art = AlbumArtCache::new(Duration::from_secs(1)).unwrap();
    Arc::new(DeckSession::new(api, engine, art, settings))
}

pub fn coalescer(api: Arc<FakeApi>, settings: ControlSettings) -> ActionCoalescer {
    ActionCoalescer::new(session(api, settings), Worker::start())
}
