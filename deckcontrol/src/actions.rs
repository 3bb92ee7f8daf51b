//! Traduction des événements du Stream Deck en commandes Spotify
//!
//! - cadran gauche : appui = lecture/pause, rotation = morceau suivant/précédent
//! - cadran droit : appui = j'aime, rotation = volume
//! - `/player` : toutes les commandes nommées
//!
//! Le volume et la position sont accumulés (voir [`Accumulator`]) : au plus
//! un appel au service par fenêtre, l'état local suit chaque cran.
//!
//! [`Accumulator`]: crate::accumulator::Accumulator

use crate::accumulator::{Accumulator, FlushDue, NudgeOutcome};
use crate::errors::{DeckError, Result};
use crate::openapi::{ActionRequest, ActionResponse};
use crate::session::DeckSession;
use crate::state::UiState;
use crate::track_change::{Direction, GateDecision};
use crate::worker::Worker;
use deckspotify::{PlaybackApi, SpotifyError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Crans pris en compte par événement ; au-delà la valeur est bornée
const MAX_TICKS: i64 = 100;

/// Nombre de crans d'une rotation, borné (NaN compte pour 0)
fn dial_ticks(value: f64) -> i64 {
    value.round().clamp(-MAX_TICKS as f64, MAX_TICKS as f64) as i64
}

/// Commande à valeur continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Volume,
    Seek,
}

impl Control {
    fn name(self) -> &'static str {
        match self {
            Control::Volume => "volume flush",
            Control::Seek => "seek flush",
        }
    }

    fn accumulator(self, state: &mut UiState) -> &mut Accumulator {
        match self {
            Control::Volume => &mut state.volume,
            Control::Seek => &mut state.seek,
        }
    }

    async fn apply(self, api: &dyn PlaybackApi, value: i64) -> deckspotify::Result<()> {
        match self {
            Control::Volume => api.set_volume(value.clamp(0, 100) as u8).await,
            Control::Seek => api.seek(value.max(0) as u64).await,
        }
    }
}

pub struct ActionCoalescer {
    session: Arc<DeckSession>,
    worker: Worker,
}

impl ActionCoalescer {
    pub fn new(session: Arc<DeckSession>, worker: Worker) -> Self {
        Self { session, worker }
    }

    pub fn session(&self) -> &Arc<DeckSession> {
        &self.session
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    fn api(&self) -> &dyn PlaybackApi {
        self.session.api().as_ref()
    }

    // ========================================================================
    // CADRANS
    // ========================================================================

    /// Cadran gauche : lecture/pause et changement de morceau
    pub async fn handle_left(&self, request: &ActionRequest) -> Result<ActionResponse> {
        match request.action.as_str() {
            "tap" | "dialDown" => self.toggle_playback().await,
            "rotate" => {
                let value = request.value.ok_or_else(|| DeckError::malformed("Missing value"))?;
                match Direction::from_value(value) {
                    Some(direction) => self.change_track(direction, true).await,
                    None => Ok(ActionResponse::ignored("Action ignored")),
                }
            }
            _ => Err(DeckError::malformed("Invalid action")),
        }
    }

    /// Cadran droit : j'aime et volume
    pub async fn handle_right(&self, request: &ActionRequest) -> Result<ActionResponse> {
        match request.action.as_str() {
            "tap" | "dialDown" => self.toggle_like().await,
            "rotate" => {
                let value = request.value.ok_or_else(|| DeckError::malformed("Missing value"))?;
                let delta = dial_ticks(value).saturating_mul(self.session.settings().volume_step);
                self.adjust_volume(delta).await
            }
            _ => Err(DeckError::malformed("Invalid action")),
        }
    }

    /// Commandes nommées de `/player`, suivies d'une relecture de l'état
    pub async fn handle_player(&self, request: &ActionRequest) -> Result<ActionResponse> {
        let settings = self.session.settings();
        let ticks = request.ticks.unwrap_or(1).clamp(-MAX_TICKS, MAX_TICKS);

        let response = match request.action.as_str() {
            "next" => return self.change_track(Direction::Next, false).await,
            "previous" => return self.change_track(Direction::Previous, false).await,
            "playpause" => self.toggle_playback().await?,
            "togglelike" => self.toggle_like().await?,
            "toggleshuffle" => self.toggle_shuffle().await?,
            "volumeup" => self.adjust_volume(ticks.saturating_mul(settings.volume_step)).await?,
            "volumedown" => {
                self.adjust_volume(-ticks.saturating_mul(settings.volume_step))
                    .await?
            }
            "volumemute" => self.toggle_mute().await?,
            "volumeset" => {
                let value = request.value.ok_or_else(|| DeckError::malformed("Missing value"))?;
                self.set_volume(value.round().clamp(0.0, 100.0) as u8).await?
            }
            "startplaylist" => {
                let uri = request
                    .playlist_uri
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| DeckError::malformed("Missing playlistUri"))?;
                self.start_playlist(uri).await?
            }
            "fastforward" | "rewind" => {
                let magnitude = match request.value {
                    Some(secs) => (secs.abs() * 1000.0).round() as i64,
                    None => ticks.abs().saturating_mul(settings.seek_step_ms),
                };
                let delta = if request.action == "rewind" { -magnitude } else { magnitude };
                self.seek_by(delta).await?
            }
            _ => return Err(DeckError::malformed("Invalid action")),
        };

        self.schedule_refresh("refresh after action");
        Ok(response)
    }

    // ========================================================================
    // LECTURE
    // ========================================================================

    /// Bascule lecture/pause
    ///
    /// L'affichage change tout de suite ; la commande part sur le worker.
    pub async fn toggle_playback(&self) -> Result<ActionResponse> {
        let playback = self.api().current_playback().await?;
        let was_playing = playback.as_ref().is_some_and(|p| p.is_playing);

        let now = Instant::now();
        self.session.state().with(|s| s.set_playing(!was_playing, now));
        self.session.render_now_playing(now).await;

        let session = self.session.clone();
        self.worker.submit(
            if was_playing { "pause" } else { "resume" },
            async move {
                if was_playing {
                    session.api().pause().await?;
                } else {
                    resume_or_force(session.api().as_ref(), None).await?;
                }
                tokio::time::sleep(session.settings().settle_delay).await;
                session.refresh_track(Instant::now()).await;
                Ok::<(), DeckError>(())
            },
        );

        info!(
            "{} Playback toggled",
            if was_playing { "⏸️" } else { "▶️" }
        );
        Ok(ActionResponse::success("Playback toggled"))
    }

    /// Morceau suivant ou précédent
    ///
    /// `gated` applique l'anti-rebond de la rotation ; les boutons explicites
    /// passent toujours mais comptent pour les rotations suivantes.
    pub async fn change_track(&self, direction: Direction, gated: bool) -> Result<ActionResponse> {
        let now = Instant::now();
        let decision = self.session.state().with(|s| {
            if gated {
                s.track_change.admit(direction, now)
            } else {
                s.track_change.record(direction, now);
                GateDecision::Allowed
            }
        });

        match decision {
            GateDecision::TooSoon => {
                debug!("Track change ignored (too soon)");
                return Ok(ActionResponse::ignored("Action ignored (too soon)"));
            }
            GateDecision::Ignored => {
                debug!("Track change ignored (same direction)");
                return Ok(ActionResponse::ignored("Action ignored"));
            }
            GateDecision::Allowed => {}
        }

        let message = match direction {
            Direction::Next => {
                self.api().next_track().await?;
                "Skipped to next track"
            }
            Direction::Previous => {
                self.api().previous_track().await?;
                "Returned to previous track"
            }
        };
        info!("⏭️  {}", message);

        tokio::time::sleep(self.session.settings().settle_delay).await;
        self.session.refresh_track(Instant::now()).await;
        Ok(ActionResponse::success(message))
    }

    pub async fn toggle_shuffle(&self) -> Result<ActionResponse> {
        let enable = !self.session.state().with(|s| s.shuffle);
        self.api().set_shuffle(enable).await?;
        self.session.state().with(|s| s.shuffle = enable);
        Ok(ActionResponse::success(if enable {
            "Shuffle enabled"
        } else {
            "Shuffle disabled"
        }))
    }

    pub async fn start_playlist(&self, uri: &str) -> Result<ActionResponse> {
        match self.api().start_context(uri, None).await {
            Ok(()) => {}
            Err(SpotifyError::NoActiveDevice(_)) => {
                force_playback(self.api(), Some(uri)).await?;
            }
            Err(e) => return Err(e.into()),
        }
        info!("📜 Playlist {} started", uri);
        Ok(ActionResponse::success("Playlist started"))
    }

    // ========================================================================
    // BIBLIOTHÈQUE
    // ========================================================================

    pub async fn toggle_like(&self) -> Result<ActionResponse> {
        let track = self.session.state().track().ok_or(DeckError::NoTrackPlaying)?;

        let liked = match self.session.state().with(|s| s.liked_for(&track.id)) {
            Some(liked) => liked,
            None => self.api().is_saved(&track.id).await?,
        };

        if liked {
            self.api().remove_track(&track.id).await?;
        } else {
            self.api().save_track(&track.id).await?;
        }
        self.session.state().with(|s| s.set_liked(&track.id, !liked));
        self.session.render_now_playing(Instant::now()).await;

        let message = if liked { "Unliked track" } else { "Liked track" };
        info!("❤️  {}: {}", message, track.name);
        Ok(ActionResponse::success(message))
    }

    // ========================================================================
    // VOLUME
    // ========================================================================

    /// Relit le volume de l'appareil actif si la valeur locale est périmée
    async fn sync_volume(&self, now: Instant) -> Result<()> {
        if !self.session.state().with(|s| s.volume.needs_refresh(now)) {
            return Ok(());
        }
        let playback = self
            .api()
            .current_playback()
            .await?
            .ok_or(DeckError::NoActivePlayback)?;
        let volume = playback
            .device
            .and_then(|d| d.volume_percent)
            .ok_or(DeckError::NoActivePlayback)?;
        debug!("Volume resynced at {}%", volume);
        self.session.state().with(|s| s.volume.resync(volume as i64, now));
        Ok(())
    }

    pub async fn adjust_volume(&self, delta: i64) -> Result<ActionResponse> {
        let now = Instant::now();
        self.sync_volume(now).await?;

        let outcome = self.session.state().with(|s| {
            let outcome = s.volume.nudge(delta, 0..=100, now);
            if let Some(v) = s.volume().filter(|v| *v > 0) {
                s.last_unmuted_volume = Some(v);
            }
            outcome
        });
        let value = self.settle(Control::Volume, outcome).await?;
        Ok(ActionResponse::success(format!("Volume set to {}%", value)))
    }

    pub async fn set_volume(&self, percent: u8) -> Result<ActionResponse> {
        let now = Instant::now();
        self.session.state().with(|s| {
            s.volume.set(percent as i64, now);
            if percent > 0 {
                s.last_unmuted_volume = Some(percent);
            }
        });
        self.api().set_volume(percent).await?;
        Ok(ActionResponse::success(format!("Volume set to {}%", percent)))
    }

    /// Coupe le son en mémorisant le volume, ou le restaure
    pub async fn toggle_mute(&self) -> Result<ActionResponse> {
        let now = Instant::now();
        self.sync_volume(now).await?;

        let (target, muting) = self.session.state().with(|s| {
            let current = s.volume().unwrap_or(0);
            if current > 0 {
                s.last_unmuted_volume = Some(current);
                (0, true)
            } else {
                let restore = s
                    .last_unmuted_volume
                    .unwrap_or(self.session.settings().default_unmute_volume);
                (restore, false)
            }
        });

        self.session.state().with(|s| s.volume.set(target as i64, now));
        self.api().set_volume(target).await?;

        Ok(ActionResponse::success(if muting {
            "Volume muted".to_string()
        } else {
            format!("Volume restored to {}%", target)
        }))
    }

    // ========================================================================
    // POSITION
    // ========================================================================

    pub async fn seek_by(&self, delta_ms: i64) -> Result<ActionResponse> {
        let now = Instant::now();
        let track = self.session.state().track().ok_or(DeckError::NoTrackPlaying)?;

        if self.session.state().with(|s| s.seek.needs_refresh(now)) {
            let playback = self.api().current_playback().await?;
            let observed = playback
                .and_then(|p| p.track)
                .ok_or(DeckError::NoTrackPlaying)?;
            self.session
                .state()
                .with(|s| s.seek.resync(observed.progress_ms as i64, now));
        }

        let last_allowed = (track.duration_ms as i64 - 1000).max(0);
        let outcome = self.session.state().with(|s| {
            let outcome = s.seek.nudge(delta_ms, 0..=last_allowed, now);
            let target = match outcome {
                NudgeOutcome::Apply(v) | NudgeOutcome::Unchanged(v) => v,
                NudgeOutcome::Deferred { value, .. } => value,
            };
            if let Some(clock) = s.clock.as_mut() {
                clock.seek_to(target as u64, now);
            }
            outcome
        });
        let value = self.settle(Control::Seek, outcome).await?;
        self.session.render_now_playing(now).await;

        Ok(ActionResponse::success(format!(
            "Position set to {}",
            format_position(value as u64)
        )))
    }

    // ========================================================================
    // ENVOIS
    // ========================================================================

    /// Envoie la valeur maintenant, ou programme l'envoi de fin de fenêtre
    async fn settle(&self, control: Control, outcome: NudgeOutcome) -> Result<i64> {
        match outcome {
            NudgeOutcome::Apply(value) => {
                control.apply(self.api(), value).await?;
                Ok(value)
            }
            NudgeOutcome::Deferred { value, flush_in } => {
                if let Some(delay) = flush_in {
                    self.schedule_flush(control, delay);
                }
                Ok(value)
            }
            NudgeOutcome::Unchanged(value) => Ok(value),
        }
    }

    fn schedule_flush(&self, control: Control, delay: Duration) {
        let session = self.session.clone();
        self.worker
            .submit(control.name(), flush_when_due(session, control, delay));
    }

    fn schedule_refresh(&self, name: &str) {
        let session = self.session.clone();
        self.worker.submit(name, async move {
            tokio::time::sleep(session.settings().settle_delay).await;
            session.refresh_track(Instant::now()).await;
            Ok(())
        });
    }
}

/// Envoi de fin de fenêtre : attend que la fenêtre soit écoulée puis envoie
/// la valeur en attente, s'il en reste une
async fn flush_when_due(session: Arc<DeckSession>, control: Control, delay: Duration) -> Result<()> {
    let mut delay = delay;
    loop {
        tokio::time::sleep(delay).await;
        let due = session
            .state()
            .with(|s| control.accumulator(s).take_due_flush(Instant::now()));
        match due {
            FlushDue::Flush(value) => {
                debug!("{} -> {}", control.name(), value);
                control.apply(session.api().as_ref(), value).await?;
                return Ok(());
            }
            FlushDue::Wait(remaining) => delay = remaining,
            FlushDue::Nothing => return Ok(()),
        }
    }
}

/// Reprend la lecture ; sans appareil actif, en choisit un
async fn resume_or_force(api: &dyn PlaybackApi, context_uri: Option<&str>) -> Result<()> {
    match api.resume(None).await {
        Ok(()) => Ok(()),
        Err(SpotifyError::NoActiveDevice(msg)) => {
            warn!("No active device ({}), forcing playback", msg);
            force_playback(api, context_uri).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Démarre la lecture sur l'appareil actif, ou à défaut le premier listé
async fn force_playback(api: &dyn PlaybackApi, context_uri: Option<&str>) -> Result<()> {
    let devices = api.devices().await?;
    let target = devices
        .iter()
        .find(|d| d.is_active)
        .or_else(|| devices.first())
        .ok_or_else(|| DeckError::transient("No available devices"))?;

    info!("🔊 Forcing playback on {}", target.name);
    let device_id = target.id.as_deref();
    match context_uri {
        Some(uri) => api.start_context(uri, device_id).await?,
        None => api.resume(device_id).await?,
    }
    Ok(())
}

/// `m:ss`
fn format_position(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0), "0:00");
        assert_eq!(format_position(65_400), "1:05");
        assert_eq!(format_position(3_725_000), "62:05");
    }

    #[test]
    fn test_dial_ticks_bounded() {
        assert_eq!(dial_ticks(1.4), 1);
        assert_eq!(dial_ticks(-2.6), -3);
        assert_eq!(dial_ticks(1e19), MAX_TICKS);
        assert_eq!(dial_ticks(f64::NEG_INFINITY), -MAX_TICKS);
        assert_eq!(dial_ticks(f64::NAN), 0);
    }
}
