//! Extension de configuration pour la boucle de polling et les commandes
//!
//! Toutes les valeurs viennent de la section `control` ; les durées sont
//! exprimées en millisecondes (`*_ms`) ou en secondes (`*_secs`).

use deckconfig::Config;
use std::time::Duration;

/// Cadences et fenêtres de debounce
#[derive(Debug, Clone)]
pub struct ControlSettings {
    /// Période d'un tour de la boucle de polling
    pub tick: Duration,
    pub playing_refresh: Duration,
    pub track_end_refresh: Duration,
    pub paused_refresh: Duration,
    /// Fenêtre de fin de morceau où la cadence `track_end_refresh` s'applique
    pub track_end_window: Duration,

    /// Pas de volume par cran de cadran
    pub volume_step: i64,
    pub volume_apply_interval: Duration,
    pub volume_refresh_interval: Duration,
    pub default_unmute_volume: u8,

    /// Pas de seek par cran, en millisecondes
    pub seek_step_ms: i64,
    pub seek_apply_interval: Duration,
    pub seek_refresh_interval: Duration,

    pub track_change_ignore: Duration,
    pub track_change_same_direction: Duration,
    /// Délai laissé au service avant de relire l'état après une commande
    pub settle_delay: Duration,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(1000),
            playing_refresh: Duration::from_secs(15),
            track_end_refresh: Duration::from_secs(15),
            paused_refresh: Duration::from_secs(60),
            track_end_window: Duration::from_secs(10),
            volume_step: 3,
            volume_apply_interval: Duration::from_millis(100),
            volume_refresh_interval: Duration::from_secs(10),
            default_unmute_volume: 50,
            seek_step_ms: 10_000,
            seek_apply_interval: Duration::from_millis(500),
            seek_refresh_interval: Duration::from_secs(5),
            track_change_ignore: Duration::from_millis(500),
            track_change_same_direction: Duration::from_millis(2000),
            settle_delay: Duration::from_millis(100),
        }
    }
}

pub trait ControlConfigExt {
    fn get_control_settings(&self) -> ControlSettings;
}

impl ControlConfigExt for Config {
    fn get_control_settings(&self) -> ControlSettings {
        let d = ControlSettings::default();
        let ms = |path: &[&str], default: Duration| {
            Duration::from_millis(self.get_u64(path, default.as_millis() as u64))
        };
        let secs = |path: &[&str], default: Duration| {
            Duration::from_secs(self.get_u64(path, default.as_secs()))
        };

        ControlSettings {
            tick: ms(&["control", "tick_ms"], d.tick).max(Duration::from_millis(50)),
            playing_refresh: secs(&["control", "refresh", "playing_secs"], d.playing_refresh),
            track_end_refresh: secs(
                &["control", "refresh", "track_end_secs"],
                d.track_end_refresh,
            ),
            paused_refresh: secs(&["control", "refresh", "paused_secs"], d.paused_refresh),
            track_end_window: secs(
                &["control", "refresh", "track_end_window_secs"],
                d.track_end_window,
            ),
            volume_step: self.get_u64(&["control", "volume", "step"], d.volume_step as u64) as i64,
            volume_apply_interval: ms(
                &["control", "volume", "apply_interval_ms"],
                d.volume_apply_interval,
            ),
            volume_refresh_interval: ms(
                &["control", "volume", "refresh_interval_ms"],
                d.volume_refresh_interval,
            ),
            default_unmute_volume: self
                .get_u64(
                    &["control", "volume", "default_unmute"],
                    d.default_unmute_volume as u64,
                )
                .min(100) as u8,
            seek_step_ms: self.get_u64(&["control", "seek", "step_ms"], d.seek_step_ms as u64)
                as i64,
            seek_apply_interval: ms(
                &["control", "seek", "apply_interval_ms"],
                d.seek_apply_interval,
            ),
            seek_refresh_interval: ms(
                &["control", "seek", "refresh_interval_ms"],
                d.seek_refresh_interval,
            ),
            track_change_ignore: ms(
                &["control", "track_change", "ignore_ms"],
                d.track_change_ignore,
            ),
            track_change_same_direction: ms(
                &["control", "track_change", "same_direction_ms"],
                d.track_change_same_direction,
            ),
            settle_delay: ms(&["control", "track_change", "settle_ms"], d.settle_delay),
        }
    }
}
