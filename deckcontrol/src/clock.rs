//! Horloge de progression
//!
//! Extrapole la position de lecture entre deux pollings à partir d'une
//! position observée et de l'instant de l'observation.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressClock {
    anchored_at: Instant,
    position_at_anchor: Duration,
    duration: Duration,
    running: bool,
}

impl ProgressClock {
    pub fn new(progress_ms: u64, duration_ms: u64, running: bool, now: Instant) -> Self {
        Self {
            anchored_at: now,
            position_at_anchor: Duration::from_millis(progress_ms),
            duration: Duration::from_millis(duration_ms),
            running,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn raw_position(&self, now: Instant) -> Duration {
        if self.running {
            self.position_at_anchor + now.saturating_duration_since(self.anchored_at)
        } else {
            self.position_at_anchor
        }
    }

    /// Position extrapolée, bornée à la durée du morceau
    pub fn position(&self, now: Instant) -> Duration {
        self.raw_position(now).min(self.duration)
    }

    /// Progression 0.0..=1.0 ; `None` si la durée est inconnue
    pub fn progress(&self, now: Instant) -> Option<f64> {
        if self.duration.is_zero() {
            return None;
        }
        let ratio = self.raw_position(now).as_secs_f64() / self.duration.as_secs_f64();
        Some(ratio.clamp(0.0, 1.0))
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.raw_position(now))
    }

    /// Le morceau est-il terminé selon l'horloge locale ?
    pub fn has_ended(&self, now: Instant) -> bool {
        self.running && !self.duration.is_zero() && self.raw_position(now) >= self.duration
    }

    pub fn freeze(&mut self, now: Instant) {
        self.position_at_anchor = self.position(now);
        self.anchored_at = now;
        self.running = false;
    }

    pub fn resume(&mut self, now: Instant) {
        if !self.running {
            self.anchored_at = now;
            self.running = true;
        }
    }

    /// Repositionne après un seek optimiste
    pub fn seek_to(&mut self, position_ms: u64, now: Instant) {
        self.position_at_anchor = Duration::from_millis(position_ms).min(self.duration);
        self.anchored_at = now;
    }
}
