//! Accumulateur de commandes continues (volume, position)
//!
//! Une rafale de crans de cadran est additionnée localement et envoyée au
//! service au plus une fois par fenêtre `apply_min_interval`. La valeur
//! optimiste est mise à jour à chaque cran pour que l'affichage suive
//! immédiatement. Après une période d'inactivité plus longue que
//! `refresh_interval`, la valeur de référence doit être relue chez le
//! service avant d'accumuler de nouveau.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

/// Résultat d'un cran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeOutcome {
    /// La fenêtre est ouverte : envoyer cette valeur maintenant
    Apply(i64),
    /// Fenêtre fermée : la valeur reste en attente
    ///
    /// `flush_in` est renseigné quand l'appelant doit programmer l'envoi
    /// différé (un seul par fenêtre).
    Deferred {
        value: i64,
        flush_in: Option<Duration>,
    },
    /// La valeur bornée n'a pas bougé, rien à envoyer
    Unchanged(i64),
}

/// Décision d'un envoi différé arrivé à échéance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDue {
    Flush(i64),
    /// La fenêtre n'est pas encore écoulée (un envoi direct l'a rouverte)
    Wait(Duration),
    Nothing,
}

#[derive(Debug, Clone)]
pub struct Accumulator {
    /// Dernière valeur connue du service (relue ou envoyée)
    base: Option<i64>,
    /// Valeur optimiste affichée
    current: Option<i64>,
    pending: i64,
    last_applied: Option<Instant>,
    last_seen: Option<Instant>,
    refresh_interval: Duration,
    apply_min_interval: Duration,
    flush_scheduled: bool,
}

impl Accumulator {
    pub fn new(apply_min_interval: Duration, refresh_interval: Duration) -> Self {
        Self {
            base: None,
            current: None,
            pending: 0,
            last_applied: None,
            last_seen: None,
            refresh_interval,
            apply_min_interval,
            flush_scheduled: false,
        }
    }

    pub fn current(&self) -> Option<i64> {
        self.current
    }

    pub fn pending(&self) -> i64 {
        self.pending
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }

    /// Faut-il relire la valeur de référence avant ce cran ?
    pub fn needs_refresh(&self, now: Instant) -> bool {
        match (self.current, self.last_seen) {
            (Some(_), Some(seen)) => now.saturating_duration_since(seen) > self.refresh_interval,
            _ => true,
        }
    }

    /// Remplace la référence par la valeur lue chez le service
    ///
    /// L'accumulation en cours est abandonnée.
    pub fn resync(&mut self, value: i64, now: Instant) {
        self.base = Some(value);
        self.current = Some(value);
        self.pending = 0;
        self.last_seen = Some(now);
    }

    /// Valeur remontée par un polling : ignorée tant qu'un envoi est en attente
    pub fn observe(&mut self, value: i64) {
        if self.pending == 0 && !self.flush_scheduled {
            self.base = Some(value);
            self.current = Some(value);
        }
    }

    /// Oublie la valeur courante (changement de morceau pour la position)
    pub fn invalidate(&mut self) {
        self.base = None;
        self.current = None;
        self.pending = 0;
    }

    /// Valeur imposée directement (mute, volume absolu), envoyée sans attendre
    pub fn set(&mut self, value: i64, now: Instant) -> i64 {
        self.base = Some(value);
        self.current = Some(value);
        self.pending = 0;
        self.last_applied = Some(now);
        self.last_seen = Some(now);
        value
    }

    pub fn nudge(&mut self, delta: i64, range: RangeInclusive<i64>, now: Instant) -> NudgeOutcome {
        let (lo, hi) = (*range.start(), *range.end().max(range.start()));
        let base = self.base.unwrap_or(lo).clamp(lo, hi);
        self.base = Some(base);

        // Borner la cible et ramener `pending` dans la plage : pousser au-delà
        // de la borne ne fait plus bouger la valeur
        let target = base.saturating_add(self.pending).saturating_add(delta).clamp(lo, hi);
        self.pending = target - base;
        self.current = Some(target);
        self.last_seen = Some(now);

        if self.pending == 0 {
            return NudgeOutcome::Unchanged(target);
        }

        match self.window_remaining(now) {
            None => NudgeOutcome::Apply(self.flush(now)),
            Some(remaining) => {
                let flush_in = if self.flush_scheduled {
                    None
                } else {
                    self.flush_scheduled = true;
                    Some(remaining)
                };
                NudgeOutcome::Deferred {
                    value: target,
                    flush_in,
                }
            }
        }
    }

    /// Appelé par l'envoi différé à son échéance
    pub fn take_due_flush(&mut self, now: Instant) -> FlushDue {
        if self.pending == 0 {
            self.flush_scheduled = false;
            return FlushDue::Nothing;
        }
        match self.window_remaining(now) {
            Some(remaining) => FlushDue::Wait(remaining),
            None => {
                self.flush_scheduled = false;
                FlushDue::Flush(self.flush(now))
            }
        }
    }

    fn window_remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_applied?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < self.apply_min_interval).then(|| self.apply_min_interval - elapsed)
    }

    fn flush(&mut self, now: Instant) -> i64 {
        let value = self.current.unwrap_or_default();
        self.base = Some(value);
        self.pending = 0;
        self.last_applied = Some(now);
        value
    }
}
