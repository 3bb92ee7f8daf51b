//! Anti-rebond des changements de morceau
//!
//! Un cran de cadran vers la droite passe au morceau suivant, vers la gauche
//! au précédent. Deux crans trop rapprochés sont ignorés ; un même sens n'est
//! accepté de nouveau qu'après `same_direction_within`, mais l'inversion du
//! sens est toujours permise.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Sens d'un cran de cadran ; `None` pour une rotation nulle
    pub fn from_value(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Direction::Next)
        } else if value < 0.0 {
            Some(Direction::Previous)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    /// Moins de `ignore_within` depuis le dernier changement
    TooSoon,
    /// Même sens, trop tôt
    Ignored,
}

#[derive(Debug, Clone)]
pub struct TrackChangeGate {
    last_change: Option<Instant>,
    last_direction: Option<Direction>,
    ignore_within: Duration,
    same_direction_within: Duration,
}

impl TrackChangeGate {
    pub fn new(ignore_within: Duration, same_direction_within: Duration) -> Self {
        Self {
            last_change: None,
            last_direction: None,
            ignore_within,
            same_direction_within,
        }
    }

    /// Décide si le changement peut partir ; l'enregistre s'il est accepté
    pub fn admit(&mut self, direction: Direction, now: Instant) -> GateDecision {
        if let Some(last) = self.last_change {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.ignore_within {
                return GateDecision::TooSoon;
            }
            let same_direction = self.last_direction == Some(direction);
            if same_direction && elapsed <= self.same_direction_within {
                return GateDecision::Ignored;
            }
        }
        self.record(direction, now);
        GateDecision::Allowed
    }

    /// Mémorise un changement décidé ailleurs (boutons next/previous)
    pub fn record(&mut self, direction: Direction, now: Instant) {
        self.last_change = Some(now);
        self.last_direction = Some(direction);
    }
}
