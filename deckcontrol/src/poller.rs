//! Boucle de polling
//!
//! Un seul ordonnanceur tourne à la période `tick`. À chaque tour il choisit
//! une action ([`TickPlan`]) :
//!
//! 1. reconnexion tant que la session Spotify n'est pas valide ;
//! 2. relecture forcée dès que l'horloge locale dit que le morceau est fini ;
//! 3. relecture complète quand la cadence adaptative est écoulée ;
//! 4. sinon, extrapolation locale de la progression et nouveau rendu.
//!
//! Aucun tour ne peut arrêter la boucle : toutes les erreurs du service sont
//! classées et affichées par la session, et chaque tour tourne dans sa propre
//! tâche pour qu'une panique n'emporte que ce tour.

use crate::session::{DeckSession, PollOutcome};
use crate::state::{DisplayMode, UiState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickPlan {
    Login,
    ForcedRefresh,
    Poll,
    Extrapolate(f64),
    Idle,
}

impl TickPlan {
    /// Décision pure, à partir de l'état et de l'instant courant
    pub fn decide(state: &UiState, now: Instant) -> Self {
        if state.needs_login {
            return TickPlan::Login;
        }

        let showing_track = state.display == DisplayMode::NowPlaying;
        let clock = state.clock.as_ref().filter(|_| showing_track && state.is_playing);

        if let Some(clock) = clock {
            if clock.has_ended(now) && !state.is_rate_limited(now) {
                return TickPlan::ForcedRefresh;
            }
        }

        let due = match state.last_poll {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= state.refresh_rate,
        };
        if due {
            return TickPlan::Poll;
        }

        match clock.and_then(|c| c.progress(now)) {
            Some(progress) => TickPlan::Extrapolate(progress),
            None => TickPlan::Idle,
        }
    }
}

#[derive(Clone)]
pub struct PollLoop {
    session: Arc<DeckSession>,
}

impl PollLoop {
    pub fn new(session: Arc<DeckSession>) -> Self {
        Self { session }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let tick = self.session.settings().tick;
        info!("🔄 Poll loop started (tick {:?})", tick);

        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.supervised_tick(Instant::now()).await;
        }
    }

    /// Exécute un tour dans une tâche séparée
    ///
    /// Renvoie `None` si le tour a paniqué ; la boucle continue au tour suivant.
    pub async fn supervised_tick(&self, now: Instant) -> Option<TickPlan> {
        let poller = self.clone();
        match tokio::spawn(async move { poller.tick(now).await }).await {
            Ok(plan) => Some(plan),
            Err(e) => {
                error!("💥 Poll tick failed: {}", e);
                None
            }
        }
    }

    /// Un tour de boucle
    pub async fn tick(&self, now: Instant) -> TickPlan {
        let plan = self.session.state().with(|s| TickPlan::decide(s, now));

        match plan {
            TickPlan::Login => {
                if self.session.authenticate().await {
                    self.poll(Instant::now()).await;
                }
            }
            TickPlan::ForcedRefresh => {
                debug!("Track should have ended, refreshing now");
                self.poll(now).await;
            }
            TickPlan::Poll => {
                self.poll(now).await;
            }
            TickPlan::Extrapolate(progress) => {
                trace!("Extrapolated progress {:.3}", progress);
                self.session.render_now_playing(now).await;
            }
            TickPlan::Idle => {}
        }
        plan
    }

    async fn poll(&self, now: Instant) {
        let outcome = self.session.refresh_track(now).await;
        let settings = self.session.settings();

        self.session.state().with(|s| {
            let rate = match &outcome {
                PollOutcome::Normal if s.is_playing => {
                    let remaining = s.clock.as_ref().map(|c| c.remaining(now));
                    match remaining {
                        Some(r) if r <= settings.track_end_window => settings.track_end_refresh,
                        _ => settings.playing_refresh,
                    }
                }
                PollOutcome::RateLimited(secs) => {
                    settings.paused_refresh.max(Duration::from_secs(*secs))
                }
                _ => settings.paused_refresh,
            };
            s.last_poll = Some(now);
            if s.refresh_rate != rate {
                debug!("Refresh rate set to {:?}", rate);
            }
            s.refresh_rate = rate;
        });
    }
}
