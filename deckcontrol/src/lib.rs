//! # deckcontrol - Pilotage du Stream Deck
//!
//! Cette crate relie le client Spotify, le moteur de rendu et l'API HTTP :
//!
//! - `state` : état partagé (morceau courant, j'aime, volume, position...)
//! - `poller` : boucle de polling à cadence adaptative et extrapolation de
//!   la progression entre deux appels
//! - `actions` : commandes des cadrans, avec accumulation du volume et de la
//!   position et anti-rebond des changements de morceau
//! - `worker` : file des commandes exécutées après la réponse HTTP
//! - `server_ext` : routes HTTP, branchées sur un `deckserver::Server`
//!
//! ```rust,ignore
//! use deckcontrol::{ControlConfigExt, DeckApiExt};
//!
//! let settings = get_config().get_control_settings();
//! let session = server.register_deck(api, engine, art, settings).await;
//! ```

pub mod accumulator;
pub mod actions;
pub mod clock;
pub mod config_ext;
pub mod errors;
pub mod openapi;
pub mod poller;
pub mod server_ext;
pub mod session;
pub mod state;
pub mod track_change;
pub mod worker;

pub use accumulator::{Accumulator, FlushDue, NudgeOutcome};
pub use actions::ActionCoalescer;
pub use clock::ProgressClock;
pub use config_ext::{ControlConfigExt, ControlSettings};
pub use errors::{DeckError, Result};
pub use openapi::{ActionRequest, ActionResponse, DeckStates, DeviceSummary, WorkerStats};
pub use poller::{PollLoop, TickPlan};
pub use server_ext::{DeckApiExt, DeckApiState, create_router};
pub use session::{DeckSession, PollOutcome};
pub use state::{DisplayMode, StateStore, UiState};
pub use track_change::{Direction, GateDecision, TrackChangeGate};
pub use worker::Worker;
