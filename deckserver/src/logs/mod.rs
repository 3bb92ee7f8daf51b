//! Journalisation de NowDeck
//!
//! Un seul subscriber global :
//!
//! - un filtre de niveau rechargeable (modifiable via `/api/log_setup`) ;
//! - une copie de chaque événement dans un buffer circulaire (`/log-dump`) ;
//! - optionnellement, la sortie console.

mod api;
mod layer;

pub use api::{
    DumpQuery, LogSetupRequest, LogSetupResponse, LogsApiDoc, create_logs_router, log_dump,
};
pub use layer::BufferLayer;

use deckconfig::get_config;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::{collections::VecDeque, sync::Arc, time::SystemTime};
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

type FilterHandle = reload::Handle<LevelFilter, Registry>;

/// Événement capturé par le [`BufferLayer`]
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer des derniers événements et niveau courant
#[derive(Clone)]
pub struct LogState {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
    level: Arc<RwLock<Level>>,
    filter: Arc<FilterHandle>,
}

impl LogState {
    pub fn new(capacity: usize, filter: FilterHandle) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            level: Arc::new(RwLock::new(Level::TRACE)),
            filter: Arc::new(filter),
        }
    }

    /// Change le niveau à chaud
    pub fn set_max_level(&self, level: Level) {
        *self.level.write() = level;
        if let Err(e) = self.filter.reload(LevelFilter::from_level(level)) {
            eprintln!("❌ Cannot reload log filter: {}", e);
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self.level.read()
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Copie du buffer, du plus ancien au plus récent
    pub fn dump(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Les `limit` derniers événements de niveau au moins `min_level`
    pub fn tail(&self, min_level: Option<Level>, limit: Option<usize>) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let mut kept: Vec<LogEntry> = entries
            .iter()
            .rev()
            .filter(|e| match (min_level, parse_level(&e.level)) {
                (Some(min), Some(level)) => level <= min,
                _ => true,
            })
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        kept.reverse();
        kept
    }
}

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Nombre d'événements conservés pour `/log-dump`
    pub buffer_capacity: usize,
    pub enable_console: bool,
    /// Niveau au démarrage
    pub min_level: Level,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            enable_console: true,
            min_level: Level::INFO,
        }
    }
}

impl LoggingOptions {
    /// Section `host.logger` de la configuration
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            buffer_capacity: config.get_log_cache_size(),
            enable_console: config.get_log_enable_console(),
            min_level: parse_level(&config.get_log_min_level()).unwrap_or(Level::INFO),
        }
    }
}

/// Installe le subscriber global
///
/// Si un subscriber existe déjà (tests), il est conservé et le `LogState`
/// retourné reste vide.
pub fn init_logging(options: LoggingOptions) -> LogState {
    let (filter, handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));

    let state = LogState::new(options.buffer_capacity, handle);
    *state.level.write() = options.min_level;

    // Le filtre rechargeable passe avant le buffer
    let subscriber = Registry::default()
        .with(filter)
        .with(BufferLayer::new(state.clone()));

    let console = options
        .enable_console
        .then(|| tracing_subscriber::fmt::layer().with_target(true));

    if let Err(e) = subscriber.with(console).try_init() {
        eprintln!("⚠️ Logging already initialised: {}", e);
    }

    state
}

/// `"debug"`, `" Warn "`... insensible à la casse
pub fn parse_level(s: &str) -> Option<Level> {
    let s = s.trim();
    if s.is_empty() || s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
